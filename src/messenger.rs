//! Outbound side of the chat transport.

use async_trait::async_trait;
use thiserror::Error;

use crate::quiz::taker::QuestionView;

#[derive(Debug, Error)]
#[error("delivery to {chat} failed: {reason}")]
pub struct DeliveryError {
    pub chat: i64,
    pub reason: String,
}

/// Placeholder used when a display name cannot be resolved.
pub const UNKNOWN_NAME: &str = "—";

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat: i64, text: &str) -> Result<(), DeliveryError>;

    /// Sends a question with its option and navigation buttons, preceded by
    /// its photo when it has one.
    async fn send_question(&self, chat: i64, view: &QuestionView) -> Result<(), DeliveryError>;

    /// Best-effort name lookup; `None` when the transport cannot resolve it.
    async fn display_name(&self, chat: i64) -> Option<String>;
}

/// Resolves a name, falling back to [`UNKNOWN_NAME`].
pub async fn name_or_placeholder(messenger: &dyn Messenger, chat: i64) -> String {
    messenger
        .display_name(chat)
        .await
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}
