//! Persistence contracts for questions, respondents and known chats.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::quiz::{ClosedQuestion, OpenQuestion, Points, Respondent};

pub use memory::MemoryStore;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn get_open(&self, number: u32) -> Result<Option<OpenQuestion>, StorageError>;

    /// All open questions, ascending by number.
    async fn list_open(&self) -> Result<Vec<OpenQuestion>, StorageError>;

    /// Insert or replace by number.
    async fn upsert_open(&self, question: &OpenQuestion) -> Result<(), StorageError>;

    async fn count_open(&self) -> Result<usize, StorageError>;

    /// All closed questions, ascending by number.
    async fn list_closed(&self) -> Result<Vec<ClosedQuestion>, StorageError>;

    async fn upsert_closed(&self, question: &ClosedQuestion) -> Result<(), StorageError>;

    /// Deletes every question of both kinds, returning how many were removed.
    /// A cleared bank starts a new round, so the finalized flag is reset.
    async fn clear(&self) -> Result<usize, StorageError>;
}

#[async_trait]
pub trait RespondentRepository: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Respondent>, StorageError>;

    /// All respondents, ascending by id.
    async fn list(&self) -> Result<Vec<Respondent>, StorageError>;

    /// Creates a fresh respondent unless one exists. Returns whether it was
    /// created.
    async fn enroll(&self, id: i64) -> Result<bool, StorageError>;

    async fn save(&self, respondent: &Respondent) -> Result<(), StorageError>;

    /// Adds `delta` to the stored score without touching anything else.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the respondent is missing.
    async fn increment_score(&self, id: i64, delta: Points) -> Result<(), StorageError>;

    /// Deletes every respondent and resets the finalized flag.
    async fn clear(&self) -> Result<usize, StorageError>;
}

/// Chats that have talked to the bot, used for announcements.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Returns whether the chat was new.
    async fn register(&self, chat: i64) -> Result<bool, StorageError>;

    async fn list(&self) -> Result<Vec<i64>, StorageError>;
}

/// Round-wide state that outlives single respondents.
#[async_trait]
pub trait RoundRepository: Send + Sync {
    /// Whether the terminal pass has already run for the current round.
    async fn is_finalized(&self) -> Result<bool, StorageError>;

    async fn set_finalized(&self, finalized: bool) -> Result<(), StorageError>;
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub respondents: Arc<dyn RespondentRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub round: Arc<dyn RoundRepository>,
}

impl Storage {
    pub fn in_memory() -> Self {
        Self::from_store(MemoryStore::new())
    }

    pub fn from_store(store: MemoryStore) -> Self {
        let questions: Arc<dyn QuestionRepository> = Arc::new(store.clone());
        let respondents: Arc<dyn RespondentRepository> = Arc::new(store.clone());
        let chats: Arc<dyn ChatRepository> = Arc::new(store.clone());
        let round: Arc<dyn RoundRepository> = Arc::new(store);
        Self {
            questions,
            respondents,
            chats,
            round,
        }
    }
}
