use async_trait::async_trait;
use log::warn;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile};

use crate::messenger::{DeliveryError, Messenger};
use crate::quiz::taker::QuestionView;

/// Option letters on one row, navigation on the next.
pub fn question_keyboard(view: &QuestionView) -> InlineKeyboardMarkup {
    let row = |buttons: &[crate::quiz::taker::Button]| {
        buttons
            .iter()
            .map(|b| {
                InlineKeyboardButton::callback(b.label.clone(), b.event.callback_data())
            })
            .collect::<Vec<_>>()
    };
    InlineKeyboardMarkup::new(vec![row(&view.options), row(&view.navigation)])
}

pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat: i64, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(chat), text)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError {
                chat,
                reason: e.to_string(),
            })
    }

    async fn send_question(&self, chat: i64, view: &QuestionView) -> Result<(), DeliveryError> {
        if let Some(image) = &view.image {
            self.bot
                .send_photo(ChatId(chat), InputFile::file_id(image.clone()))
                .await
                .map_err(|e| DeliveryError {
                    chat,
                    reason: e.to_string(),
                })?;
        }
        self.bot
            .send_message(ChatId(chat), view.text.clone())
            .reply_markup(question_keyboard(view))
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError {
                chat,
                reason: e.to_string(),
            })
    }

    async fn display_name(&self, chat: i64) -> Option<String> {
        match self.bot.get_chat(ChatId(chat)).await {
            Ok(found) => found
                .first_name()
                .or_else(|| found.username())
                .map(String::from),
            Err(e) => {
                warn!("name lookup for {chat} failed: {e}");
                None
            }
        }
    }
}
