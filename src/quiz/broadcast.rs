//! Bulk sends: the question set to respondents and announcements to every
//! known chat. One failed delivery never stops the rest.

use std::time::Duration;

use log::{info, warn};

use super::taker::QuestionView;
use crate::error::QuizError;
use crate::messenger::Messenger;
use crate::store::Storage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Sends the first question to every respondent whose open stage is still
/// running.
pub async fn send_questions(
    storage: &Storage,
    messenger: &dyn Messenger,
    pause: Duration,
) -> Result<DeliveryReport, QuizError> {
    let bank = storage.questions.list_open().await?;
    if bank.is_empty() {
        return Err(QuizError::NoQuestions);
    }
    let respondents = storage.respondents.list().await?;
    if respondents.is_empty() {
        return Err(QuizError::NoRespondents);
    }

    let mut report = DeliveryReport::default();
    for respondent in &respondents {
        if respondent.finished {
            report.skipped += 1;
            continue;
        }
        let Some(view) = QuestionView::build(&bank, 0, &respondent.answers) else {
            continue;
        };
        match messenger.send_question(respondent.id, &view).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!("{e}");
                report.failed += 1;
            }
        }
        tokio::time::sleep(pause).await;
    }

    info!(
        "question set sent: {} delivered, {} failed, {} skipped",
        report.delivered, report.failed, report.skipped
    );
    Ok(report)
}

pub async fn announce(
    storage: &Storage,
    messenger: &dyn Messenger,
    text: &str,
    pause: Duration,
) -> Result<DeliveryReport, QuizError> {
    let mut report = DeliveryReport::default();
    for chat in storage.chats.list().await? {
        match messenger.send_text(chat, text).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!("{e}");
                report.failed += 1;
            }
        }
        tokio::time::sleep(pause).await;
    }
    Ok(report)
}
