use std::sync::Arc;

use log::{debug, warn};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use super::messenger::{question_keyboard, TelegramMessenger};
use super::{admin, App, HandlerResult};
use crate::messenger::Messenger;
use crate::quiz::scoring::choice_letter;
use crate::quiz::taker::{TakerEvent, TakerReply, TakerSession};

const PROFILE: &str = "profile";

pub(super) async fn start(bot: Bot, msg: Message, app: Arc<App>) -> HandlerResult {
    let chat = msg.chat.id;
    if app.storage.chats.register(chat.0).await? {
        debug!("new chat {chat}");
    }

    let name = msg.chat.first_name().unwrap_or("there");
    bot.send_message(chat, format!("Hello, {name}!"))
        .reply_markup(InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::callback("📋 Profile", PROFILE),
        ]]))
        .await?;

    if app.config.is_admin(chat.0) {
        admin::panel(bot, chat).await?;
    }
    Ok(())
}

pub(super) async fn profile(
    bot: Bot,
    chat: ChatId,
    name: Option<&str>,
    app: &App,
) -> HandlerResult {
    let respondent = app.storage.respondents.get(chat.0).await?;
    let (score, degree) = match &respondent {
        Some(r) => (r.score.to_string(), r.degree_label().to_string()),
        None => ("0".to_string(), "—".to_string()),
    };
    bot.send_message(
        chat,
        format!(
            "👤 Name: {}\n🆔 ID: {}\n🎯 Score: {score}\n🎓 Grade: {degree}",
            name.unwrap_or("—"),
            chat.0
        ),
    )
    .await?;
    Ok(())
}

/// Inline button presses: the profile button and the answering keyboard.
pub(super) async fn callback(bot: Bot, q: CallbackQuery, app: Arc<App>) -> HandlerResult {
    let data = q.data.clone().unwrap_or_default();
    let respondent_id = ChatId::from(q.from.id);

    if data == PROFILE {
        bot.answer_callback_query(q.id.clone()).await?;
        return profile(bot, respondent_id, Some(q.from.first_name.as_str()), &app).await;
    }

    let Some(event) = TakerEvent::parse(&data) else {
        debug!("unknown callback payload {data:?}");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let session = TakerSession::new(&app.storage);
    let reply = match session.handle(respondent_id.0, event).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("{respondent_id}: {event:?} failed: {e}");
            bot.answer_callback_query(q.id.clone())
                .text("Something went wrong, try again.")
                .show_alert(true)
                .await?;
            return Ok(());
        }
    };

    match reply {
        TakerReply::Render(view) => {
            let mut answer = bot.answer_callback_query(q.id.clone());
            if let TakerEvent::Pick { choice, .. } = event {
                if let Some(letter) = choice_letter(choice) {
                    answer = answer.text(format!("📌 You chose {letter}."));
                }
            }
            answer.await?;

            // A text message cannot become a photo, so moving to a question
            // with a photo sends it afresh.
            if view.image.is_some() && matches!(event, TakerEvent::Navigate(_)) {
                TelegramMessenger::new(bot.clone())
                    .send_question(respondent_id.0, &view)
                    .await?;
            } else if let Some(message) = &q.message {
                // Telegram refuses edits that change nothing; that is harmless.
                if let Err(e) = bot
                    .edit_message_text(message.chat.id, message.id, view.text.clone())
                    .reply_markup(question_keyboard(&view))
                    .await
                {
                    debug!("edit for {respondent_id} skipped: {e}");
                }
            }
        }
        TakerReply::Finished(summary) => {
            bot.answer_callback_query(q.id.clone())
                .text("✅ Test finished.")
                .await?;
            bot.send_message(respondent_id, summary.to_string()).await?;
            if summary.closed_pending {
                let text = match app.config.form_link(respondent_id.0) {
                    Some(link) => format!("✍️ Now answer the written part here:\n{link}"),
                    None => "✍️ The written part will be shared separately.".to_string(),
                };
                bot.send_message(respondent_id, text).await?;
            }
        }
        other => {
            let notice = other.notice().unwrap_or("⚠️ Nothing to do.");
            bot.answer_callback_query(q.id.clone())
                .text(notice)
                .show_alert(true)
                .await?;
        }
    }
    Ok(())
}
