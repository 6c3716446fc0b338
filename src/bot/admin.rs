use log::{error, info};
use teloxide::prelude::*;
use teloxide::types::{InputFile, KeyboardButton, KeyboardMarkup};

use super::commands::ADMIN_PANEL;
use super::messenger::TelegramMessenger;
use super::{App, HandlerResult};
use crate::error::QuizError;
use crate::messenger::name_or_placeholder;
use crate::quiz::bonus::BONUS;
use crate::quiz::points::round_percent;
use crate::quiz::{broadcast, finalize, option_letter, total_possible};

/// Lines per message when listing respondents.
const PAGE: usize = 20;

async fn send_paged(bot: &Bot, chat: ChatId, lines: Vec<String>) -> HandlerResult {
    for page in lines.chunks(PAGE) {
        bot.send_message(chat, page.join("\n")).await?;
    }
    Ok(())
}

pub(super) async fn panel(bot: Bot, chat: ChatId) -> HandlerResult {
    let keyboard = KeyboardMarkup::new(
        ADMIN_PANEL
            .iter()
            .map(|row| row.iter().map(|c| KeyboardButton::new(*c)).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
    );
    bot.send_message(chat, "🔧 Admin panel:")
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

pub(super) async fn enroll(bot: Bot, chat: ChatId, app: &App, tokens: &[String]) -> HandlerResult {
    if tokens.is_empty() {
        bot.send_message(chat, "❌ Usage: /enroll <id> [id ...]").await?;
        return Ok(());
    }

    let mut lines = Vec::with_capacity(tokens.len());
    for token in tokens {
        let Ok(id) = token.parse::<i64>() else {
            lines.push(format!("🆔 {token}: ❌ invalid id"));
            continue;
        };
        let line = match app.storage.respondents.enroll(id).await {
            Ok(true) => format!("🆔 {id}: ✅ added"),
            Ok(false) => format!("🆔 {id}: ⚠️ already enrolled"),
            Err(e) => {
                error!("enroll {id} failed: {e}");
                format!("🆔 {id}: ❌ error")
            }
        };
        lines.push(line);
    }
    bot.send_message(chat, lines.join("\n")).await?;
    Ok(())
}

pub(super) async fn who(bot: Bot, chat: ChatId, app: &App, id: i64) -> HandlerResult {
    let messenger = TelegramMessenger::new(bot.clone());
    let name = name_or_placeholder(&messenger, id).await;
    let text = match app.storage.respondents.get(id).await? {
        Some(r) => format!(
            "👤 {name}\n🆔 {id}\n🎯 Score: {}\n✅ Correct: {}\n❌ Wrong: {}\n\
             🏁 Finished: {}\n✍️ Written part: {}\n🎓 Grade: {}",
            r.score,
            r.correct.len(),
            r.wrong.len(),
            if r.finished { "yes" } else { "no" },
            if r.closed_finished { "submitted" } else { "pending" },
            r.degree_label()
        ),
        None => format!("👤 {name}\n🆔 {id}\nℹ️ Not enrolled"),
    };
    bot.send_message(chat, text).await?;
    Ok(())
}

pub(super) async fn users(bot: Bot, chat: ChatId, app: &App) -> HandlerResult {
    let count = app.storage.chats.list().await?.len();
    bot.send_message(chat, format!("👥 Users: {count}")).await?;
    Ok(())
}

pub(super) async fn participants(bot: Bot, chat: ChatId, app: &App) -> HandlerResult {
    let respondents = app.storage.respondents.list().await?;
    if respondents.is_empty() {
        bot.send_message(chat, "🚫 Nobody is enrolled.").await?;
        return Ok(());
    }

    let messenger = TelegramMessenger::new(bot.clone());
    let mut lines = Vec::with_capacity(respondents.len());
    for r in &respondents {
        let name = name_or_placeholder(&messenger, r.id).await;
        lines.push(format!("👤 {name} | 🆔 {} | 🎯 {} | 🎓 {}", r.id, r.score, r.degree_label()));
    }
    send_paged(&bot, chat, lines).await
}

pub(super) async fn results(bot: Bot, chat: ChatId, app: &App) -> HandlerResult {
    let respondents = app.storage.respondents.list().await?;
    if respondents.is_empty() {
        bot.send_message(chat, "🚫 Nobody is enrolled.").await?;
        return Ok(());
    }
    let open = app.storage.questions.list_open().await?;
    let closed = app.storage.questions.list_closed().await?;
    let total = total_possible(&open, &closed);

    let messenger = TelegramMessenger::new(bot.clone());
    let mut lines = Vec::with_capacity(respondents.len());
    for r in &respondents {
        let name = name_or_placeholder(&messenger, r.id).await;
        let percent = round_percent(r.score.percent_of(total), 1);
        lines.push(format!("{name} | 🎯 {} | 📈 {percent}% | 🎓 {}", r.score, r.degree_label()));
    }
    send_paged(&bot, chat, lines).await
}

pub(super) async fn questions(bot: Bot, chat: ChatId, app: &App) -> HandlerResult {
    let open = app.storage.questions.list_open().await?;
    let closed = app.storage.questions.list_closed().await?;
    if open.is_empty() && closed.is_empty() {
        bot.send_message(chat, "⚠️ There are no questions yet.").await?;
        return Ok(());
    }

    for q in &open {
        if let Some(image) = &q.image {
            bot.send_photo(chat, InputFile::file_id(image.clone())).await?;
        }
        let mut text = format!("#️⃣ Question {}\n\n❓ {}\n\n", q.number, q.text);
        for (i, option) in q.options.iter().enumerate() {
            text.push_str(&format!("{}) {option}\n", option_letter(i).unwrap_or('?')));
        }
        text.push_str(&format!("\n✅ Answer: {}\n🏆 Points: {}", q.answer, q.points));
        bot.send_message(chat, text).await?;
    }
    for q in &closed {
        bot.send_message(
            chat,
            format!(
                "✍️ Closed question {}\na) {} ({} pts)\nb) {} ({} pts)",
                q.number, q.a.expected, q.a.points, q.b.expected, q.b.points
            ),
        )
        .await?;
    }
    Ok(())
}

/// Plain-language notice for errors an admin can act on.
async fn report_failure(bot: &Bot, chat: ChatId, e: QuizError) -> HandlerResult {
    match e {
        QuizError::NoQuestions => bot.send_message(chat, "🚫 There are no questions.").await?,
        QuizError::NoRespondents => bot.send_message(chat, "🚫 Nobody is enrolled.").await?,
        QuizError::AlreadyFinalized => {
            bot.send_message(
                chat,
                "⚠️ Results were already finalized. Clear participants to start a new round.",
            )
            .await?
        }
        other => return Err(other.into()),
    };
    Ok(())
}

pub(super) async fn start_test(bot: Bot, chat: ChatId, app: &App) -> HandlerResult {
    let messenger = TelegramMessenger::new(bot.clone());
    match broadcast::send_questions(&app.storage, &messenger, app.config.send_delay).await {
        Ok(report) => {
            bot.send_message(
                chat,
                format!(
                    "✅ Questions sent: {} delivered, {} failed, {} already finished.",
                    report.delivered, report.failed, report.skipped
                ),
            )
            .await?;
            Ok(())
        }
        Err(e) => report_failure(&bot, chat, e).await,
    }
}

pub(super) async fn finish_tests(bot: Bot, chat: ChatId, app: &App) -> HandlerResult {
    let messenger = TelegramMessenger::new(bot.clone());
    let finalized = finalize::finalize(
        &app.storage,
        &app.config.grades,
        &messenger,
        app.config.send_delay,
    )
    .await;
    let report = match finalized {
        Ok(report) => report,
        Err(e) => return report_failure(&bot, chat, e).await,
    };

    let mut text = format!(
        "✅ Test closed for {} respondents ({} closed automatically).\n",
        report.respondents, report.force_finished
    );
    for award in &report.awards {
        text.push_str(&format!(
            "🎁 {} missed by {}: +{BONUS} for {} respondent(s)\n",
            award.question,
            award.missed_by,
            award.recipients.len()
        ));
    }
    text.push_str(&format!("📨 Results sent: {}, failed: {}", report.notified, report.failed));
    bot.send_message(chat, text).await?;
    Ok(())
}

pub(super) async fn clear_questions(bot: Bot, chat: ChatId, app: &App) -> HandlerResult {
    let removed = app.storage.questions.clear().await?;
    info!("admin {chat} cleared {removed} questions");
    bot.send_message(chat, format!("🗑️ Deleted {removed} questions.")).await?;
    Ok(())
}

pub(super) async fn clear_participants(bot: Bot, chat: ChatId, app: &App) -> HandlerResult {
    let removed = app.storage.respondents.clear().await?;
    info!("admin {chat} cleared {removed} respondents");
    bot.send_message(chat, format!("🗑️ Deleted {removed} participants.")).await?;
    Ok(())
}

pub(super) async fn announce(bot: Bot, chat: ChatId, app: &App, text: &str) -> HandlerResult {
    let messenger = TelegramMessenger::new(bot.clone());
    let report = broadcast::announce(&app.storage, &messenger, text, app.config.send_delay).await?;
    bot.send_message(
        chat,
        format!("📢 Announcement sent: {} delivered, {} failed.", report.delivered, report.failed),
    )
    .await?;
    Ok(())
}
