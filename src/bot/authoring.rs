use std::sync::Arc;

use log::info;
use teloxide::prelude::*;

use super::{dispatch, App, Command, HandlerResult, QuizDialogue, State};
use crate::quiz::authoring::{AuthoringInput, AuthoringSession, CommitError, SKIP_IMAGE};
use crate::quiz::closed_authoring::{ClosedAuthoringSession, ClosedStep};

const OPEN_INTRO: &str = "🛠 Question wizard started.\n\
1️⃣ Photo (/skip if there is none)\n\
2️⃣ Question text\n\
3️⃣ Options: a number 2-4 (letters) or a comma-separated list\n\
4️⃣ Correct answer (A, B, ...)\n\
5️⃣ Points\n\
Repeat for more questions, then /done to save or /cancel to drop them.";

pub(super) async fn start_open(
    bot: Bot,
    dialogue: QuizDialogue,
    chat: ChatId,
    base: Option<u32>,
) -> HandlerResult {
    dialogue
        .update(State::OpenAuthoring(AuthoringSession::new(base)))
        .await?;
    let intro = match base {
        Some(base) => format!("{OPEN_INTRO}\nNumbering starts at {base}."),
        None => OPEN_INTRO.to_string(),
    };
    bot.send_message(chat, intro).await?;
    Ok(())
}

pub(super) async fn start_closed(bot: Bot, dialogue: QuizDialogue, chat: ChatId) -> HandlerResult {
    let session = ClosedAuthoringSession::default();
    let prompt = session.pending_prompt();
    dialogue.update(State::ClosedAuthoring(session)).await?;
    bot.send_message(chat, prompt.to_string()).await?;
    Ok(())
}

pub(super) async fn open_step(
    bot: Bot,
    dialogue: QuizDialogue,
    mut session: AuthoringSession,
    msg: Message,
    app: Arc<App>,
) -> HandlerResult {
    let chat = msg.chat.id;
    let photo = msg
        .photo()
        .and_then(|sizes| sizes.last())
        .map(|size| size.file.id.clone());
    let text = msg.text().map(String::from);

    let input = match (&photo, &text) {
        (Some(id), _) => AuthoringInput::Photo(id),
        (None, Some(text)) => {
            match Command::parse(text) {
                Some(Command::Done) => {
                    return commit_open(bot, dialogue, chat, session, &app).await
                }
                Some(Command::Cancel) => {
                    dialogue.exit().await?;
                    bot.send_message(chat, "🗑 Wizard cancelled, nothing was saved.")
                        .await?;
                    return Ok(());
                }
                Some(other) => return dispatch(bot, dialogue, msg, app, other).await,
                None => {}
            }
            AuthoringInput::Text(text)
        }
        (None, None) => {
            bot.send_message(chat, format!("Please send a photo, text or {SKIP_IMAGE}."))
                .await?;
            return Ok(());
        }
    };

    let prompt = session.advance(input);
    if !prompt.is_retry() {
        dialogue.update(State::OpenAuthoring(session)).await?;
    }
    bot.send_message(chat, prompt.to_string()).await?;
    Ok(())
}

async fn commit_open(
    bot: Bot,
    dialogue: QuizDialogue,
    chat: ChatId,
    session: AuthoringSession,
    app: &App,
) -> HandlerResult {
    dialogue.exit().await?;

    let existing = app.storage.questions.count_open().await?;
    let questions = match session.commit(existing) {
        Ok(questions) => questions,
        Err(CommitError::Empty) => {
            bot.send_message(chat, "⚠️ No questions were added.").await?;
            return Ok(());
        }
        Err(e @ CommitError::NumberOverflow { .. }) => {
            bot.send_message(
                chat,
                format!("❌ {e}. Nothing was saved; start again with a smaller /newtest number."),
            )
            .await?;
            return Ok(());
        }
    };
    for question in &questions {
        app.storage.questions.upsert_open(question).await?;
    }

    let total = app.storage.questions.count_open().await?;
    let (first, last) = (questions[0].number, questions[questions.len() - 1].number);
    info!("saved open questions {first}..={last}");
    bot.send_message(
        chat,
        format!("✅ Saved questions #{first}-#{last}.\nThe bank now has {total} open questions."),
    )
    .await?;
    Ok(())
}

pub(super) async fn closed_step(
    bot: Bot,
    dialogue: QuizDialogue,
    session: ClosedAuthoringSession,
    msg: Message,
    app: Arc<App>,
) -> HandlerResult {
    let chat = msg.chat.id;
    let Some(text) = msg.text().map(String::from) else {
        bot.send_message(chat, "Please send text.").await?;
        return Ok(());
    };

    match Command::parse(&text) {
        Some(Command::Cancel) => {
            dialogue.exit().await?;
            bot.send_message(chat, "🗑 Wizard cancelled, nothing was saved.")
                .await?;
            return Ok(());
        }
        Some(Command::Done) => {
            bot.send_message(
                chat,
                format!(
                    "ℹ️ A closed question is saved after the points for part b.\n{}",
                    session.pending_prompt()
                ),
            )
            .await?;
            return Ok(());
        }
        Some(other) => return dispatch(bot, dialogue, msg, app, other).await,
        None => {}
    }

    match session.advance(&text) {
        ClosedStep::Next(next, prompt) => {
            dialogue.update(State::ClosedAuthoring(next)).await?;
            bot.send_message(chat, prompt.to_string()).await?;
        }
        ClosedStep::Retry(_, prompt) => {
            bot.send_message(chat, prompt.to_string()).await?;
        }
        ClosedStep::Complete(question) => {
            app.storage.questions.upsert_closed(&question).await?;
            dialogue.exit().await?;
            info!("saved closed question {}", question.number);
            bot.send_message(
                chat,
                format!(
                    "✅ Closed question #{} saved (a: {} pts, b: {} pts).",
                    question.number, question.a.points, question.b.points
                ),
            )
            .await?;
        }
    }
    Ok(())
}
