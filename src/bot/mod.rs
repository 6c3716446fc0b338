mod admin;
mod authoring;
mod commands;
mod messenger;
mod respondent;

use std::sync::Arc;

use log::debug;
use teloxide::dispatching::dialogue::ErasedStorage;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::config::Config;
use crate::quiz::authoring::AuthoringSession;
use crate::quiz::closed_authoring::ClosedAuthoringSession;
use crate::store::Storage;

pub use commands::Command;
pub use messenger::{question_keyboard, TelegramMessenger};

/// Per-chat dialogue state; only the main admin ever leaves `Idle`.
///
/// Starting a new wizard replaces whatever session the chat had.
#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Idle,
    OpenAuthoring(AuthoringSession),
    ClosedAuthoring(ClosedAuthoringSession),
}

pub type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
pub type DialogueStorage = Arc<ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Shared handler dependencies.
pub struct App {
    pub config: Config,
    pub storage: Storage,
}

impl App {
    pub fn new(config: Config, storage: Storage) -> Self {
        Self { config, storage }
    }
}

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let messages = Update::filter_message()
        .enter_dialogue::<Message, ErasedStorage<State>, State>()
        .branch(dptree::case![State::Idle].endpoint(idle))
        .branch(dptree::case![State::OpenAuthoring(session)].endpoint(authoring::open_step))
        .branch(dptree::case![State::ClosedAuthoring(session)].endpoint(authoring::closed_step));

    let callbacks = Update::filter_callback_query().endpoint(respondent::callback);

    dptree::entry().branch(messages).branch(callbacks)
}

async fn idle(bot: Bot, dialogue: QuizDialogue, msg: Message, app: Arc<App>) -> HandlerResult {
    let Some(command) = msg.text().and_then(Command::parse) else {
        debug!("{}: ignoring non-command message", msg.chat.id);
        return Ok(());
    };
    dispatch(bot, dialogue, msg, app, command).await
}

/// Routes a parsed command, enforcing the admin allow-list.
async fn dispatch(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    app: Arc<App>,
    command: Command,
) -> HandlerResult {
    let chat = msg.chat.id;
    if command.needs_main_admin() && !app.config.is_main_admin(chat.0) {
        bot.send_message(chat, "❌ Only the main admin can create questions.")
            .await?;
        return Ok(());
    }
    if command.is_admin_only() && !app.config.is_admin(chat.0) {
        bot.send_message(chat, "❌ This command is for admins only.").await?;
        return Ok(());
    }

    match command {
        Command::Start => respondent::start(bot, msg, app).await,
        Command::Profile => respondent::profile(bot, chat, msg.chat.first_name(), &app).await,
        Command::Admin => admin::panel(bot, chat).await,
        Command::Enroll(tokens) => admin::enroll(bot, chat, &app, &tokens).await,
        Command::Who(id) => admin::who(bot, chat, &app, id).await,
        Command::Users => admin::users(bot, chat, &app).await,
        Command::Participants => admin::participants(bot, chat, &app).await,
        Command::Results => admin::results(bot, chat, &app).await,
        Command::Questions => admin::questions(bot, chat, &app).await,
        Command::NewTest(base) => authoring::start_open(bot, dialogue, chat, base).await,
        Command::NewClosed => authoring::start_closed(bot, dialogue, chat).await,
        Command::Done | Command::Cancel => {
            bot.send_message(chat, "ℹ️ No question wizard is running.").await?;
            Ok(())
        }
        Command::StartTest => admin::start_test(bot, chat, &app).await,
        Command::FinishTests => admin::finish_tests(bot, chat, &app).await,
        Command::ClearQuestions => admin::clear_questions(bot, chat, &app).await,
        Command::ClearParticipants => admin::clear_participants(bot, chat, &app).await,
        Command::Announce(text) => admin::announce(bot, chat, &app, &text).await,
    }
}
