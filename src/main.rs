use std::sync::Arc;

use dotenv::dotenv;
use log::{error, info};
use teloxide::dispatching::dialogue::{serializer::Json, SqliteStorage, Storage as _};
use teloxide::prelude::*;

use quiz_bot::bot::{self, App, DialogueStorage};
use quiz_bot::config::Config;
use quiz_bot::form;
use quiz_bot::store::{MemoryStore, Storage};

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error: {e}");
            std::process::exit(1);
        }
    };
    info!("Starting quiz bot with {config:?}");

    if let Err(e) = run(config).await {
        error!("fatal: {e}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let storage = match &config.data_path {
        Some(path) => {
            info!("Loading quiz data from {}", path.display());
            Storage::from_store(MemoryStore::open(path).await?)
        }
        None => Storage::in_memory(),
    };

    info!("Opening dialogue database {}", config.dialogue_db);
    let dialogues: DialogueStorage = SqliteStorage::open(&config.dialogue_db, Json).await?.erase();

    let form_storage = storage.clone();
    let form_addr = config.form_addr;
    tokio::spawn(async move {
        if let Err(e) = form::serve(form_addr, form_storage).await {
            error!("closed-form endpoint stopped: {e}");
        }
    });

    let bot = Bot::new(config.token.clone());
    let app = Arc::new(App::new(config, storage));

    Dispatcher::builder(bot, bot::schema())
        .dependencies(dptree::deps![dialogues, app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}
