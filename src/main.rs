mod bot;
mod config;
mod controller;
mod quiz;
mod store;

use std::{error::Error, sync::Arc};

use chatgpt::client::ChatGPT;
use dotenv::dotenv;
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
};

use bot::State;
use config::Config;
use controller::SessionController;
use quiz::ai_helper::QuizHelper;
use store::{Leaderboard, QuestionBank};

type DialogueStorage = Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting catechism quiz bot...");

    let config = Config::from_env()?;
    let bot = Bot::from_env();

    log::info!("Opening dialogue storage at {}", config.dialogue_db);
    let storage: DialogueStorage = SqliteStorage::open(&config.dialogue_db, Json)
        .await?
        .erase();

    let bank = QuestionBank::open(config.saved_questions_path())?;
    let leaderboard = Leaderboard::open(config.leaderboard_path())?;

    let gpt = {
        let mut gpt = ChatGPT::new(&config.chatgpt_api_key)?;

        gpt.config.engine = config.chatgpt_engine;
        gpt.config.timeout = config.provider_timeout;

        gpt
    };
    let quiz_helper = QuizHelper::new(gpt, config.provider_timeout);

    let controller = Arc::new(SessionController::new(quiz_helper, bank, leaderboard));

    Dispatcher::builder(bot, bot::schema())
        .dependencies(dptree::deps![storage, controller])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
