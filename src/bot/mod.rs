pub mod bank;
pub mod keyboard;
pub mod play;
pub mod results;
pub mod setup;

use teloxide::{
    dispatching::{
        dialogue::{self, ErasedStorage},
        UpdateHandler,
    },
    prelude::*,
    types::ParseMode,
    utils::command::BotCommands,
};

use crate::controller::SessionController;
use crate::quiz::ai_helper::QuizHelper;
use crate::quiz::session::{Pick, QuizSession, ResultSummary};
use crate::quiz::QuizConfig;

pub type Controller = SessionController<QuizHelper>;
pub type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    Home,
    ReceiveTopic,
    ReceiveDifficulty {
        config: QuizConfig,
    },
    ReceiveQuestionCount {
        config: QuizConfig,
    },
    ReceiveLives {
        config: QuizConfig,
    },
    ReceiveAvoidRepeats {
        config: QuizConfig,
    },
    ReceiveConfirmMode {
        config: QuizConfig,
    },
    /// A question generation request is in flight.
    Loading,
    Playing {
        session: QuizSession,
        config: QuizConfig,
        pick: Pick,
    },
    Finished {
        summary: ResultSummary,
        recorded: bool,
    },
    ReceivePlayerName {
        summary: ResultSummary,
    },
    ReceiveGroup {
        summary: ResultSummary,
        name: String,
    },
    ReceiveRegion {
        summary: ResultSummary,
        name: String,
        group: Option<String>,
    },
    ManageSaved,
}

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase", description = "Comandos disponíveis:")]
pub enum Command {
    #[command(description = "começar ou voltar ao início.")]
    Start,
    #[command(description = "mostrar esta ajuda.")]
    Help,
    #[command(description = "abandonar o quiz atual.")]
    Cancelar,
    #[command(description = "ver o ranking.")]
    Ranking,
    #[command(description = "gerenciar o banco de questões.")]
    Banco,
}

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(setup::start))
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Cancelar].endpoint(cancel))
        .branch(case![Command::Ranking].endpoint(bank::show_ranking))
        .branch(case![Command::Banco].endpoint(bank::show_saved));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![State::Start].endpoint(setup::start))
        .branch(case![State::Home].endpoint(setup::home))
        .branch(case![State::ReceiveTopic].endpoint(setup::receive_topic))
        .branch(case![State::ReceiveDifficulty { config }].endpoint(setup::receive_difficulty))
        .branch(case![State::ReceiveQuestionCount { config }].endpoint(setup::receive_question_count))
        .branch(case![State::ReceiveLives { config }].endpoint(setup::receive_lives))
        .branch(case![State::ReceiveAvoidRepeats { config }].endpoint(setup::receive_avoid_repeats))
        .branch(case![State::ReceiveConfirmMode { config }].endpoint(setup::receive_confirm_mode))
        .branch(case![State::Loading].endpoint(setup::loading))
        .branch(case![State::Playing { session, config, pick }].endpoint(play::playing))
        .branch(case![State::Finished { summary, recorded }].endpoint(results::finished))
        .branch(case![State::ReceivePlayerName { summary }].endpoint(results::receive_player_name))
        .branch(case![State::ReceiveGroup { summary, name }].endpoint(results::receive_group))
        .branch(case![State::ReceiveRegion { summary, name, group }].endpoint(results::receive_region))
        .branch(case![State::ManageSaved].endpoint(bank::manage_saved));

    dialogue::enter::<Update, ErasedStorage<State>, State, _>().branch(message_handler)
}

async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

async fn cancel(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Quiz cancelado.").await?;
    go_home(&bot, &dialogue, msg.chat.id).await
}

/// Shows the main menu and waits for a choice there.
pub async fn go_home(bot: &Bot, dialogue: &QuizDialogue, chat_id: ChatId) -> HandlerResult {
    bot.send_message(chat_id, "O que você gostaria de fazer?")
        .reply_markup(keyboard::home_keyboard())
        .await?;
    dialogue.update(State::Home).await?;
    Ok(())
}

/// Telegram rejects longer messages.
const MESSAGE_LIMIT: usize = 4096;

/// Sends HTML text, split on line boundaries when it does not fit one message.
pub async fn send_html(bot: &Bot, chat_id: ChatId, text: String) -> HandlerResult {
    for chunk in split_message(&text) {
        bot.send_message(chat_id, chunk)
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(true)
            .await?;
    }
    Ok(())
}

fn split_message(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if !current.is_empty() && current.len() + line.len() + 1 > MESSAGE_LIMIT {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}
