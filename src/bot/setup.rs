use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{ChatAction, KeyboardRemove},
};

use super::keyboard::{self, HOME, NEW_QUIZ, NO, RANKING, SAVED_BANK, YES};
use super::{bank, go_home, play, Controller, HandlerResult, QuizDialogue, State};
use crate::controller::ControllerError;
use crate::quiz::session::Pick;
use crate::quiz::{Difficulty, QuizConfig, Topic, MAX_LIVES, MAX_QUESTIONS, MIN_LIVES, MIN_QUESTIONS};

const GREETING_TEXT: &str = "✝️ Bem-vindo ao Quizz Catequético! Teste seus conhecimentos sobre a Bíblia, a liturgia, o catecismo e a vida dos santos.";

pub async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;
    go_home(&bot, &dialogue, msg.chat.id).await
}

pub async fn home(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    controller: Arc<Controller>,
) -> HandlerResult {
    match msg.text() {
        Some(NEW_QUIZ) => {
            bot.send_message(msg.chat.id, "Escolha o tema:")
                .reply_markup(keyboard::topic_keyboard())
                .await?;
            dialogue.update(State::ReceiveTopic).await?;
        }
        Some(SAVED_BANK) => bank::show_saved(bot, dialogue, msg, controller).await?,
        Some(RANKING) => bank::show_ranking(bot, msg, controller).await?,
        _ => {
            bot.send_message(msg.chat.id, "Por favor, escolha uma das opções")
                .reply_markup(keyboard::home_keyboard())
                .await?;
        }
    }
    Ok(())
}

pub async fn receive_topic(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    let text = msg.text().unwrap_or_default();
    if text == HOME {
        return go_home(&bot, &dialogue, msg.chat.id).await;
    }
    let Some(topic) = Topic::from_label(text) else {
        bot.send_message(msg.chat.id, "Por favor, escolha um dos temas")
            .reply_markup(keyboard::topic_keyboard())
            .await?;
        return Ok(());
    };

    bot.send_message(msg.chat.id, "Escolha a dificuldade:")
        .reply_markup(keyboard::difficulty_keyboard())
        .await?;
    dialogue
        .update(State::ReceiveDifficulty {
            config: QuizConfig::new(topic),
        })
        .await?;
    Ok(())
}

pub async fn receive_difficulty(
    bot: Bot,
    dialogue: QuizDialogue,
    mut config: QuizConfig,
    msg: Message,
) -> HandlerResult {
    let text = msg.text().unwrap_or_default();
    if text == HOME {
        return go_home(&bot, &dialogue, msg.chat.id).await;
    }
    let Some(difficulty) = Difficulty::from_label(text) else {
        bot.send_message(msg.chat.id, "Por favor, escolha uma das dificuldades")
            .reply_markup(keyboard::difficulty_keyboard())
            .await?;
        return Ok(());
    };
    config.difficulty = difficulty;

    bot.send_message(
        msg.chat.id,
        format!("Quantas perguntas? (de {MIN_QUESTIONS} a {MAX_QUESTIONS})"),
    )
    .reply_markup(keyboard::question_count_keyboard())
    .await?;
    dialogue.update(State::ReceiveQuestionCount { config }).await?;
    Ok(())
}

pub async fn receive_question_count(
    bot: Bot,
    dialogue: QuizDialogue,
    mut config: QuizConfig,
    msg: Message,
) -> HandlerResult {
    let text = msg.text().unwrap_or_default();
    if text == HOME {
        return go_home(&bot, &dialogue, msg.chat.id).await;
    }
    match text.trim().parse::<usize>() {
        Ok(count) if (MIN_QUESTIONS..=MAX_QUESTIONS).contains(&count) => config.question_count = count,
        _ => {
            bot.send_message(
                msg.chat.id,
                format!("Por favor, digite um número de {MIN_QUESTIONS} a {MAX_QUESTIONS}"),
            )
            .await?;
            return Ok(());
        }
    }

    bot.send_message(
        msg.chat.id,
        format!("Quantas vidas? (de {MIN_LIVES} a {MAX_LIVES})"),
    )
    .reply_markup(keyboard::lives_keyboard())
    .await?;
    dialogue.update(State::ReceiveLives { config }).await?;
    Ok(())
}

pub async fn receive_lives(
    bot: Bot,
    dialogue: QuizDialogue,
    mut config: QuizConfig,
    msg: Message,
) -> HandlerResult {
    let text = msg.text().unwrap_or_default();
    if text == HOME {
        return go_home(&bot, &dialogue, msg.chat.id).await;
    }
    match text.trim().parse::<u32>() {
        Ok(lives) if (MIN_LIVES..=MAX_LIVES).contains(&lives) => config.lives = lives,
        _ => {
            bot.send_message(
                msg.chat.id,
                format!("Por favor, digite um número de {MIN_LIVES} a {MAX_LIVES}"),
            )
            .await?;
            return Ok(());
        }
    }

    bot.send_message(
        msg.chat.id,
        "Evitar perguntas repetidas? A IA vai buscar perguntas menos comuns.",
    )
    .reply_markup(keyboard::yes_no_keyboard())
    .await?;
    dialogue.update(State::ReceiveAvoidRepeats { config }).await?;
    Ok(())
}

fn parse_yes_no(text: &str) -> Option<bool> {
    match text {
        YES => Some(true),
        NO => Some(false),
        _ => None,
    }
}

pub async fn receive_avoid_repeats(
    bot: Bot,
    dialogue: QuizDialogue,
    mut config: QuizConfig,
    msg: Message,
) -> HandlerResult {
    let text = msg.text().unwrap_or_default();
    if text == HOME {
        return go_home(&bot, &dialogue, msg.chat.id).await;
    }
    let Some(avoid_repeats) = parse_yes_no(text) else {
        bot.send_message(msg.chat.id, "Por favor, responda Sim ou Não")
            .reply_markup(keyboard::yes_no_keyboard())
            .await?;
        return Ok(());
    };
    config.avoid_repeats = avoid_repeats;

    bot.send_message(
        msg.chat.id,
        "Confirmar antes de responder? Você escolhe a opção e depois toca em Confirmar.",
    )
    .reply_markup(keyboard::yes_no_keyboard())
    .await?;
    dialogue.update(State::ReceiveConfirmMode { config }).await?;
    Ok(())
}

pub async fn receive_confirm_mode(
    bot: Bot,
    dialogue: QuizDialogue,
    mut config: QuizConfig,
    msg: Message,
    controller: Arc<Controller>,
) -> HandlerResult {
    let text = msg.text().unwrap_or_default();
    if text == HOME {
        return go_home(&bot, &dialogue, msg.chat.id).await;
    }
    let Some(confirm_answer) = parse_yes_no(text) else {
        bot.send_message(msg.chat.id, "Por favor, responda Sim ou Não")
            .reply_markup(keyboard::yes_no_keyboard())
            .await?;
        return Ok(());
    };
    config.confirm_answer = confirm_answer;

    launch_quiz(&bot, &dialogue, msg.chat.id, &controller, config).await
}

/// Updates of a chat are handled one at a time, so reaching this state means
/// the generation that set it is gone (a failed send or a restart).
pub async fn loading(bot: Bot, dialogue: QuizDialogue) -> HandlerResult {
    log::warn!("Chat {} was left in the loading state", dialogue.chat_id().0);
    dialogue.update(State::Home).await?;
    bot.send_message(
        dialogue.chat_id(),
        "⚠️ A preparação do quiz foi interrompida. Tente novamente.",
    )
    .reply_markup(keyboard::home_keyboard())
    .await?;
    Ok(())
}

/// Builds a session for `config` and shows its first question.
///
/// Generated quizzes pass through [`State::Loading`] while the provider works.
/// When no session can be built the dialogue ends up at home, except for an
/// empty saved bank, which leaves the current state untouched.
pub async fn launch_quiz(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    controller: &Controller,
    config: QuizConfig,
) -> HandlerResult {
    let generated = !config.topic.is_saved_pool();
    let result = start_quiz(bot, dialogue, chat_id, controller, config).await;
    if result.is_err() && generated {
        // Never leave the chat waiting on a generation that has ended
        if let Err(err) = dialogue.update(State::Home).await {
            log::error!("Failed to leave the loading state: {}", err);
        }
    }
    result
}

async fn start_quiz(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    controller: &Controller,
    config: QuizConfig,
) -> HandlerResult {
    let generated = !config.topic.is_saved_pool();
    if generated {
        dialogue.update(State::Loading).await?;
        bot.send_message(
            chat_id,
            "🙏 Preparando catequese... A inteligência artificial está criando seu quiz.",
        )
        .reply_markup(KeyboardRemove::new())
        .await?;
        // Typing indicator only, a failure here changes nothing
        let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
    }

    let started = match controller.start(&config).await {
        Ok(started) => started,
        Err(ControllerError::EmptySource) if !generated => {
            bot.send_message(chat_id, "Você não tem perguntas salvas!").await?;
            return Ok(());
        }
        Err(err) => {
            log::error!("Failed to start quiz: {}", err);
            bot.send_message(
                chat_id,
                "Erro ao conectar com a Catequese Digital. Tente novamente.",
            )
            .await?;
            return go_home(bot, dialogue, chat_id).await;
        }
    };

    if let Some(warning) = started.warning {
        log::warn!("Playing fallback questions: {}", warning);
        bot.send_message(
            chat_id,
            "⚠️ Não foi possível gerar perguntas novas agora. Vamos jogar com uma pergunta reserva.",
        )
        .await?;
    }

    let session = started.session;
    let pick = Pick::Unanswered;
    play::show_question(bot, chat_id, controller, &session, &config, pick).await?;
    dialogue
        .update(State::Playing {
            session,
            config,
            pick,
        })
        .await?;
    Ok(())
}
