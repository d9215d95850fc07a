use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode, utils::html};

use super::keyboard::{self, HOME, PLAY_AGAIN, RECORD_SCORE, REVIEW, SKIP};
use super::{go_home, send_html, setup, Controller, HandlerResult, QuizDialogue, State};
use crate::controller::PlayerDetails;
use crate::quiz::session::ResultSummary;
use crate::store::RecordOutcome;

/// Headline and encouragement for a final score.
fn verdict(summary: &ResultSummary) -> (&'static str, &'static str) {
    if summary.game_over {
        (
            "💔 Fim de jogo!",
            "Suas vidas acabaram, mas a caminhada continua. Tente de novo!",
        )
    } else if summary.score as usize == summary.total {
        ("🏆 Perfeito!", "Você acertou tudo. Glória a Deus!")
    } else if summary.percentage() >= 60.0 {
        ("🎉 Muito bem!", "Você conhece bem a fé. Continue estudando!")
    } else {
        ("📖 Continue estudando!", "Cada quiz é uma nova oportunidade de aprender.")
    }
}

pub fn result_text(summary: &ResultSummary) -> String {
    let (headline, encouragement) = verdict(summary);
    format!(
        "<b>{}</b>\n\nVocê fez <b>{}</b> de {} pontos ({:.0}%).\n{}",
        headline,
        summary.score,
        summary.total,
        summary.percentage(),
        encouragement
    )
}

pub fn share_text(summary: &ResultSummary) -> String {
    format!(
        "Fiz {}/{} pontos no Quizz Catequético! Tema: {} ({}). Você consegue me superar?",
        summary.score,
        summary.total,
        summary.config.topic.label(),
        summary.config.difficulty_label()
    )
}

/// Questions per review message, keeping each under Telegram's length limit.
const REVIEW_PAGE: usize = 5;

pub fn review_pages(summary: &ResultSummary) -> Vec<String> {
    let mut pages = Vec::new();
    for (page, questions) in summary.questions.chunks(REVIEW_PAGE).enumerate() {
        let mut text = if page == 0 {
            String::from("<b>Revisão</b>\n")
        } else {
            String::new()
        };
        for (offset, question) in questions.iter().enumerate() {
            let i = page * REVIEW_PAGE + offset;
            let chosen = summary.answer_at(i);
            let mark = match chosen {
                Some(choice) if question.is_correct(choice) => "✅",
                Some(_) => "❌",
                None => "➖",
            };
            text.push_str(&format!(
                "\n{} <b>{}.</b> {}\n",
                mark,
                i + 1,
                html::escape(&question.question_text)
            ));
            if let Some(choice) = chosen {
                text.push_str(&format!(
                    "Sua resposta: {}) {}\n",
                    keyboard::option_letter(choice),
                    html::escape(&question.options[choice])
                ));
            }
            text.push_str(&format!(
                "Resposta certa: {}) {}\n",
                keyboard::option_letter(question.correct_option_index as usize),
                html::escape(question.correct_option())
            ));
            if !question.explanation.is_empty() {
                text.push_str(&format!("<i>{}</i>\n", html::escape(&question.explanation)));
            }
        }
        pages.push(text);
    }
    pages
}

/// Zero-point runs are never offered for the ranking.
fn can_record(summary: &ResultSummary, recorded: bool) -> bool {
    summary.is_competitive() && summary.score > 0 && !recorded
}

/// Longest name shown on the ranking.
const MAX_NAME_CHARS: usize = 20;

fn player_name(text: Option<&str>) -> Option<&str> {
    text.map(str::trim)
        .filter(|name| !name.is_empty() && name.chars().count() <= MAX_NAME_CHARS)
}

pub async fn show_result(
    bot: &Bot,
    chat_id: ChatId,
    summary: &ResultSummary,
    recorded: bool,
) -> HandlerResult {
    bot.send_message(chat_id, result_text(summary))
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard::result_keyboard(can_record(summary, recorded)))
        .await?;
    bot.send_message(chat_id, share_text(summary)).await?;
    Ok(())
}

pub async fn finished(
    bot: Bot,
    dialogue: QuizDialogue,
    (summary, recorded): (ResultSummary, bool),
    msg: Message,
    controller: Arc<Controller>,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    match msg.text().unwrap_or_default() {
        PLAY_AGAIN => {
            let config = summary.config.clone();
            setup::launch_quiz(&bot, &dialogue, chat_id, &controller, config).await?;
        }
        RECORD_SCORE if can_record(&summary, recorded) => {
            bot.send_message(chat_id, "Qual é o seu nome?")
                .reply_markup(teloxide::types::KeyboardRemove::new())
                .await?;
            dialogue.update(State::ReceivePlayerName { summary }).await?;
        }
        REVIEW => {
            for page in review_pages(&summary) {
                send_html(&bot, chat_id, page).await?;
            }
            show_result(&bot, chat_id, &summary, recorded).await?;
        }
        HOME => go_home(&bot, &dialogue, chat_id).await?,
        _ => {
            bot.send_message(chat_id, "Por favor, use os botões abaixo")
                .reply_markup(keyboard::result_keyboard(can_record(&summary, recorded)))
                .await?;
        }
    }
    Ok(())
}

pub async fn receive_player_name(
    bot: Bot,
    dialogue: QuizDialogue,
    summary: ResultSummary,
    msg: Message,
) -> HandlerResult {
    match player_name(msg.text()) {
        Some(name) => {
            bot.send_message(
                msg.chat.id,
                format!("Qual é o seu grupo ou paróquia? (envie {SKIP} para pular)"),
            )
            .reply_markup(keyboard::skip_keyboard())
            .await?;
            dialogue
                .update(State::ReceiveGroup {
                    summary,
                    name: name.to_string(),
                })
                .await?;
        }
        _ => {
            bot.send_message(
                msg.chat.id,
                format!("Por favor, digite o seu nome (até {MAX_NAME_CHARS} caracteres)"),
            )
            .await?;
        }
    }
    Ok(())
}

pub async fn receive_group(
    bot: Bot,
    dialogue: QuizDialogue,
    (summary, name): (ResultSummary, String),
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text().map(str::trim) else {
        bot.send_message(msg.chat.id, "Por favor, envie um texto").await?;
        return Ok(());
    };
    let group = (text != SKIP && !text.is_empty()).then(|| text.to_string());

    bot.send_message(msg.chat.id, "De qual cidade ou região você é?")
        .reply_markup(teloxide::types::KeyboardRemove::new())
        .await?;
    dialogue
        .update(State::ReceiveRegion {
            summary,
            name,
            group,
        })
        .await?;
    Ok(())
}

pub async fn receive_region(
    bot: Bot,
    dialogue: QuizDialogue,
    (summary, name, group): (ResultSummary, String, Option<String>),
    msg: Message,
    controller: Arc<Controller>,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let region = match msg.text().map(str::trim) {
        Some(region) if !region.is_empty() => region.to_string(),
        _ => {
            bot.send_message(chat_id, "Por favor, digite a sua cidade ou região")
                .await?;
            return Ok(());
        }
    };

    let details = PlayerDetails {
        name,
        group,
        region,
    };
    let recorded = match controller.submit_score(&summary, details).await {
        Ok(RecordOutcome::Ranked(position)) => {
            bot.send_message(
                chat_id,
                format!("🏅 Pontuação registrada! Você está em {position}º lugar no ranking."),
            )
            .await?;
            true
        }
        Ok(RecordOutcome::OutOfTop) => {
            bot.send_message(
                chat_id,
                "Pontuação registrada, mas ainda não entrou no top do ranking. Continue tentando!",
            )
            .await?;
            true
        }
        Ok(RecordOutcome::PracticeRejected) => {
            bot.send_message(chat_id, "Quizzes do banco salvo não entram no ranking.")
                .await?;
            true
        }
        Err(err) => {
            log::error!("Failed to record score: {}", err);
            bot.send_message(chat_id, "⚠️ Não foi possível registrar sua pontuação.")
                .await?;
            false
        }
    };

    show_result(&bot, chat_id, &summary, recorded).await?;
    dialogue.update(State::Finished { summary, recorded }).await?;
    Ok(())
}
