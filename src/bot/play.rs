use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode, utils::html};

use super::keyboard::{self, CONFIRM, HOME, NEXT, PREVIOUS, SAVE, SEE_RESULT, UNSAVE};
use super::{go_home, results, Controller, HandlerResult, QuizDialogue, State};
use crate::quiz::session::{AnswerOutcome, Pick, QuizSession, Review, Step};
use crate::quiz::QuizConfig;
use crate::store::Toggle;

/// Question text, its options and, once answered, the feedback.
pub fn question_text(session: &QuizSession, review: &Review<'_>, pick: Pick) -> String {
    let question = review.question;
    let mut text = format!(
        "<b>Pergunta {}/{}</b> · ❤️ {} · Pontos: {}\n",
        review.index + 1,
        session.len(),
        session.lives(),
        session.score()
    );

    let labels: Vec<&str> = [question.category.as_deref(), question.difficulty.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !labels.is_empty() {
        text.push_str(&format!("<i>{}</i>\n", html::escape(&labels.join(" · "))));
    }
    text.push_str(&format!("\n{}\n\n", html::escape(&question.question_text)));

    for (i, option) in question.options.iter().enumerate() {
        let marker = match (review.chosen, pick) {
            (Some(_), _) if question.is_correct(i) => "✅ ",
            (Some(chosen), _) if chosen == i => "❌ ",
            (None, Pick::Tentative(selected)) if selected == i => "👉 ",
            _ => "",
        };
        text.push_str(&format!(
            "{}<b>{})</b> {}\n",
            marker,
            keyboard::option_letter(i),
            html::escape(option)
        ));
    }

    if let Some(correct) = review.is_correct() {
        text.push('\n');
        text.push_str(&feedback_text(review, correct));
    }
    text
}

fn feedback_text(review: &Review<'_>, correct: bool) -> String {
    let question = review.question;
    let mut text = if correct {
        "<b>Correto!</b> 🎉\n".to_string()
    } else {
        format!(
            "<b>Incorreto.</b> A resposta certa é {}) {}\n",
            keyboard::option_letter(question.correct_option_index as usize),
            html::escape(question.correct_option())
        )
    };
    if !question.explanation.is_empty() {
        text.push_str(&format!("\n📖 {}\n", html::escape(&question.explanation)));
    }
    if let Some(url) = &question.more_info_url {
        text.push_str(&format!("🔗 <a href=\"{}\">Saiba mais</a>\n", html::escape(url)));
    }
    text
}

pub async fn show_question(
    bot: &Bot,
    chat_id: ChatId,
    controller: &Controller,
    session: &QuizSession,
    config: &QuizConfig,
    pick: Pick,
) -> HandlerResult {
    let review = session.current_review();
    let saved = controller.is_saved(review.question).await;
    bot.send_message(chat_id, question_text(session, &review, pick))
        .parse_mode(ParseMode::Html)
        .disable_web_page_preview(true)
        .reply_markup(keyboard::play_keyboard(session, pick, config.confirm_answer, saved))
        .await?;
    Ok(())
}

pub async fn playing(
    bot: Bot,
    dialogue: QuizDialogue,
    (mut session, config, pick): (QuizSession, QuizConfig, Pick),
    msg: Message,
    controller: Arc<Controller>,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let text = msg.text().unwrap_or_default();

    let submit = match text {
        HOME => return go_home(&bot, &dialogue, chat_id).await,
        CONFIRM => Some(pick.confirm()),
        SAVE | UNSAVE => {
            let question = session.current_question().clone();
            let notice = match controller.toggle_saved(&question).await {
                Ok(Toggle::Saved) => "Pergunta salva no banco!",
                Ok(Toggle::Removed) => "Pergunta removida dos salvos",
                Err(err) => {
                    log::error!("Failed to persist saved questions: {}", err);
                    "⚠️ Não foi possível gravar o banco de questões."
                }
            };
            bot.send_message(chat_id, notice).await?;
            return show_question(&bot, chat_id, &controller, &session, &config, pick).await;
        }
        PREVIOUS => {
            if let Step::Moved(index) = session.retreat() {
                return move_to(&bot, &dialogue, chat_id, &controller, session, config, index).await;
            }
            return Ok(());
        }
        NEXT | SEE_RESULT => {
            if session.answer_at(session.current_index()).is_none() {
                bot.send_message(chat_id, "Responda a pergunta antes de continuar.")
                    .await?;
                return Ok(());
            }
            return match session.advance() {
                Step::Moved(index) => move_to(&bot, &dialogue, chat_id, &controller, session, config, index).await,
                Step::Finished => finish(&bot, &dialogue, chat_id, &controller, &session, &config).await,
                Step::Stayed => Ok(()),
            };
        }
        other => keyboard::option_index(other).map(|choice| pick.select(choice, config.confirm_answer)),
    };

    let Some((pick, choice)) = submit else {
        bot.send_message(chat_id, "Por favor, use os botões abaixo")
            .reply_markup(keyboard::play_keyboard(
                &session,
                pick,
                config.confirm_answer,
                controller.is_saved(session.current_question()).await,
            ))
            .await?;
        return Ok(());
    };

    let Some(choice) = choice else {
        // Tentative pick, or nothing left to commit
        show_question(&bot, chat_id, &controller, &session, &config, pick).await?;
        dialogue.update(State::Playing { session, config, pick }).await?;
        return Ok(());
    };

    let index = session.current_index();
    let outcome = session.answer(index, choice);
    log::debug!("Question {} answered, correct: {}", index + 1, outcome.is_correct());
    match outcome {
        AnswerOutcome::Incorrect { game_over: true } => {
            show_question(&bot, chat_id, &controller, &session, &config, pick).await?;
            bot.send_message(chat_id, "💔 Suas vidas acabaram!").await?;
            finish(&bot, &dialogue, chat_id, &controller, &session, &config).await
        }
        AnswerOutcome::Correct | AnswerOutcome::Incorrect { .. } => {
            show_question(&bot, chat_id, &controller, &session, &config, pick).await?;
            dialogue.update(State::Playing { session, config, pick }).await?;
            Ok(())
        }
        AnswerOutcome::AlreadyAnswered | AnswerOutcome::Rejected => {
            log::debug!("Ignoring answer {} for question {}", choice, index);
            Ok(())
        }
    }
}

async fn move_to(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    controller: &Controller,
    session: QuizSession,
    config: QuizConfig,
    index: usize,
) -> HandlerResult {
    let pick = Pick::for_slot(session.answer_at(index));
    show_question(bot, chat_id, controller, &session, &config, pick).await?;
    dialogue.update(State::Playing { session, config, pick }).await?;
    Ok(())
}

async fn finish(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    controller: &Controller,
    session: &QuizSession,
    config: &QuizConfig,
) -> HandlerResult {
    let summary = controller.finish(session, config);
    results::show_result(bot, chat_id, &summary, false).await?;
    dialogue
        .update(State::Finished {
            summary,
            recorded: false,
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::tests::questions;

    #[test]
    fn answered_question_shows_feedback() {
        let mut session = QuizSession::start(questions(3), 3).unwrap();
        let wrong = (session.current_question().correct_option_index as usize + 1) % 4;
        session.answer(0, wrong);
        let text = question_text(&session, &session.current_review(), Pick::Committed(wrong));
        assert!(text.contains("Pergunta 1/3"));
        assert!(text.contains("Incorreto"));
        assert!(text.contains("❤️ 2"));
        assert!(text.contains("❌ <b>B)</b>"));
    }

    #[test]
    fn tentative_pick_is_marked() {
        let session = QuizSession::start(questions(2), 3).unwrap();
        let text = question_text(&session, &session.current_review(), Pick::Tentative(2));
        assert!(text.contains("👉 <b>C)</b>"));
        assert!(!text.contains("Correto"));
        assert!(!text.contains("Incorreto"));
    }
}
