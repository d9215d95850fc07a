use std::sync::Arc;

use teloxide::{prelude::*, utils::html};

use super::keyboard::{self, HOME, PLAY_SAVED};
use super::{go_home, send_html, setup, Controller, HandlerResult, QuizDialogue, State};
use crate::quiz::{Question, QuizConfig};
use crate::store::{LeaderboardEntry, RegionScore};

pub fn saved_text(questions: &[Question]) -> String {
    if questions.is_empty() {
        return "📚 Seu banco de questões está vazio. Salve perguntas durante um quiz com ⭐."
            .to_string();
    }

    let mut text = format!("<b>📚 Banco de questões</b> ({} salvas)\n\n", questions.len());
    for (i, question) in questions.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, html::escape(&question.question_text)));
    }
    text
}

pub fn ranking_text(entries: &[LeaderboardEntry], regions: &[RegionScore]) -> String {
    if entries.is_empty() {
        return "🏆 O ranking ainda está vazio. Seja o primeiro!".to_string();
    }

    let mut text = String::from("<b>🏆 Ranking individual</b>\n\n");
    for (i, entry) in entries.iter().enumerate() {
        let group = entry
            .group
            .as_deref()
            .map(|g| format!(" ({})", html::escape(g)))
            .unwrap_or_default();
        text.push_str(&format!(
            "{}. {}{} · {} · <b>{}</b> pts · {} · {}\n",
            i + 1,
            html::escape(&entry.name),
            group,
            html::escape(&entry.region),
            entry.score,
            entry.difficulty,
            entry.date
        ));
    }

    text.push_str("\n<b>🗺 Ranking por região</b>\n\n");
    for (i, region) in regions.iter().enumerate() {
        text.push_str(&format!(
            "{}. {} · <b>{}</b> pts\n",
            i + 1,
            html::escape(&region.region),
            region.score
        ));
    }
    text
}

pub async fn show_saved(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    controller: Arc<Controller>,
) -> HandlerResult {
    let questions = controller.saved_questions().await;
    send_html(&bot, msg.chat.id, saved_text(&questions)).await?;
    let prompt = if questions.is_empty() {
        "Comece um novo quiz para salvar perguntas."
    } else {
        "Envie o número de uma pergunta para removê-la, ou jogue com o banco salvo."
    };
    bot.send_message(msg.chat.id, prompt)
        .reply_markup(keyboard::saved_keyboard(!questions.is_empty()))
        .await?;
    dialogue.update(State::ManageSaved).await?;
    Ok(())
}

pub async fn manage_saved(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    controller: Arc<Controller>,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let text = msg.text().unwrap_or_default();
    match text {
        PLAY_SAVED => {
            return setup::launch_quiz(&bot, &dialogue, chat_id, &controller, QuizConfig::saved_pool())
                .await
        }
        HOME => return go_home(&bot, &dialogue, chat_id).await,
        _ => {}
    }

    let questions = controller.saved_questions().await;
    let selected = text
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| questions.get(i));
    let Some(question) = selected else {
        bot.send_message(chat_id, "Envie o número de uma pergunta da lista")
            .reply_markup(keyboard::saved_keyboard(!questions.is_empty()))
            .await?;
        return Ok(());
    };

    match controller.delete_saved(&question.id).await {
        Ok(true) => {
            bot.send_message(chat_id, "🗑 Pergunta removida.").await?;
        }
        Ok(false) => log::debug!("Saved question {} was already gone", question.id),
        Err(err) => {
            log::error!("Failed to persist saved questions: {}", err);
            bot.send_message(chat_id, "⚠️ Não foi possível gravar o banco de questões.")
                .await?;
        }
    }
    show_saved(bot, dialogue, msg, controller).await
}

pub async fn show_ranking(bot: Bot, msg: Message, controller: Arc<Controller>) -> HandlerResult {
    let entries = controller.top_entries().await;
    let regions = controller.region_ranking().await;
    send_html(&bot, msg.chat.id, ranking_text(&entries, &regions)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::tests::questions;

    #[test]
    fn saved_list_is_numbered_from_one() {
        let text = saved_text(&questions(2));
        assert!(text.contains("1. Pergunta 1"));
        assert!(text.contains("2. Pergunta 2"));
        assert!(saved_text(&[]).contains("vazio"));
    }

    #[test]
    fn ranking_escapes_names() {
        let entries = vec![LeaderboardEntry {
            name: "Ana <3".to_string(),
            group: Some("Crisma".to_string()),
            region: "Recife".to_string(),
            score: 9,
            date: "01/05/2024".to_string(),
            difficulty: "Avançado".to_string(),
        }];
        let regions = vec![RegionScore {
            region: "Recife".to_string(),
            score: 9,
        }];
        let text = ranking_text(&entries, &regions);
        assert!(text.contains("1. Ana &lt;3 (Crisma) · Recife · <b>9</b> pts"));
        assert!(text.contains("Ranking por região"));
    }
}
