use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::quiz::session::{Pick, QuizSession};
use crate::quiz::{Difficulty, Topic, OPTION_COUNT};

pub const NEW_QUIZ: &str = "🎯 Novo quiz";
pub const SAVED_BANK: &str = "📚 Banco de questões";
pub const RANKING: &str = "🏆 Ranking";
pub const HOME: &str = "🏠 Início";

pub const PLAY_SAVED: &str = "▶️ Jogar banco salvo";

pub const YES: &str = "Sim";
pub const NO: &str = "Não";

pub const CONFIRM: &str = "✅ Confirmar";
pub const PREVIOUS: &str = "⬅️ Anterior";
pub const NEXT: &str = "➡️ Próxima";
pub const SEE_RESULT: &str = "🏁 Ver resultado";
pub const SAVE: &str = "⭐ Salvar";
pub const UNSAVE: &str = "🗑 Remover dos salvos";

pub const PLAY_AGAIN: &str = "🔁 Jogar novamente";
pub const RECORD_SCORE: &str = "🏅 Registrar pontuação";
pub const REVIEW: &str = "📝 Revisar";
pub const SKIP: &str = "-";

pub const OPTION_LETTERS: [&str; OPTION_COUNT] = ["A", "B", "C", "D"];
pub const QUESTION_COUNTS: [&str; 4] = ["5", "10", "15", "20"];
pub const LIVES: [&str; 3] = ["1", "3", "5"];

pub fn option_letter(index: usize) -> &'static str {
    OPTION_LETTERS.get(index).copied().unwrap_or("?")
}

pub fn option_index(text: &str) -> Option<usize> {
    OPTION_LETTERS.iter().position(|letter| letter.eq_ignore_ascii_case(text.trim()))
}

fn row(labels: &[&str]) -> Vec<KeyboardButton> {
    labels.iter().map(|l| KeyboardButton::new(*l)).collect()
}

pub fn home_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![row(&[NEW_QUIZ]), row(&[SAVED_BANK, RANKING])])
}

pub fn topic_keyboard() -> KeyboardMarkup {
    let mut rows: Vec<Vec<KeyboardButton>> = Topic::ALL
        .iter()
        .map(|topic| vec![KeyboardButton::new(topic.label())])
        .collect();
    rows.push(row(&[HOME]));
    KeyboardMarkup::new(rows)
}

pub fn difficulty_keyboard() -> KeyboardMarkup {
    let labels: Vec<&str> = Difficulty::ALL.iter().map(|d| d.label()).collect();
    KeyboardMarkup::new(vec![row(&labels[..2]), row(&labels[2..]), row(&[HOME])])
}

pub fn question_count_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![row(&QUESTION_COUNTS), row(&[HOME])])
}

pub fn lives_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![row(&LIVES), row(&[HOME])])
}

pub fn yes_no_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![row(&[YES, NO]), row(&[HOME])])
}

pub fn play_keyboard(session: &QuizSession, pick: Pick, confirm_required: bool, saved: bool) -> KeyboardMarkup {
    let mut rows = Vec::new();
    let mut navigation = Vec::new();
    if session.current_index() > 0 {
        navigation.push(PREVIOUS);
    }

    match pick {
        Pick::Committed(_) => {
            navigation.push(if session.is_last() { SEE_RESULT } else { NEXT });
        }
        Pick::Unanswered | Pick::Tentative(_) => {
            rows.push(row(&OPTION_LETTERS[..2]));
            rows.push(row(&OPTION_LETTERS[2..]));
            if confirm_required && matches!(pick, Pick::Tentative(_)) {
                rows.push(row(&[CONFIRM]));
            }
        }
    }

    if !navigation.is_empty() {
        rows.push(row(&navigation));
    }
    rows.push(row(&[if saved { UNSAVE } else { SAVE }, HOME]));
    KeyboardMarkup::new(rows)
}

pub fn result_keyboard(can_record: bool) -> KeyboardMarkup {
    let mut first = vec![PLAY_AGAIN];
    if can_record {
        first.push(RECORD_SCORE);
    }
    KeyboardMarkup::new(vec![row(&first), row(&[REVIEW, HOME])])
}

pub fn skip_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![row(&[SKIP])])
}

pub fn saved_keyboard(has_questions: bool) -> KeyboardMarkup {
    if has_questions {
        KeyboardMarkup::new(vec![row(&[PLAY_SAVED]), row(&[HOME])])
    } else {
        KeyboardMarkup::new(vec![row(&[HOME])])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_letters_map_to_indices() {
        assert_eq!(option_index("A"), Some(0));
        assert_eq!(option_index(" d "), Some(3));
        assert_eq!(option_index("E"), None);
        assert_eq!(option_letter(2), "C");
    }
}
