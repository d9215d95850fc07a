use std::path::PathBuf;

use rand::seq::SliceRandom;
use rand::Rng;

use super::{JsonStore, PersistenceError};
use crate::quiz::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Saved,
    Removed,
}

/// The player's personal question bank. Every mutation is flushed before returning.
pub struct QuestionBank {
    questions: Vec<Question>,
    store: JsonStore<Question>,
}

impl QuestionBank {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let store = JsonStore::new(path);
        let bank = Self {
            questions: store.load()?,
            store,
        };
        log::info!(
            "Loaded {} saved questions from {}",
            bank.len(),
            bank.store.path().display()
        );
        Ok(bank)
    }

    pub fn list(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn contains_text(&self, question: &Question) -> bool {
        self.questions.iter().any(|q| q.same_text(question))
    }

    pub fn flush(&self) -> Result<(), PersistenceError> {
        self.store.flush(&self.questions)
    }

    /// Saves `question` unless one with the same text is already there.
    pub fn add(&mut self, question: Question) -> Result<bool, PersistenceError> {
        if self.contains_text(&question) {
            return Ok(false);
        }
        self.questions.push(question);
        self.flush()?;
        Ok(true)
    }

    /// Unsaves every question with the same text, or saves it when none exists.
    pub fn toggle(&mut self, question: &Question) -> Result<Toggle, PersistenceError> {
        if !self.contains_text(question) {
            self.add(question.clone())?;
            return Ok(Toggle::Saved);
        }
        self.questions.retain(|q| !q.same_text(question));
        self.flush()?;
        Ok(Toggle::Removed)
    }

    pub fn remove_by_id(&mut self, id: &str) -> Result<bool, PersistenceError> {
        let before = self.questions.len();
        self.questions.retain(|q| q.id != id);
        if self.questions.len() == before {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    /// Up to `n` questions drawn without replacement, `None` when the bank is empty.
    pub fn sample(&self, n: usize) -> Option<Vec<Question>> {
        self.sample_with(n, &mut rand::thread_rng())
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Option<Vec<Question>> {
        if self.is_empty() {
            return None;
        }
        Some(self.questions.choose_multiple(rng, n).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::tests::{question, questions};
    use crate::store::temp_path;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn bank_with(n: usize) -> QuestionBank {
        let mut bank = QuestionBank::open(temp_path("bank")).unwrap();
        for q in questions(n) {
            bank.add(q).unwrap();
        }
        bank
    }

    #[test]
    fn empty_bank_has_no_sample() {
        let bank = QuestionBank::open(temp_path("empty")).unwrap();
        assert!(bank.sample(10).is_none());
    }

    #[test]
    fn sample_returns_everything_when_short() {
        let bank = bank_with(3);
        let sample = bank.sample(10).unwrap();
        assert_eq!(sample.len(), 3);
        let ids: HashSet<_> = sample.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn sample_has_no_duplicates() {
        let bank = bank_with(20);
        let mut rng = StdRng::seed_from_u64(7);
        let sample = bank.sample_with(5, &mut rng).unwrap();
        assert_eq!(sample.len(), 5);
        let ids: HashSet<_> = sample.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn toggle_matches_on_text_not_id() {
        let mut bank = bank_with(0);
        let saved = question("first-id", "Quem batizou Jesus?", 0);
        assert_eq!(bank.toggle(&saved).unwrap(), Toggle::Saved);

        let regenerated = question("other-id", "Quem batizou Jesus?", 2);
        assert!(bank.contains_text(&regenerated));
        assert_eq!(bank.toggle(&regenerated).unwrap(), Toggle::Removed);
        assert!(bank.is_empty());
    }

    #[test]
    fn add_is_idempotent_by_text() {
        let mut bank = bank_with(0);
        assert!(bank.add(question("a", "Quantos apóstolos?", 0)).unwrap());
        assert!(!bank.add(question("b", "Quantos apóstolos?", 1)).unwrap());
        assert_eq!(bank.len(), 1);
    }

    #[test]
    fn remove_by_id() {
        let mut bank = bank_with(3);
        assert!(bank.remove_by_id("q-1").unwrap());
        assert!(!bank.remove_by_id("q-1").unwrap());
        assert_eq!(bank.len(), 2);
        assert!(bank.list().iter().all(|q| q.id != "q-1"));
    }

    #[test]
    fn mutations_are_written_through() {
        let path = temp_path("durable");
        {
            let mut bank = QuestionBank::open(&path).unwrap();
            bank.toggle(&question("x", "Qual o primeiro livro da Bíblia?", 0)).unwrap();
            bank.toggle(&question("y", "Quem escreveu o Apocalipse?", 3)).unwrap();
            bank.remove_by_id("x").unwrap();
        }
        let reopened = QuestionBank::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.list()[0].id, "y");
        assert_eq!(reopened.list()[0].correct_option_index, 3);
    }
}
