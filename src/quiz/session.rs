use crate::quiz::{Question, QuizConfig, OPTION_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    InProgress,
    /// `game_over` is set only when the lives ran out.
    Finished { game_over: bool },
}

/// Run state of one quiz.
///
/// The question list is fixed once the session starts. Every answer slot is
/// written at most once and is kept while navigating back and forth, so a
/// revisited question shows exactly what was answered before.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizSession {
    questions: Vec<Question>,
    current: usize,
    score: u32,
    lives: u32,
    answers: Vec<Option<u8>>,
    phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect { game_over: bool },
    /// The question was already answered, first answer wins.
    AlreadyAnswered,
    /// Wrong index, unknown option or the session is over.
    Rejected,
}

impl AnswerOutcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerOutcome::Correct)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved(usize),
    Stayed,
    Finished,
}

/// What a question looks like when it is shown again.
#[derive(Debug, Clone, Copy)]
pub struct Review<'a> {
    pub index: usize,
    pub question: &'a Question,
    pub chosen: Option<usize>,
}

impl Review<'_> {
    pub fn is_correct(&self) -> Option<bool> {
        self.chosen.map(|c| self.question.is_correct(c))
    }
}

impl QuizSession {
    /// Starts a session, `None` when there is nothing to ask.
    pub fn start(questions: Vec<Question>, lives: u32) -> Option<Self> {
        if questions.is_empty() {
            return None;
        }
        let answers = vec![None; questions.len()];
        Some(Self {
            questions,
            current: 0,
            score: 0,
            lives,
            answers,
            phase: Phase::InProgress,
        })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished { .. })
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, Phase::Finished { game_over: true })
    }

    pub fn answer_at(&self, index: usize) -> Option<usize> {
        self.answers.get(index).copied().flatten().map(usize::from)
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    pub fn current_review(&self) -> Review<'_> {
        Review {
            index: self.current,
            question: self.current_question(),
            chosen: self.answer_at(self.current),
        }
    }

    /// Records `choice` for the question at `index`, which must be the current one.
    ///
    /// Score, lives, the answer slot and the game-over transition change together.
    pub fn answer(&mut self, index: usize, choice: usize) -> AnswerOutcome {
        if self.is_finished() || index != self.current || choice >= OPTION_COUNT {
            return AnswerOutcome::Rejected;
        }
        if self.answers[index].is_some() {
            return AnswerOutcome::AlreadyAnswered;
        }

        self.answers[index] = Some(choice as u8);
        if self.questions[index].is_correct(choice) {
            self.score += 1;
            return AnswerOutcome::Correct;
        }

        self.lives = self.lives.saturating_sub(1);
        let game_over = self.lives == 0;
        if game_over {
            self.phase = Phase::Finished { game_over: true };
        }
        AnswerOutcome::Incorrect { game_over }
    }

    pub fn advance(&mut self) -> Step {
        if self.is_finished() {
            return Step::Stayed;
        }
        if self.is_last() {
            self.phase = Phase::Finished { game_over: false };
            return Step::Finished;
        }
        self.current += 1;
        Step::Moved(self.current)
    }

    pub fn retreat(&mut self) -> Step {
        if self.is_finished() || self.current == 0 {
            return Step::Stayed;
        }
        self.current -= 1;
        Step::Moved(self.current)
    }

    pub fn summary(&self, config: &QuizConfig) -> ResultSummary {
        ResultSummary {
            score: self.score,
            total: self.questions.len(),
            config: config.clone(),
            game_over: self.is_game_over(),
            questions: self.questions.clone(),
            answers: self.answers.clone(),
        }
    }
}

/// Per-question interaction before an answer reaches the session.
///
/// With confirmation enabled a pick is first tentative and needs a second
/// action to commit, otherwise the first pick commits right away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Pick {
    #[default]
    Unanswered,
    Tentative(usize),
    Committed(usize),
}

impl Pick {
    /// The pick matching an answer slot, used when a question is (re)displayed.
    pub fn for_slot(answer: Option<usize>) -> Self {
        match answer {
            Some(choice) => Pick::Committed(choice),
            None => Pick::Unanswered,
        }
    }

    /// Returns the new pick and the choice to submit, if any.
    pub fn select(self, choice: usize, confirm_required: bool) -> (Pick, Option<usize>) {
        match self {
            Pick::Committed(_) => (self, None),
            _ if confirm_required => (Pick::Tentative(choice), None),
            _ => (Pick::Committed(choice), Some(choice)),
        }
    }

    pub fn confirm(self) -> (Pick, Option<usize>) {
        match self {
            Pick::Tentative(choice) => (Pick::Committed(choice), Some(choice)),
            other => (other, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResultSummary {
    pub score: u32,
    pub total: usize,
    pub config: QuizConfig,
    pub game_over: bool,
    pub questions: Vec<Question>,
    pub answers: Vec<Option<u8>>,
}

impl ResultSummary {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.score as f64 * 100.0 / self.total as f64
    }

    pub fn is_competitive(&self) -> bool {
        !self.config.topic.is_saved_pool()
    }

    pub fn answer_at(&self, index: usize) -> Option<usize> {
        self.answers.get(index).copied().flatten().map(usize::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::tests::questions;
    use crate::quiz::{Difficulty, Topic, TopicSelection};

    fn wrong_choice(session: &QuizSession) -> usize {
        (session.current_question().correct_option_index as usize + 1) % OPTION_COUNT
    }

    fn right_choice(session: &QuizSession) -> usize {
        session.current_question().correct_option_index as usize
    }

    #[test]
    fn fresh_session() {
        let session = QuizSession::start(questions(5), 3).unwrap();
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.lives(), 3);
        assert_eq!(session.len(), 5);
        assert!((0..5).all(|i| session.answer_at(i).is_none()));
        assert!(!session.is_finished());
    }

    #[test]
    fn empty_question_list_does_not_start() {
        assert!(QuizSession::start(Vec::new(), 3).is_none());
    }

    #[test]
    fn first_answer_wins() {
        let mut once = QuizSession::start(questions(3), 3).unwrap();
        let mut twice = once.clone();
        let wrong = wrong_choice(&once);
        let right = right_choice(&once);

        once.answer(0, wrong);
        twice.answer(0, wrong);
        assert_eq!(twice.answer(0, right), AnswerOutcome::AlreadyAnswered);

        assert_eq!(once, twice);
        assert_eq!(twice.score(), 0);
        assert_eq!(twice.lives(), 2);
        assert_eq!(twice.answer_at(0), Some(wrong));
    }

    #[test]
    fn score_and_lives_move_one_step_per_answer() {
        let mut session = QuizSession::start(questions(4), 3).unwrap();
        let mut last_score = 0;
        let mut last_lives = 3;
        for i in 0..4 {
            let choice = if i % 2 == 0 { right_choice(&session) } else { wrong_choice(&session) };
            let outcome = session.answer(i, choice);
            assert_eq!(outcome.is_correct(), i % 2 == 0);
            assert!(session.score() >= last_score && session.score() <= last_score + 1);
            assert!(session.lives() <= last_lives);
            last_score = session.score();
            last_lives = session.lives();
            session.advance();
        }
        assert_eq!(session.score(), 2);
        assert_eq!(session.lives(), 1);
        assert!(session.is_finished());
        assert!(!session.is_game_over());
    }

    #[test]
    fn last_life_ends_the_game_immediately() {
        let mut session = QuizSession::start(questions(10), 1).unwrap();
        let wrong = wrong_choice(&session);
        assert_eq!(session.answer(0, wrong), AnswerOutcome::Incorrect { game_over: true });
        assert_eq!(session.lives(), 0);
        assert!(session.is_finished());
        assert!(session.is_game_over());

        assert_eq!(session.advance(), Step::Stayed);
        assert_eq!(session.retreat(), Step::Stayed);
        assert_eq!(session.answer(0, 0), AnswerOutcome::Rejected);
    }

    #[test]
    fn answer_must_target_current_question() {
        let mut session = QuizSession::start(questions(3), 3).unwrap();
        assert_eq!(session.answer(1, 0), AnswerOutcome::Rejected);
        assert_eq!(session.answer(0, OPTION_COUNT), AnswerOutcome::Rejected);
        assert!(session.answer_at(1).is_none());
        assert!(session.answer_at(0).is_none());
    }

    #[test]
    fn navigation_bounds() {
        let mut session = QuizSession::start(questions(2), 3).unwrap();
        assert_eq!(session.retreat(), Step::Stayed);
        assert_eq!(session.current_index(), 0);

        assert_eq!(session.advance(), Step::Moved(1));
        assert_eq!(session.advance(), Step::Finished);
        assert_eq!(session.current_index(), 1);
        assert!(session.is_finished() && !session.is_game_over());
    }

    #[test]
    fn unanswered_questions_can_be_skipped() {
        let mut session = QuizSession::start(questions(2), 3).unwrap();
        session.advance();
        assert_eq!(session.advance(), Step::Finished);
        assert_eq!(session.score(), 0);
        assert_eq!(session.lives(), 3);
    }

    #[test]
    fn history_is_kept_across_navigation() {
        let mut session = QuizSession::start(questions(3), 3).unwrap();
        let wrong = wrong_choice(&session);
        session.answer(0, wrong);
        session.advance();
        session.retreat();

        let review = session.current_review();
        assert_eq!(review.index, 0);
        assert_eq!(review.chosen, Some(wrong));
        assert_eq!(review.is_correct(), Some(false));
        assert_eq!(Pick::for_slot(review.chosen), Pick::Committed(wrong));
        assert_eq!(session.answer(0, right_choice(&session)), AnswerOutcome::AlreadyAnswered);
    }

    #[test]
    fn pick_without_confirmation_commits() {
        let (pick, submit) = Pick::Unanswered.select(2, false);
        assert_eq!(pick, Pick::Committed(2));
        assert_eq!(submit, Some(2));
    }

    #[test]
    fn pick_with_confirmation_waits() {
        let (pick, submit) = Pick::Unanswered.select(2, true);
        assert_eq!(pick, Pick::Tentative(2));
        assert_eq!(submit, None);

        let (pick, submit) = pick.select(3, true);
        assert_eq!(pick, Pick::Tentative(3));
        assert_eq!(submit, None);

        let (pick, submit) = pick.confirm();
        assert_eq!(pick, Pick::Committed(3));
        assert_eq!(submit, Some(3));

        assert_eq!(pick.select(0, true), (Pick::Committed(3), None));
        assert_eq!(pick.confirm(), (Pick::Committed(3), None));
        assert_eq!(Pick::Unanswered.confirm(), (Pick::Unanswered, None));
    }

    #[test]
    fn summary_reflects_session() {
        let config = QuizConfig {
            topic: TopicSelection::Category(Topic::Bible),
            difficulty: Difficulty::Beginner,
            question_count: 4,
            lives: 3,
            avoid_repeats: false,
            confirm_answer: false,
        };
        let mut session = QuizSession::start(questions(4), 3).unwrap();
        session.answer(0, right_choice(&session));
        let summary = session.summary(&config);
        assert_eq!(summary.score, 1);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.percentage(), 25.0);
        assert!(!summary.game_over);
        assert!(summary.is_competitive());
        assert_eq!(summary.answer_at(0), Some(right_choice(&session)));
        assert_eq!(summary.questions.len(), 4);
    }
}
