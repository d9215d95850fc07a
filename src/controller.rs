use tokio::sync::Mutex;

use crate::quiz::ai_helper::{GenerationRequest, ProviderFailure, QuestionProvider};
use crate::quiz::session::{QuizSession, ResultSummary};
use crate::quiz::{Question, QuestionError, QuizConfig, TopicSelection};
use crate::store::{
    Leaderboard, LeaderboardEntry, PersistenceError, QuestionBank, RecordOutcome, RegionScore, Toggle,
};

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("there are no saved questions to play with")]
    EmptySource,
    #[error("invalid quiz configuration: {0}")]
    InvalidConfig(#[from] QuestionError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// A session ready to be played. `warning` is set when the provider fell back.
#[derive(Debug)]
pub struct StartedSession {
    pub session: QuizSession,
    pub warning: Option<ProviderFailure>,
}

/// Identifying details a player gives before a score is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerDetails {
    pub name: String,
    pub group: Option<String>,
    pub region: String,
}

/// Owns the stores and the question provider, and builds sessions from configurations.
pub struct SessionController<P> {
    provider: P,
    bank: Mutex<QuestionBank>,
    leaderboard: Mutex<Leaderboard>,
}

impl<P: QuestionProvider> SessionController<P> {
    pub fn new(provider: P, bank: QuestionBank, leaderboard: Leaderboard) -> Self {
        Self {
            provider,
            bank: Mutex::new(bank),
            leaderboard: Mutex::new(leaderboard),
        }
    }

    pub async fn start(&self, config: &QuizConfig) -> Result<StartedSession, ControllerError> {
        config.validate()?;

        let (questions, warning) = match config.topic {
            TopicSelection::SavedPool => {
                let sample = self.bank.lock().await.sample(config.question_count);
                (sample.ok_or(ControllerError::EmptySource)?, None)
            }
            TopicSelection::Category(topic) => {
                let generation = self
                    .provider
                    .generate(GenerationRequest {
                        topic,
                        difficulty: config.difficulty,
                        count: config.question_count,
                        avoid_repeats: config.avoid_repeats,
                    })
                    .await;
                (generation.questions, generation.failure)
            }
        };

        let session = QuizSession::start(questions, config.lives).ok_or(ControllerError::EmptySource)?;
        log::info!(
            "Started {} quiz with {} questions ({} lives)",
            config.topic.label(),
            session.len(),
            config.lives
        );
        Ok(StartedSession { session, warning })
    }

    pub fn finish(&self, session: &QuizSession, config: &QuizConfig) -> ResultSummary {
        let summary = session.summary(config);
        log::info!(
            "Quiz finished: {}/{} (game over: {})",
            summary.score,
            summary.total,
            summary.game_over
        );
        summary
    }

    /// Offers a finished quiz to the leaderboard. Practice quizzes never reach it.
    pub async fn submit_score(
        &self,
        summary: &ResultSummary,
        details: PlayerDetails,
    ) -> Result<RecordOutcome, ControllerError> {
        if !summary.is_competitive() {
            return Ok(RecordOutcome::PracticeRejected);
        }
        let entry = LeaderboardEntry::new(
            details.name,
            details.group,
            details.region,
            summary.score,
            &summary.config,
        );
        let outcome = self.leaderboard.lock().await.record(entry, &summary.config)?;
        log::info!("Recorded score {}: {:?}", summary.score, outcome);
        Ok(outcome)
    }

    pub async fn toggle_saved(&self, question: &Question) -> Result<Toggle, PersistenceError> {
        self.bank.lock().await.toggle(question)
    }

    pub async fn is_saved(&self, question: &Question) -> bool {
        self.bank.lock().await.contains_text(question)
    }

    pub async fn delete_saved(&self, id: &str) -> Result<bool, PersistenceError> {
        self.bank.lock().await.remove_by_id(id)
    }

    pub async fn saved_questions(&self) -> Vec<Question> {
        self.bank.lock().await.list().to_vec()
    }

    pub async fn top_entries(&self) -> Vec<LeaderboardEntry> {
        self.leaderboard.lock().await.entries().to_vec()
    }

    pub async fn region_ranking(&self) -> Vec<RegionScore> {
        self.leaderboard.lock().await.aggregate_by_region()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::quiz::ai_helper::Generation;
    use crate::quiz::tests::questions;
    use crate::quiz::{Difficulty, Topic};
    use crate::store::temp_path;

    /// Hands out a fixed number of questions, or the fallback when `fail` is set.
    pub(crate) struct FakeProvider {
        pub count: usize,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl FakeProvider {
        pub(crate) fn returning(count: usize) -> Self {
            Self { count, fail: false, calls: AtomicUsize::new(0) }
        }
    }

    impl QuestionProvider for FakeProvider {
        fn generate(&self, request: GenerationRequest) -> impl Future<Output = Generation> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let generation = if self.fail {
                Generation::fallback(ProviderFailure::EmptyReply)
            } else {
                Generation::generated(questions(self.count.min(request.count)))
            };
            async move { generation }
        }
    }

    fn controller(provider: FakeProvider) -> SessionController<FakeProvider> {
        SessionController::new(
            provider,
            QuestionBank::open(temp_path("ctl_bank")).unwrap(),
            Leaderboard::open(temp_path("ctl_board")).unwrap(),
        )
    }

    fn bible_config() -> QuizConfig {
        QuizConfig {
            topic: TopicSelection::Category(Topic::Bible),
            difficulty: Difficulty::Beginner,
            question_count: 5,
            lives: 3,
            avoid_repeats: false,
            confirm_answer: false,
        }
    }

    fn details() -> PlayerDetails {
        PlayerDetails {
            name: "Ana".to_string(),
            group: Some("Crisma 2026".to_string()),
            region: "Sul".to_string(),
        }
    }

    #[tokio::test]
    async fn provider_quiz_starts_fresh() {
        let controller = controller(FakeProvider::returning(5));
        let started = controller.start(&bible_config()).await.unwrap();
        assert!(started.warning.is_none());
        let session = started.session;
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.lives(), 3);
        assert_eq!(session.len(), 5);
        assert!((0..5).all(|i| session.answer_at(i).is_none()));
    }

    #[tokio::test]
    async fn fallback_is_playable_but_warned() {
        let mut provider = FakeProvider::returning(5);
        provider.fail = true;
        let controller = controller(provider);
        let started = controller.start(&bible_config()).await.unwrap();
        assert!(started.warning.is_some());
        assert_eq!(started.session.len(), 1);
    }

    #[tokio::test]
    async fn empty_provider_result_is_an_error() {
        let controller = controller(FakeProvider::returning(0));
        assert!(matches!(
            controller.start(&bible_config()).await,
            Err(ControllerError::EmptySource)
        ));
    }

    #[tokio::test]
    async fn empty_saved_pool_is_refused() {
        let controller = controller(FakeProvider::returning(5));
        let result = controller.start(&QuizConfig::saved_pool()).await;
        assert!(matches!(result, Err(ControllerError::EmptySource)));
        assert_eq!(controller.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn saved_pool_samples_the_bank() {
        let controller = controller(FakeProvider::returning(5));
        for q in questions(3) {
            controller.toggle_saved(&q).await.unwrap();
        }
        let started = controller.start(&QuizConfig::saved_pool()).await.unwrap();
        assert_eq!(started.session.len(), 3);
        assert_eq!(controller.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_config_is_refused() {
        let controller = controller(FakeProvider::returning(5));
        let mut config = bible_config();
        config.lives = 0;
        assert!(matches!(
            controller.start(&config).await,
            Err(ControllerError::InvalidConfig(_))
        ));
        assert_eq!(controller.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn playing_again_requests_new_questions() {
        let controller = controller(FakeProvider::returning(5));
        controller.start(&bible_config()).await.unwrap();
        controller.start(&bible_config()).await.unwrap();
        assert_eq!(controller.provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn practice_scores_never_reach_the_leaderboard() {
        let controller = controller(FakeProvider::returning(5));
        for q in questions(4) {
            controller.toggle_saved(&q).await.unwrap();
        }
        let config = QuizConfig::saved_pool();
        let mut session = controller.start(&config).await.unwrap().session;
        let choice = session.current_question().correct_option_index as usize;
        session.answer(0, choice);
        let summary = controller.finish(&session, &config);

        let outcome = controller.submit_score(&summary, details()).await.unwrap();
        assert_eq!(outcome, RecordOutcome::PracticeRejected);
        assert!(controller.top_entries().await.is_empty());
    }

    #[tokio::test]
    async fn competitive_scores_are_ranked() {
        let controller = controller(FakeProvider::returning(5));
        let config = bible_config();
        let mut session = controller.start(&config).await.unwrap().session;
        let choice = session.current_question().correct_option_index as usize;
        session.answer(0, choice);
        let summary = controller.finish(&session, &config);

        let outcome = controller.submit_score(&summary, details()).await.unwrap();
        assert_eq!(outcome, RecordOutcome::Ranked(1));
        let entries = controller.top_entries().await;
        assert_eq!(entries[0].score, 1);
        assert_eq!(entries[0].group.as_deref(), Some("Crisma 2026"));
        assert_eq!(entries[0].difficulty, "Iniciante");
        assert_eq!(controller.region_ranking().await[0].score, 1);
    }

    #[tokio::test]
    async fn saving_toggles_by_text() {
        let controller = controller(FakeProvider::returning(5));
        let q = &questions(1)[0];
        assert_eq!(controller.toggle_saved(q).await.unwrap(), Toggle::Saved);
        assert!(controller.is_saved(q).await);
        let mut twin = q.clone();
        twin.id = "different".to_string();
        assert_eq!(controller.toggle_saved(&twin).await.unwrap(), Toggle::Removed);
        assert!(controller.saved_questions().await.is_empty());
        assert!(!controller.delete_saved("different").await.unwrap());
    }
}
