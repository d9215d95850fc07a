mod json_store;
pub mod leaderboard;
pub mod question_bank;

pub(crate) use json_store::JsonStore;

pub use leaderboard::{Leaderboard, LeaderboardEntry, RecordOutcome, RegionScore};
pub use question_bank::{QuestionBank, Toggle};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub const SAVED_QUESTIONS_FILE: &str = "catholic_quiz_saved_questions.json";
pub const LEADERBOARD_FILE: &str = "catholic_quiz_leaderboard.json";

#[cfg(test)]
pub(crate) fn temp_path(name: &str) -> std::path::PathBuf {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!(
        "catechism_quiz_test_{}_{}_{}.json",
        std::process::id(),
        id,
        name
    ));
    let _ = std::fs::remove_file(&path);
    path
}
