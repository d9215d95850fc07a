use std::path::PathBuf;

use super::{JsonStore, PersistenceError};
use crate::quiz::QuizConfig;

pub const MAX_ENTRIES: usize = 50;
pub const MAX_REGIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub region: String,
    pub score: u32,
    pub date: String,
    pub difficulty: String,
}

impl LeaderboardEntry {
    pub fn new(name: String, group: Option<String>, region: String, score: u32, config: &QuizConfig) -> Self {
        Self {
            name,
            group: group.filter(|g| !g.trim().is_empty()),
            region,
            score,
            date: chrono::Local::now().format("%d/%m/%Y").to_string(),
            difficulty: config.difficulty.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Stored, with its 1-based position.
    Ranked(usize),
    /// Stored and immediately truncated away.
    OutOfTop,
    /// Saved-pool practice is never ranked.
    PracticeRejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionScore {
    pub region: String,
    pub score: u64,
}

/// Top scores, kept sorted by score descending and bounded to [`MAX_ENTRIES`].
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
    store: JsonStore<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let store = JsonStore::new(path);
        let mut entries: Vec<LeaderboardEntry> = store.load()?;
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_ENTRIES);
        log::info!(
            "Loaded {} leaderboard entries from {}",
            entries.len(),
            store.path().display()
        );
        Ok(Self { entries, store })
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn flush(&self) -> Result<(), PersistenceError> {
        self.store.flush(&self.entries)
    }

    pub fn record(
        &mut self,
        entry: LeaderboardEntry,
        config: &QuizConfig,
    ) -> Result<RecordOutcome, PersistenceError> {
        if config.topic.is_saved_pool() {
            return Ok(RecordOutcome::PracticeRejected);
        }

        let score = entry.score;
        self.entries.push(entry);
        // Stable: equal scores keep insertion order, so the new entry is last among its ties.
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        let position = self.entries.iter().filter(|e| e.score >= score).count();
        self.entries.truncate(MAX_ENTRIES);
        self.flush()?;

        Ok(if position <= MAX_ENTRIES {
            RecordOutcome::Ranked(position)
        } else {
            RecordOutcome::OutOfTop
        })
    }

    /// Summed scores per region, best [`MAX_REGIONS`] first. Ties keep first appearance order.
    pub fn aggregate_by_region(&self) -> Vec<RegionScore> {
        let mut regions: Vec<RegionScore> = Vec::new();
        for entry in &self.entries {
            let region = entry.region.trim();
            match regions.iter_mut().find(|r| r.region == region) {
                Some(r) => r.score += entry.score as u64,
                None => regions.push(RegionScore {
                    region: region.to_string(),
                    score: entry.score as u64,
                }),
            }
        }
        regions.sort_by(|a, b| b.score.cmp(&a.score));
        regions.truncate(MAX_REGIONS);
        regions
    }
}
