//! Outcome history for the current page session
//!
//! Kept in memory only; the menu reads it to show whether the minigame has
//! been passed.

use serde::{Deserialize, Serialize};

use crate::sim::Outcome;

/// Maximum number of outcomes to keep
pub const MAX_ENTRIES: usize = 64;

/// A single reported outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    pub outcome: Outcome,
    /// Seconds from start to the finish line, for passes
    pub completion_time: Option<f32>,
    /// Timestamp (ms) when reported
    pub timestamp: f64,
}

/// What the menu shows for the minigame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameStatus {
    #[default]
    NotPlayed,
    /// Opened but left without a result
    Attempted,
    Failed,
    Passed,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::NotPlayed => "Not played",
            GameStatus::Attempted => "Attempted",
            GameStatus::Failed => "Failed",
            GameStatus::Passed => "Passed",
        }
    }
}

/// Reported outcomes, oldest first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutcomeRecord {
    pub entries: Vec<OutcomeEntry>,
}

impl OutcomeRecord {
    /// Create empty record
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an outcome, dropping the oldest past the cap
    pub fn add(&mut self, outcome: Outcome, completion_time: Option<f32>, timestamp: f64) {
        self.entries.push(OutcomeEntry {
            outcome,
            completion_time,
            timestamp,
        });
        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(..excess);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sessions played, however they ended
    pub fn attempts(&self) -> usize {
        self.entries.len()
    }

    /// Fastest recorded pass
    pub fn best_time(&self) -> Option<f32> {
        self.entries
            .iter()
            .filter(|e| e.outcome == Outcome::Passed)
            .filter_map(|e| e.completion_time)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    pub fn last(&self) -> Option<Outcome> {
        self.entries.last().map(|e| e.outcome)
    }

    /// A pass is permanent; otherwise the worst thing that happened shows
    pub fn status(&self) -> GameStatus {
        if self.count(Outcome::Passed) > 0 {
            GameStatus::Passed
        } else if self.count(Outcome::Failed) > 0 {
            GameStatus::Failed
        } else if self.is_empty() {
            GameStatus::NotPlayed
        } else {
            GameStatus::Attempted
        }
    }
}
