use crate::{Card, Difficulty};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DifficultyCounts {
    pub hard: usize,
    pub medium: usize,
    pub easy: usize,
}

impl DifficultyCounts {
    pub fn record(&mut self, d: Difficulty) {
        match d {
            Difficulty::Hard => self.hard += 1,
            Difficulty::Medium => self.medium += 1,
            Difficulty::Easy => self.easy += 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub due: usize,
    pub mastered: usize,
    pub by_difficulty: DifficultyCounts,
}

pub fn summarize(cards: &[Card], now: DateTime<Utc>) -> Stats {
    let mut stats = Stats {
        total: cards.len(),
        ..Stats::default()
    };
    for c in cards {
        if c.is_due(now) {
            stats.due += 1;
        }
        if c.is_mastered() {
            stats.mastered += 1;
        }
        stats.by_difficulty.record(c.difficulty);
    }
    stats
}
