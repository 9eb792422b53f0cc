use crate::{Card, CardId};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Cards with `next_review <= now`, in collection order.
pub fn filter_due(cards: &[Card], now: DateTime<Utc>) -> Vec<&Card> {
    cards.iter().filter(|c| c.is_due(now)).collect()
}

pub fn filter_by_text<'a>(cards: &'a [Card], query: &str) -> Vec<&'a Card> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return cards.iter().collect();
    }
    cards
        .iter()
        .filter(|c| c.question.to_lowercase().contains(&q) || c.answer.to_lowercase().contains(&q))
        .collect()
}

/// Due cards, hardest first. `sort_by_key` is stable, so cards of equal
/// difficulty keep their collection order.
pub fn due_in_study_order(cards: &[Card], now: DateTime<Utc>) -> Vec<&Card> {
    let mut due = filter_due(cards, now);
    due.sort_by_key(|c| c.difficulty.rank());
    due
}

/// One study session's worth of card ids, consumed front to back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StudyQueue {
    ids: VecDeque<CardId>,
    total: usize,
}

impl StudyQueue {
    pub fn build(cards: &[Card], now: DateTime<Utc>) -> Self {
        let ids: VecDeque<CardId> = due_in_study_order(cards, now).into_iter().map(|c| c.id).collect();
        let total = ids.len();
        Self { ids, total }
    }

    /// Caps the session at `max` cards, dropping from the back.
    pub fn truncate(&mut self, max: usize) {
        self.ids.truncate(max);
        self.total = self.ids.len();
    }

    pub fn peek(&self) -> Option<CardId> {
        self.ids.front().copied()
    }

    pub fn remaining(&self) -> usize {
        self.ids.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// 1-based position of the card `peek` returns.
    pub fn position(&self) -> usize {
        self.total - self.ids.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &CardId> {
        self.ids.iter()
    }
}

impl Iterator for StudyQueue {
    type Item = CardId;

    fn next(&mut self) -> Option<CardId> {
        self.ids.pop_front()
    }
}
