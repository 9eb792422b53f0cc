use crate::{
    scheduler::apply_quality, stats, Card, CardId, CoreError, Quality, RawCard, Stats, StudyQueue,
};
use chrono::{DateTime, Utc};

/// Ordered card list owned by the caller. Order is insertion order; study
/// priority is computed per queue and never stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    cards: Vec<Card>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts loaded cards, re-deriving each card's difficulty and clamping
    /// out-of-range ease factors.
    pub fn from_cards(mut cards: Vec<Card>) -> Self {
        for c in &mut cards {
            c.clamp_ease();
            c.refresh_difficulty();
        }
        Self { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn into_cards(self) -> Vec<Card> {
        self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    fn index_of(&self, id: CardId) -> Result<usize, CoreError> {
        self.cards
            .iter()
            .position(|c| c.id == id)
            .ok_or(CoreError::NotFound("card"))
    }

    /// Appends a batch of new cards and returns them.
    ///
    /// Every pair must have a non-blank question and answer; one bad pair
    /// rejects the whole batch and leaves the collection unchanged.
    pub fn create(&mut self, batch: Vec<RawCard>, now: DateTime<Utc>) -> Result<&[Card], CoreError> {
        let normalized = batch
            .iter()
            .map(|raw| raw.normalized().ok_or(CoreError::Invalid("question and answer must not be empty")))
            .collect::<Result<Vec<_>, _>>()?;
        let start = self.cards.len();
        self.cards
            .extend(normalized.into_iter().map(|raw| Card::from_raw(raw, now)));
        Ok(&self.cards[start..])
    }

    pub fn add(&mut self, question: &str, answer: &str, now: DateTime<Utc>) -> Result<&Card, CoreError> {
        let created = self.create(vec![RawCard::new(question, answer)], now)?;
        Ok(&created[0])
    }

    pub fn rate(&mut self, id: CardId, quality: Quality, now: DateTime<Utc>) -> Result<&Card, CoreError> {
        let idx = self.index_of(id)?;
        let updated = apply_quality(self.cards[idx].clone(), quality, now);
        self.cards[idx] = updated;
        Ok(&self.cards[idx])
    }

    pub fn reset(&mut self, id: CardId, now: DateTime<Utc>) -> Result<&Card, CoreError> {
        let idx = self.index_of(id)?;
        self.cards[idx].reset_schedule(now);
        Ok(&self.cards[idx])
    }

    /// Replaces question and answer; the schedule is untouched.
    pub fn edit(&mut self, id: CardId, question: &str, answer: &str) -> Result<&Card, CoreError> {
        let idx = self.index_of(id)?;
        let raw = RawCard::new(question, answer)
            .normalized()
            .ok_or(CoreError::Invalid("question and answer must not be empty"))?;
        let card = &mut self.cards[idx];
        card.question = raw.question;
        card.answer = raw.answer;
        Ok(card)
    }

    pub fn delete(&mut self, id: CardId) -> Result<Card, CoreError> {
        let idx = self.index_of(id)?;
        Ok(self.cards.remove(idx))
    }

    /// Appends already-scheduled cards, e.g. from an export file.
    ///
    /// Cards whose id is already present or with a blank side are skipped.
    /// Text is trimmed, the ease factor clamped and difficulty re-derived.
    /// Returns how many were added.
    pub fn import(&mut self, cards: Vec<Card>) -> usize {
        let before = self.cards.len();
        for mut card in cards {
            if self.get(card.id).is_some() {
                continue;
            }
            let Some(raw) = RawCard::new(card.question.as_str(), card.answer.as_str()).normalized() else {
                continue;
            };
            card.question = raw.question;
            card.answer = raw.answer;
            card.clamp_ease();
            card.refresh_difficulty();
            self.cards.push(card);
        }
        self.cards.len() - before
    }

    /// Swaps in a full card list, e.g. a remote snapshot.
    pub fn replace_all(&mut self, cards: Vec<Card>) {
        *self = Self::from_cards(cards);
    }

    pub fn stats(&self, now: DateTime<Utc>) -> Stats {
        stats::summarize(&self.cards, now)
    }

    pub fn study_queue(&self, now: DateTime<Utc>) -> StudyQueue {
        StudyQueue::build(&self.cards, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Difficulty, EASE_DEFAULT, EASE_MIN};

    #[test]
    fn create_appends_in_order_with_defaults() {
        let now = Utc::now();
        let mut col = Collection::new();
        col.add("first", "1", now).unwrap();
        let created = col
            .create(vec![RawCard::new("second", "2"), RawCard::new("third", "3")], now)
            .unwrap();
        assert_eq!(created.len(), 2);

        let questions: Vec<_> = col.cards().iter().map(|c| c.question.as_str()).collect();
        assert_eq!(questions, ["first", "second", "third"]);
        for c in col.cards() {
            assert_eq!(c.ease_factor, EASE_DEFAULT);
            assert_eq!((c.interval, c.repetitions, c.mistakes), (0, 0, 0));
            assert_eq!(c.next_review, now);
            assert_eq!(c.difficulty, Difficulty::Easy);
        }
    }

    #[test]
    fn blank_pair_rejects_whole_batch() {
        let now = Utc::now();
        let mut col = Collection::new();
        col.add("kept", "yes", now).unwrap();
        let before = col.clone();

        let err = col
            .create(vec![RawCard::new("ok", "fine"), RawCard::new("   ", "answer")], now)
            .unwrap_err();
        assert!(matches!(err, CoreError::Invalid(_)));
        assert_eq!(col, before);
    }

    #[test]
    fn create_stores_trimmed_text() {
        let now = Utc::now();
        let mut col = Collection::new();
        let card = col.add("  What is 2+2? ", "\t4\n", now).unwrap();
        assert_eq!(card.question, "What is 2+2?");
        assert_eq!(card.answer, "4");
    }

    #[test]
    fn edit_changes_content_only() {
        let now = Utc::now();
        let mut col = Collection::new();
        let id = col.add("q", "a", now).unwrap().id;
        col.rate(id, Quality::GOOD, now).unwrap();
        let scheduled = col.get(id).unwrap().clone();

        let edited = col.edit(id, " new q ", "new a").unwrap();
        assert_eq!(edited.question, "new q");
        assert_eq!(edited.answer, "new a");
        assert_eq!(edited.interval, scheduled.interval);
        assert_eq!(edited.repetitions, scheduled.repetitions);
        assert_eq!(edited.ease_factor, scheduled.ease_factor);
        assert_eq!(edited.next_review, scheduled.next_review);
    }

    #[test]
    fn edit_with_blank_side_is_rejected_without_mutation() {
        let now = Utc::now();
        let mut col = Collection::new();
        let id = col.add("q", "a", now).unwrap().id;
        let before = col.clone();

        assert_eq!(col.edit(id, "new", "  ").unwrap_err(), CoreError::Invalid("question and answer must not be empty"));
        assert!(matches!(col.edit(id, "", "new"), Err(CoreError::Invalid(_))));
        assert_eq!(col, before);
    }

    #[test]
    fn reset_restores_defaults_and_keeps_content() {
        let now = Utc::now();
        let mut col = Collection::new();
        let id = col.add("q", "a", now).unwrap().id;
        for _ in 0..3 {
            col.rate(id, Quality::EASY, now).unwrap();
        }
        for _ in 0..5 {
            col.rate(id, Quality::HARD, now).unwrap();
        }

        let later = now + chrono::Duration::days(3);
        let card = col.reset(id, later).unwrap();
        assert_eq!(card.question, "q");
        assert_eq!(card.answer, "a");
        assert_eq!(card.ease_factor, EASE_DEFAULT);
        assert_eq!((card.interval, card.repetitions, card.mistakes), (0, 0, 0));
        assert_eq!(card.next_review, later);
        assert_eq!(card.difficulty, Difficulty::Easy);
    }

    #[test]
    fn delete_removes_by_identity() {
        let now = Utc::now();
        let mut col = Collection::new();
        let a = col.add("same", "same", now).unwrap().id;
        let b = col.add("same", "same", now).unwrap().id;

        let removed = col.delete(a).unwrap();
        assert_eq!(removed.id, a);
        assert_eq!(col.len(), 1);
        assert_eq!(col.cards()[0].id, b);
        assert_eq!(col.delete(a).unwrap_err(), CoreError::NotFound("card"));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let now = Utc::now();
        let mut col = Collection::new();
        let ghost = uuid::Uuid::new_v4();
        assert!(matches!(col.rate(ghost, Quality::GOOD, now), Err(CoreError::NotFound(_))));
        assert!(matches!(col.reset(ghost, now), Err(CoreError::NotFound(_))));
        assert!(matches!(col.edit(ghost, "q", "a"), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn import_skips_known_ids_and_blank_cards() {
        let now = Utc::now();
        let mut col = Collection::new();
        let existing = col.add("q", "a", now).unwrap().clone();

        let mut scheduled = Card::new(" imported ", "card ", now);
        scheduled.repetitions = 7;
        scheduled.interval = 30;
        let blank = Card::new("  ", "x", now);

        let added = col.import(vec![existing.clone(), scheduled.clone(), blank]);
        assert_eq!(added, 1);
        assert_eq!(col.len(), 2);
        let imported = col.get(scheduled.id).unwrap();
        assert_eq!(imported.question, "imported");
        assert_eq!(imported.interval, 30);
        assert_eq!(imported.difficulty, Difficulty::Easy);
    }

    #[test]
    fn from_cards_rederives_difficulty() {
        let now = Utc::now();
        let mut drifted = Card::new("q", "a", now);
        drifted.mistakes = 5;
        drifted.difficulty = Difficulty::Easy;
        let col = Collection::from_cards(vec![drifted]);
        assert_eq!(col.cards()[0].difficulty, Difficulty::Hard);
    }

    #[test]
    fn import_clamps_out_of_range_ease() {
        let now = Utc::now();
        let mut low = Card::new("low", "a", now);
        low.ease_factor = 0.5;
        let mut nan = Card::new("nan", "a", now);
        nan.ease_factor = f64::NAN;
        let mut inf = Card::new("inf", "a", now);
        inf.ease_factor = f64::INFINITY;
        let mut high = Card::new("high", "a", now);
        high.ease_factor = 3.7;

        let mut col = Collection::new();
        assert_eq!(col.import(vec![low, nan, inf, high]), 4);
        let eases: Vec<f64> = col.cards().iter().map(|c| c.ease_factor).collect();
        assert_eq!(eases, [EASE_MIN, EASE_DEFAULT, EASE_DEFAULT, 3.7]);
        assert!(serde_json::to_string(col.cards()).unwrap().contains("\"easeFactor\":2.5"));
    }

    #[test]
    fn from_cards_clamps_out_of_range_ease() {
        let now = Utc::now();
        let mut low = Card::new("q", "a", now);
        low.ease_factor = -1.0;
        let mut nan = Card::new("q", "a", now);
        nan.ease_factor = f64::NAN;
        let col = Collection::from_cards(vec![low, nan]);
        assert_eq!(col.cards()[0].ease_factor, EASE_MIN);
        assert_eq!(col.cards()[1].ease_factor, EASE_DEFAULT);
    }
}
