use crate::{Card, CoreError};
use async_trait::async_trait;
use parking_lot::RwLock;

/// Volatile repository. `fail_saves` makes every save fail, which lets
/// callers exercise the unsaved-changes path.
#[derive(Default)]
pub struct MemoryRepo {
    cards: RwLock<Vec<Card>>,
    fail_saves: RwLock<bool>,
    saves: RwLock<usize>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        Self {
            cards: RwLock::new(cards),
            ..Self::default()
        }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.write() = fail;
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        *self.saves.read()
    }

    pub fn snapshot(&self) -> Vec<Card> {
        self.cards.read().clone()
    }
}

#[async_trait]
impl crate::repo::Repository for MemoryRepo {
    async fn load(&self) -> Result<Vec<Card>, CoreError> {
        Ok(self.cards.read().clone())
    }

    async fn save(&self, cards: &[Card]) -> Result<(), CoreError> {
        if *self.fail_saves.read() {
            return Err(CoreError::Storage("memory save disabled"));
        }
        *self.cards.write() = cards.to_vec();
        *self.saves.write() += 1;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
