use crate::{Card, CoreError};
use async_trait::async_trait;

pub mod fallback;
pub mod memory;

/// Persistence collaborator. Implementations store the whole ordered card
/// list; `save` always receives the full collection.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn load(&self) -> Result<Vec<Card>, CoreError>;
    async fn save(&self, cards: &[Card]) -> Result<(), CoreError>;

    /// Short backend name for logs.
    fn kind(&self) -> &'static str;
}
