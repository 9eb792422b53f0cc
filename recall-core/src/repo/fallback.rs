use crate::{Card, CoreError, Repository};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Shared store with a local copy for failed writes.
///
/// Loads come from `primary`. When a save to `primary` fails the cards are
/// written to `local` instead and the save still reports an error, so the
/// session keeps its unsaved flag and retries the primary on flush.
pub struct FallbackRepo {
    primary: Arc<dyn Repository>,
    local: Arc<dyn Repository>,
}

impl FallbackRepo {
    pub fn new(primary: Arc<dyn Repository>, local: Arc<dyn Repository>) -> Self {
        Self { primary, local }
    }
}

#[async_trait]
impl Repository for FallbackRepo {
    async fn load(&self) -> Result<Vec<Card>, CoreError> {
        self.primary.load().await
    }

    async fn save(&self, cards: &[Card]) -> Result<(), CoreError> {
        let Err(e) = self.primary.save(cards).await else {
            return Ok(());
        };
        warn!(primary = self.primary.kind(), local = self.local.kind(), error = %e, "save failed, writing local copy");
        match self.local.save(cards).await {
            Ok(()) => Err(CoreError::Storage("saved to local copy only")),
            Err(local) => {
                warn!(error = %local, "local copy failed too");
                Err(e)
            }
        }
    }

    fn kind(&self) -> &'static str {
        self.primary.kind()
    }
}
