//! Application-side owner of a card collection.
//!
//! A `Session` pairs the in-memory [`Collection`] with a [`Repository`].
//! Every mutating call takes `&mut self`, applies the pure collection
//! operation and then writes the full list back, so at most one mutation is
//! ever in flight. A failed write is logged and remembered rather than
//! returned: the in-memory collection stays authoritative and [`Session::flush`]
//! retries later.
//!
//! Remote snapshots (real-time pushes from a shared store) arrive through
//! [`Session::on_remote_update`]. They replace the collection only when there
//! are no unsaved local changes; otherwise they are held back and dropped as
//! soon as the local state is written, since that write is the newer one.

use crate::{Card, CardId, Collection, CoreError, Quality, RawCard, Repository, Stats, StudyQueue};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteApply {
    Applied,
    Deferred,
}

pub struct Session {
    collection: Collection,
    repo: Arc<dyn Repository>,
    unsaved: bool,
    deferred_remote: Option<Vec<Card>>,
}

impl Session {
    pub fn new(repo: Arc<dyn Repository>, collection: Collection) -> Self {
        Self {
            collection,
            repo,
            unsaved: false,
            deferred_remote: None,
        }
    }

    pub async fn open(repo: Arc<dyn Repository>) -> Result<Self, CoreError> {
        let cards = repo.load().await?;
        info!(backend = repo.kind(), cards = cards.len(), "loaded collection");
        Ok(Self::new(repo, Collection::from_cards(cards)))
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn cards(&self) -> &[Card] {
        self.collection.cards()
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.collection.get(id)
    }

    pub fn backend(&self) -> &'static str {
        self.repo.kind()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn has_deferred_remote(&self) -> bool {
        self.deferred_remote.is_some()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> Stats {
        self.collection.stats(now)
    }

    pub fn study_queue(&self, now: DateTime<Utc>) -> StudyQueue {
        self.collection.study_queue(now)
    }

    pub async fn create(&mut self, batch: Vec<RawCard>, now: DateTime<Utc>) -> Result<Vec<Card>, CoreError> {
        let created = self.collection.create(batch, now)?.to_vec();
        debug!(count = created.len(), "created cards");
        self.persist().await;
        Ok(created)
    }

    pub async fn add(&mut self, question: &str, answer: &str, now: DateTime<Utc>) -> Result<Card, CoreError> {
        let card = self.collection.add(question, answer, now)?.clone();
        self.persist().await;
        Ok(card)
    }

    pub async fn rate(&mut self, id: CardId, quality: Quality, now: DateTime<Utc>) -> Result<Card, CoreError> {
        let card = self.collection.rate(id, quality, now)?.clone();
        debug!(%id, quality = quality.value(), interval = card.interval, "rated card");
        self.persist().await;
        Ok(card)
    }

    pub async fn reset(&mut self, id: CardId, now: DateTime<Utc>) -> Result<Card, CoreError> {
        let card = self.collection.reset(id, now)?.clone();
        self.persist().await;
        Ok(card)
    }

    pub async fn edit(&mut self, id: CardId, question: &str, answer: &str) -> Result<Card, CoreError> {
        let card = self.collection.edit(id, question, answer)?.clone();
        self.persist().await;
        Ok(card)
    }

    pub async fn delete(&mut self, id: CardId) -> Result<Card, CoreError> {
        let card = self.collection.delete(id)?;
        self.persist().await;
        Ok(card)
    }

    pub async fn import(&mut self, cards: Vec<Card>) -> usize {
        let added = self.collection.import(cards);
        if added > 0 {
            debug!(count = added, "imported cards");
            self.persist().await;
        }
        added
    }

    /// Retries a pending write. Returns whether the collection is now saved.
    pub async fn flush(&mut self) -> bool {
        if self.unsaved {
            self.persist().await;
        }
        !self.unsaved
    }

    pub fn on_remote_update(&mut self, cards: Vec<Card>) -> RemoteApply {
        if self.unsaved {
            debug!(cards = cards.len(), "deferring remote snapshot behind unsaved changes");
            self.deferred_remote = Some(cards);
            return RemoteApply::Deferred;
        }
        info!(cards = cards.len(), "applied remote snapshot");
        self.collection.replace_all(cards);
        RemoteApply::Applied
    }

    async fn persist(&mut self) {
        match self.repo.save(self.collection.cards()).await {
            Ok(()) => {
                self.unsaved = false;
                if self.deferred_remote.take().is_some() {
                    debug!("dropped remote snapshot superseded by local write");
                }
            }
            Err(e) => {
                warn!(backend = self.repo.kind(), error = %e, "save failed, keeping in-memory state");
                self.unsaved = true;
            }
        }
    }
}
