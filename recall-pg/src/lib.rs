//! Remote card store on PostgreSQL.
//!
//! Each user owns one document row holding the full card list as JSONB.
//! Saves upsert that row and raise a `NOTIFY` inside the same transaction;
//! [`PostgresRepo::subscribe`] turns notifications from other writers into a
//! stream of full card lists. Concurrent writers race, and the last commit
//! wins.

use chrono::Utc;
use recall_core::{repo::Repository, Card, CoreError};
use serde::{Deserialize, Serialize};
use sqlx::{
    postgres::{PgListener, PgPoolOptions},
    types::Json,
    PgPool,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const CHANNEL: &str = "recall_cards";

pub struct PostgresRepo {
    pool: PgPool,
    user_id: String,
    origin: Uuid,
}

/// Body of a change notification.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub user_id: String,
    pub origin: Uuid,
}

impl Change {
    pub fn parse(payload: &str) -> Option<Change> {
        serde_json::from_str(payload).ok()
    }

    /// Whether a subscriber identified by `user_id`/`origin` should act on it.
    pub fn is_foreign_update_for(&self, user_id: &str, origin: Uuid) -> bool {
        self.user_id == user_id && self.origin != origin
    }
}

impl PostgresRepo {
    pub async fn connect(url: &str, user_id: impl Into<String>) -> Result<Self, CoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| storage("pg connect", e))?;
        let repo = Self {
            pool,
            user_id: user_id.into(),
            origin: Uuid::new_v4(),
        };
        repo.ensure_schema().await?;
        info!(user = %repo.user_id, "connected to remote card store");
        Ok(repo)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS card_documents (
          user_id       text PRIMARY KEY,
          flashcards    jsonb NOT NULL DEFAULT '[]'::jsonb,
          last_updated  bigint NOT NULL,
          created_at    timestamptz NOT NULL DEFAULT now()
        );
        "#;

        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| storage("pg schema", e))?;
        }
        Ok(())
    }

    /// Starts listening for writes by other clients to this user's document.
    ///
    /// Each foreign write delivers the document's full card list. Own writes
    /// are filtered out. The channel closes when the listener connection
    /// fails for good or the receiver is dropped.
    pub async fn subscribe(&self) -> Result<mpsc::Receiver<Vec<Card>>, CoreError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| storage("pg listen", e))?;
        listener
            .listen(CHANNEL)
            .await
            .map_err(|e| storage("pg listen", e))?;

        let (tx, rx) = mpsc::channel(8);
        let pool = self.pool.clone();
        let user_id = self.user_id.clone();
        let origin = self.origin;

        tokio::spawn(async move {
            loop {
                let note = match listener.recv().await {
                    Ok(n) => n,
                    Err(e) => {
                        warn!(error = %e, "remote listener stopped");
                        break;
                    }
                };
                let Some(change) = Change::parse(note.payload()) else {
                    debug!(payload = note.payload(), "ignoring malformed notification");
                    continue;
                };
                if !change.is_foreign_update_for(&user_id, origin) {
                    continue;
                }
                match fetch_document(&pool, &user_id).await {
                    Ok(cards) => {
                        debug!(cards = cards.len(), "remote document changed");
                        if tx.send(cards).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "cannot fetch changed document"),
                }
            }
        });

        Ok(rx)
    }
}

async fn fetch_document(pool: &PgPool, user_id: &str) -> Result<Vec<Card>, CoreError> {
    let doc = sqlx::query_scalar::<_, Json<Vec<Card>>>(
        "SELECT flashcards FROM card_documents WHERE user_id=$1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| storage("pg read document", e))?;
    Ok(doc.map(|Json(cards)| cards).unwrap_or_default())
}

#[async_trait::async_trait]
impl Repository for PostgresRepo {
    async fn load(&self) -> Result<Vec<Card>, CoreError> {
        fetch_document(&self.pool, &self.user_id).await
    }

    /// Writes only the card list and timestamp; other columns of the
    /// document are left as they are.
    async fn save(&self, cards: &[Card]) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage("pg tx", e))?;

        sqlx::query(
            r#"
            INSERT INTO card_documents (user_id, flashcards, last_updated)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
              SET flashcards = EXCLUDED.flashcards,
                  last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(&self.user_id)
        .bind(Json(cards))
        .bind(Utc::now().timestamp_millis())
        .execute(&mut *tx)
        .await
        .map_err(|e| storage("pg upsert document", e))?;

        let change = Change {
            user_id: self.user_id.clone(),
            origin: self.origin,
        };
        let payload = serde_json::to_string(&change).map_err(|_| CoreError::Storage("pg notify"))?;
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(CHANNEL)
            .bind(payload)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage("pg notify", e))?;

        tx.commit()
            .await
            .map_err(|e| storage("pg tx commit", e))?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "remote"
    }
}

fn storage(what: &'static str, e: sqlx::Error) -> CoreError {
    warn!(error = %e, "{what} failed");
    CoreError::Storage(what)
}
