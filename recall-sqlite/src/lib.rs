use chrono::{DateTime, TimeZone, Utc};
use recall_core::{repo::Repository, Card, CoreError, Difficulty};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::path::Path;
use tracing::{debug, warn};

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(|e| storage("sqlite connect", e))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    /// Private in-memory database. A single never-recycled connection, since
    /// every new SQLite connection would see its own empty database.
    pub async fn open_memory() -> Result<Self, CoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| storage("sqlite connect", e))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS cards (
          id              TEXT PRIMARY KEY,
          position        INTEGER NOT NULL,
          question        TEXT NOT NULL,
          answer          TEXT NOT NULL,
          ease_factor     REAL    NOT NULL DEFAULT 2.5,
          interval_days   INTEGER NOT NULL DEFAULT 0,
          repetitions     INTEGER NOT NULL DEFAULT 0,
          next_review_ms  INTEGER NOT NULL,
          mistakes        INTEGER NOT NULL DEFAULT 0,
          difficulty      TEXT    NOT NULL DEFAULT 'easy'
        );

        CREATE INDEX IF NOT EXISTS idx_cards_position ON cards (position);
        CREATE INDEX IF NOT EXISTS idx_cards_next_review ON cards (next_review_ms);
        "#;

        // Execute statements one by one for compatibility.
        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| storage("sqlite schema", e))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Repository for SqliteRepo {
    async fn load(&self) -> Result<Vec<Card>, CoreError> {
        let rows = sqlx::query(
            r#"SELECT id,question,answer,ease_factor,interval_days,repetitions,
                      next_review_ms,mistakes,difficulty
               FROM cards ORDER BY position ASC"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage("list cards", e))?;
        let mut v = Vec::with_capacity(rows.len());
        for row in rows {
            v.push(row_into_card(row)?);
        }
        Ok(v)
    }

    /// Rewrites the table in one transaction so a failed save leaves the
    /// previous collection intact.
    async fn save(&self, cards: &[Card]) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage("tx", e))?;

        sqlx::query("DELETE FROM cards")
            .execute(&mut *tx)
            .await
            .map_err(|e| storage("clear cards", e))?;

        for (position, card) in cards.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cards (
                  id, position, question, answer, ease_factor, interval_days,
                  repetitions, next_review_ms, mistakes, difficulty
                )
                VALUES (?,?,?,?,?,?,?,?,?,?)
                "#,
            )
            .bind(card.id.to_string())
            .bind(position as i64)
            .bind(&card.question)
            .bind(&card.answer)
            .bind(card.ease_factor)
            .bind(card.interval as i64)
            .bind(card.repetitions as i64)
            .bind(card.next_review.timestamp_millis())
            .bind(card.mistakes as i64)
            .bind(card.difficulty.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| storage("insert card", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| storage("tx commit", e))?;
        debug!(cards = cards.len(), "saved cards to sqlite");
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "sqlite"
    }
}

// ===== Helpers =====
fn storage(what: &'static str, e: sqlx::Error) -> CoreError {
    warn!(error = %e, "{what} failed");
    CoreError::Storage(what)
}

fn uuid_from_str(s: String) -> Result<uuid::Uuid, CoreError> {
    uuid::Uuid::parse_str(&s).map_err(|_| CoreError::Invalid("uuid"))
}

fn dt_from_millis(ms: i64) -> Result<DateTime<Utc>, CoreError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(CoreError::Invalid("datetime"))
}

fn count_from_i(i: i64) -> u32 {
    i.clamp(0, u32::MAX as i64) as u32
}

fn row_into_card(row: sqlx::sqlite::SqliteRow) -> Result<Card, CoreError> {
    Ok(Card {
        id: uuid_from_str(row.get::<String, _>("id"))?,
        question: row.get::<String, _>("question"),
        answer: row.get::<String, _>("answer"),
        ease_factor: row.get::<f64, _>("ease_factor"),
        interval: count_from_i(row.get::<i64, _>("interval_days")),
        repetitions: count_from_i(row.get::<i64, _>("repetitions")),
        next_review: dt_from_millis(row.get::<i64, _>("next_review_ms"))?,
        mistakes: count_from_i(row.get::<i64, _>("mistakes")),
        difficulty: row.get::<String, _>("difficulty").parse::<Difficulty>()?,
    })
}
