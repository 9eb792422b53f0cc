use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use recall_core::{repo::Repository, Card, CoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;
use tracing::{debug, warn};

pub mod paths;

const FILE_VERSION: u32 = 1;
pub const DEFAULT_MAX_BACKUPS: usize = 10;

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    flashcards: Vec<Card>,
}

/// What may be found on disk: our versioned image, or the bare card array
/// the browser app kept in local storage.
#[derive(Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Image(FileImage),
    Bare(Vec<Card>),
}

pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    created_at: RwLock<DateTime<Utc>>,
}

impl JsonStore {
    pub async fn open_default(max_backups: usize) -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, max_backups).await
    }

    pub async fn open_with(path: PathBuf, backups_dir: PathBuf, max_backups: usize) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let created_at = match read_image(&path).await? {
            Some(OnDisk::Image(img)) => img.created_at,
            _ => Utc::now(),
        };
        Ok(Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            created_at: RwLock::new(created_at),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|e| {
        warn!(path = %path.display(), error = %e, "cannot create directory");
        CoreError::Storage("io")
    })
}

async fn read_image(path: &Path) -> Result<Option<OnDisk>, CoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let p = path.to_path_buf();
    task::spawn_blocking(move || {
        let buf = fs::read_to_string(&p)?;
        let v = serde_json::from_str::<OnDisk>(&buf)?;
        Ok::<OnDisk, io::Error>(v)
    })
    .await
    .map_err(|_| CoreError::Storage("io"))?
    .map(Some)
    .map_err(|e| {
        warn!(path = %path.display(), error = %e, "cannot read card file");
        CoreError::Storage("read")
    })
}

fn write_with_backup(path: &Path, backups_dir: &Path, max_backups: usize, img: &FileImage) -> Result<(), io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;

    // Backup rotation
    let ts = img.updated_at.format("%Y%m%d-%H%M%S%.3f");
    let backup_path = backups_dir.join(format!("recall-{ts}.json"));
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    btmp.persist(&backup_path).map_err(|e| e.error)?;

    rotate_backups(backups_dir, max_backups)?;

    Ok(())
}

/// Keeps the `keep` newest backups. Names embed the timestamp, so name order
/// is age order.
fn rotate_backups(dir: &Path, keep: usize) -> Result<(), io::Error> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    entries.sort();
    if entries.len() > keep {
        for p in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(p);
        }
    }
    Ok(())
}

#[async_trait]
impl Repository for JsonStore {
    async fn load(&self) -> Result<Vec<Card>, CoreError> {
        match read_image(&self.path).await? {
            Some(OnDisk::Image(img)) => {
                if img.version > FILE_VERSION {
                    warn!(version = img.version, "card file written by a newer version");
                }
                *self.created_at.write() = img.created_at;
                Ok(img.flashcards)
            }
            Some(OnDisk::Bare(cards)) => {
                debug!(cards = cards.len(), "loaded legacy card array");
                Ok(cards)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, cards: &[Card]) -> Result<(), CoreError> {
        let snapshot = FileImage {
            version: FILE_VERSION,
            created_at: *self.created_at.read(),
            updated_at: Utc::now(),
            flashcards: cards.to_vec(),
        };
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;

        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &snapshot))
            .await
            .map_err(|_| CoreError::Storage("io"))?
            .map_err(|e| {
                warn!(error = %e, "cannot write card file");
                CoreError::Storage("write")
            })?;
        debug!(cards = cards.len(), path = %self.path.display(), "saved cards");
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::{apply_quality, Quality};

    async fn store_in(dir: &Path, keep: usize) -> JsonStore {
        JsonStore::open_with(dir.join("cards.json"), dir.join("backups"), keep)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), 3).await;
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saved_cards_survive_reopen_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let cards = vec![
            apply_quality(Card::new("b", "2", now), Quality::GOOD, now),
            Card::new("a", "1", now),
        ];
        store_in(dir.path(), 3).await.save(&cards).await.unwrap();

        let loaded = store_in(dir.path(), 3).await.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, cards[0].id);
        assert_eq!(loaded[0].interval, 1);
        assert_eq!(loaded[1].question, "a");
        // millisecond precision on disk
        assert_eq!(loaded[1].next_review.timestamp_millis(), now.timestamp_millis());
    }

    #[tokio::test]
    async fn backups_are_rotated() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), 2).await;
        let now = Utc::now();
        for i in 0..5 {
            store.save(&[Card::new(format!("q{i}"), "a", now)]).await.unwrap();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        let n = fs::read_dir(dir.path().join("backups")).unwrap().count();
        assert_eq!(n, 2);
    }

    #[tokio::test]
    async fn legacy_array_loads_with_fresh_ids() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = r#"[
          {"question":"Q1","answer":"A1","easeFactor":2.6,"interval":1,"repetitions":1,
           "nextReview":1700000000000,"difficulty":"medium","mistakes":0},
          {"question":"Q2","answer":"A2","easeFactor":2.5,"interval":0,"repetitions":0,
           "nextReview":1700000000000,"difficulty":"easy","mistakes":0}
        ]"#;
        fs::write(dir.path().join("cards.json"), legacy).unwrap();

        let cards = store_in(dir.path(), 3).await.load().await.unwrap();
        assert_eq!(cards.len(), 2);
        assert_ne!(cards[0].id, cards[1].id);
        assert_eq!(cards[0].ease_factor, 2.6);
        assert_eq!(cards[0].next_review.timestamp_millis(), 1_700_000_000_000);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cards.json"), "{not json").unwrap();
        let err = JsonStore::open_with(dir.path().join("cards.json"), dir.path().join("backups"), 1)
            .await
            .err()
            .unwrap();
        assert_eq!(err, CoreError::Storage("read"));
    }
}
