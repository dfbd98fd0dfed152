use async_trait::async_trait;
use luxride_core::{BookingHistoryRepository, BookingRecord, CoreResult, Profile, ProfileRepository};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

use crate::StoreError;

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// Write to a sibling temp file, then rename over the target.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(value)?).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Booking history persisted as a JSON array on disk
pub struct JsonHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BookingHistoryRepository for JsonHistoryStore {
    async fn append(&self, record: &BookingRecord) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut records: Vec<BookingRecord> = read_json(&self.path).await?.unwrap_or_default();
        records.push(record.clone());
        write_json(&self.path, &records).await?;

        info!("Booking {} appended to history ({} total)", record.number, records.len());
        Ok(())
    }

    async fn list(&self) -> CoreResult<Vec<BookingRecord>> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }
}

/// Profile persisted as a single JSON object on disk
pub struct JsonProfileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ProfileRepository for JsonProfileStore {
    async fn load(&self) -> CoreResult<Option<Profile>> {
        Ok(read_json(&self.path).await?)
    }

    async fn save(&self, profile: &Profile) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.path, profile).await?;
        Ok(())
    }
}
