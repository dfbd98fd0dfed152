use luxride_core::{BookingHistoryRepository, DraftRepository, ProfileRepository};
use std::sync::Arc;
use tracing::info;

use crate::app_config::{DraftBackend, StorageConfig};
use crate::{
    JsonHistoryStore, JsonProfileStore, MemoryDraftStore, MemoryHistoryStore, MemoryProfileStore,
    RedisDraftStore, StoreError,
};

/// The persistence back-ends a booking session talks to
#[derive(Clone)]
pub struct Repositories {
    pub drafts: Arc<dyn DraftRepository>,
    pub history: Arc<dyn BookingHistoryRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            drafts: Arc::new(MemoryDraftStore::new()),
            history: Arc::new(MemoryHistoryStore::new()),
            profiles: Arc::new(MemoryProfileStore::new()),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Result<Self, StoreError> {
        let drafts: Arc<dyn DraftRepository> = match storage.draft_backend {
            DraftBackend::Memory => Arc::new(MemoryDraftStore::new()),
            DraftBackend::Redis => {
                let url = storage
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| StoreError::MissingSetting("storage.redis_url".to_string()))?;
                Arc::new(RedisDraftStore::new(url, storage.draft_ttl_seconds)?)
            }
        };

        let history: Arc<dyn BookingHistoryRepository> = match &storage.history_path {
            Some(path) => Arc::new(JsonHistoryStore::new(path)),
            None => Arc::new(MemoryHistoryStore::new()),
        };

        let profiles: Arc<dyn ProfileRepository> = match &storage.profile_path {
            Some(path) => Arc::new(JsonProfileStore::new(path)),
            None => Arc::new(MemoryProfileStore::new()),
        };

        info!(
            "Repositories ready: drafts={:?}, history={}, profile={}",
            storage.draft_backend,
            storage.history_path.as_deref().unwrap_or("memory"),
            storage.profile_path.as_deref().unwrap_or("memory"),
        );

        Ok(Self { drafts, history, profiles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(backend: DraftBackend) -> StorageConfig {
        StorageConfig {
            draft_backend: backend,
            redis_url: None,
            draft_ttl_seconds: 1800,
            history_path: None,
            profile_path: None,
        }
    }

    #[tokio::test]
    async fn test_memory_backend_from_config() {
        let repos = Repositories::from_config(&storage(DraftBackend::Memory)).unwrap();
        assert!(repos.drafts.load("nobody").await.unwrap().is_none());
        assert!(repos.history.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let err = Repositories::from_config(&storage(DraftBackend::Redis)).err().unwrap();
        assert!(matches!(err, StoreError::MissingSetting(_)));
    }

    #[test]
    fn test_redis_backend_with_url_builds_lazily() {
        let mut config = storage(DraftBackend::Redis);
        config.redis_url = Some("redis://127.0.0.1:6379".to_string());
        assert!(Repositories::from_config(&config).is_ok());
    }
}
