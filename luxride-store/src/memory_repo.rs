use async_trait::async_trait;
use luxride_core::{
    BookingHistoryRepository, BookingRecord, CoreResult, DraftRepository, PersistedDraft, Profile,
    ProfileRepository,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::StoreError;

/// Session drafts kept as serialized JSON, the way a browser tab keeps them
#[derive(Default)]
pub struct MemoryDraftStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the raw stored value for a session
    pub async fn put_raw(&self, session_id: &str, raw: &str) {
        self.entries.write().await.insert(session_id.to_string(), raw.to_string());
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl DraftRepository for MemoryDraftStore {
    async fn load(&self, session_id: &str) -> CoreResult<Option<PersistedDraft>> {
        let entries = self.entries.read().await;
        match entries.get(session_id) {
            Some(raw) => {
                let draft = serde_json::from_str(raw).map_err(StoreError::from)?;
                Ok(Some(draft))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session_id: &str, draft: &PersistedDraft) -> CoreResult<()> {
        let raw = serde_json::to_string(draft).map_err(StoreError::from)?;
        self.entries.write().await.insert(session_id.to_string(), raw);
        debug!("Draft saved for session {} at step {:?}", session_id, draft.step);
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> CoreResult<()> {
        self.entries.write().await.remove(session_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryHistoryStore {
    records: RwLock<Vec<BookingRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingHistoryRepository for MemoryHistoryStore {
    async fn append(&self, record: &BookingRecord) -> CoreResult<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn list(&self) -> CoreResult<Vec<BookingRecord>> {
        Ok(self.records.read().await.clone())
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profile: RwLock<Option<Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: Profile) -> Self {
        Self {
            profile: RwLock::new(Some(profile)),
        }
    }
}

#[async_trait]
impl ProfileRepository for MemoryProfileStore {
    async fn load(&self) -> CoreResult<Option<Profile>> {
        Ok(self.profile.read().await.clone())
    }

    async fn save(&self, profile: &Profile) -> CoreResult<()> {
        *self.profile.write().await = Some(profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use luxride_core::{CoreError, PolicyAcceptance, Step, TripForm};

    fn draft(step: Step) -> PersistedDraft {
        PersistedDraft {
            step,
            form: TripForm {
                pickup: "123 Main Street, Downtown".to_string(),
                ..TripForm::default()
            },
            vehicle_id: Some("2".to_string()),
            promo_code: None,
            policies: PolicyAcceptance::default(),
            terms_accepted: false,
            saved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_draft_save_load_clear() {
        let store = MemoryDraftStore::new();
        assert!(store.load("tab-1").await.unwrap().is_none());

        store.save("tab-1", &draft(Step::Review)).await.unwrap();
        store.save("tab-2", &draft(Step::TripDetails)).await.unwrap();

        let loaded = store.load("tab-1").await.unwrap().unwrap();
        assert_eq!(loaded.step, Step::Review);
        assert_eq!(loaded.vehicle_id.as_deref(), Some("2"));

        store.clear("tab-1").await.unwrap();
        assert!(store.load("tab-1").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_tampered_draft_is_rejected() {
        let store = MemoryDraftStore::new();
        store
            .put_raw("tab-1", r#"{"step":"REVIEW","saved_at":"2030-01-01T00:00:00Z","total":1}"#)
            .await;

        let result = store.load("tab-1").await;
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_profile_round_trip() {
        let store = MemoryProfileStore::new();
        assert!(store.load().await.unwrap().is_none());

        let profile = Profile {
            name: "Jane".to_string(),
            preferred_pickup: Some("123 Main Street, Downtown".to_string()),
            ..Profile::default()
        };
        store.save(&profile).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(profile));
    }
}
