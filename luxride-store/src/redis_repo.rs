use async_trait::async_trait;
use luxride_core::{CoreResult, DraftRepository, PersistedDraft};
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::StoreError;

/// Draft store backed by Redis. The key TTL stands in for the browser tab
/// lifetime, so an abandoned session expires on its own.
#[derive(Clone)]
pub struct RedisDraftStore {
    client: redis::Client,
    ttl_seconds: u64,
}

impl RedisDraftStore {
    pub fn new(connection_string: &str, ttl_seconds: u64) -> Result<Self, StoreError> {
        let client = redis::Client::open(connection_string)?;
        info!("Redis draft store configured (ttl {}s)", ttl_seconds);
        Ok(Self { client, ttl_seconds })
    }

    pub fn key(session_id: &str) -> String {
        format!("draft:{}", session_id)
    }
}

#[async_trait]
impl DraftRepository for RedisDraftStore {
    async fn load(&self, session_id: &str) -> CoreResult<Option<PersistedDraft>> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(StoreError::from)?;

        let raw: Option<String> = conn.get(Self::key(session_id)).await.map_err(StoreError::from)?;
        match raw {
            Some(raw) => {
                let draft = serde_json::from_str(&raw).map_err(StoreError::from)?;
                Ok(Some(draft))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session_id: &str, draft: &PersistedDraft) -> CoreResult<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(StoreError::from)?;

        let raw = serde_json::to_string(draft).map_err(StoreError::from)?;
        conn.set_ex::<_, _, ()>(Self::key(session_id), raw, self.ttl_seconds)
            .await
            .map_err(StoreError::from)?;

        debug!("Draft for session {} saved at step {:?}", session_id, draft.step);
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> CoreResult<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(StoreError::from)?;

        conn.del::<_, ()>(Self::key(session_id)).await.map_err(StoreError::from)?;
        debug!("Draft for session {} cleared", session_id);
        Ok(())
    }
}
