use crate::models::{BookingNumber, BookingRecord, PersistedDraft, Profile};
use crate::CoreResult;
use async_trait::async_trait;

/// Per-session storage for the in-progress wizard
#[async_trait]
pub trait DraftRepository: Send + Sync {
    async fn load(&self, session_id: &str) -> CoreResult<Option<PersistedDraft>>;

    async fn save(&self, session_id: &str, draft: &PersistedDraft) -> CoreResult<()>;

    async fn clear(&self, session_id: &str) -> CoreResult<()>;
}

/// Durable, append-only list of confirmed bookings
#[async_trait]
pub trait BookingHistoryRepository: Send + Sync {
    async fn append(&self, record: &BookingRecord) -> CoreResult<()>;

    /// All records, oldest first
    async fn list(&self) -> CoreResult<Vec<BookingRecord>>;

    async fn find(&self, number: &BookingNumber) -> CoreResult<Option<BookingRecord>> {
        Ok(self.list().await?.into_iter().find(|r| &r.number == number))
    }
}

/// Storage for the single local customer profile
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn load(&self) -> CoreResult<Option<Profile>>;

    async fn save(&self, profile: &Profile) -> CoreResult<()>;
}
