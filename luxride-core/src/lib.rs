pub mod models;
pub mod repository;
pub mod notifier;
pub mod gateway;

pub use models::{
    BookingDraft, BookingNumber, BookingRecord, NotificationSettings, PersistedDraft,
    PolicyAcceptance, Profile, Step, TripForm, TripRequest,
};
pub use repository::{BookingHistoryRepository, DraftRepository, ProfileRepository};
pub use notifier::{Notifier, Severity, Toast, ToastTray, TracingNotifier};
pub use gateway::{ConfirmationGateway, GatewayError, GatewayReceipt};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
