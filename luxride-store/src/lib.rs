pub mod app_config;
pub mod error;
pub mod memory_repo;
pub mod json_repo;
pub mod redis_repo;
pub mod registry;

pub use app_config::{CatalogConfig, Config, DraftBackend, StorageConfig, WizardConfig};
pub use error::StoreError;
pub use memory_repo::{MemoryDraftStore, MemoryHistoryStore, MemoryProfileStore};
pub use json_repo::{JsonHistoryStore, JsonProfileStore};
pub use redis_repo::RedisDraftStore;
pub use registry::Repositories;
