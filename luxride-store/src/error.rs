use luxride_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Missing setting: {0}")]
    MissingSetting(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            // A record that no longer matches the schema is a validation
            // failure, not an outage.
            StoreError::Serde(e) => CoreError::ValidationError(e.to_string()),
            other => CoreError::StorageError(other.to_string()),
        }
    }
}
