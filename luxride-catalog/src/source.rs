use crate::catalog::{CatalogError, VehicleCatalog};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Where the vehicle catalog comes from
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<VehicleCatalog, CatalogError>;

    /// Human readable origin, used in logs
    fn describe(&self) -> String;
}

/// The fleet compiled into the binary
pub struct EmbeddedCatalog;

#[async_trait]
impl CatalogSource for EmbeddedCatalog {
    async fn fetch(&self) -> Result<VehicleCatalog, CatalogError> {
        Ok(VehicleCatalog::embedded())
    }

    fn describe(&self) -> String {
        "embedded fleet".to_string()
    }
}

/// A static JSON fixture on disk
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalog {
    async fn fetch(&self) -> Result<VehicleCatalog, CatalogError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        VehicleCatalog::from_json(&raw)
    }

    fn describe(&self) -> String {
        format!("fixture {}", self.path.display())
    }
}

/// Fetch the catalog, retrying exactly once after `retry_delay`
pub async fn load_with_retry(
    source: &dyn CatalogSource,
    retry_delay: Duration,
) -> Result<VehicleCatalog, CatalogError> {
    match source.fetch().await {
        Ok(catalog) => {
            info!("Loaded {} vehicles from {}", catalog.len(), source.describe());
            Ok(catalog)
        }
        Err(first) => {
            warn!("Catalog load from {} failed: {}. Retrying once", source.describe(), first);
            tokio::time::sleep(retry_delay).await;

            let catalog = source.fetch().await?;
            info!("Loaded {} vehicles from {} on retry", catalog.len(), source.describe());
            Ok(catalog)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakySource {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for FlakySource {
        async fn fetch(&self) -> Result<VehicleCatalog, CatalogError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(CatalogError::Unavailable("timeout".to_string()))
            } else {
                Ok(VehicleCatalog::embedded())
            }
        }

        fn describe(&self) -> String {
            "flaky".to_string()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_once_then_succeeds() {
        let source = FlakySource { failures: 1, calls: AtomicUsize::new(0) };

        let catalog = load_with_retry(&source, Duration::from_secs(1)).await.unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_second_failure() {
        let source = FlakySource { failures: 5, calls: AtomicUsize::new(0) };

        let result = load_with_retry(&source, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(CatalogError::Unavailable(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_file_fixture() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/vehicles.json");
        let catalog = FileCatalog::new(path).fetch().await.unwrap();

        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.get("4").unwrap().multiplier(), 1.6);
    }

    #[tokio::test]
    async fn test_missing_fixture_is_io_error() {
        let result = FileCatalog::new("/nonexistent/vehicles.json").fetch().await;
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }
}
