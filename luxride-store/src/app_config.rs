use luxride_catalog::PricingConfig;
use luxride_core::ToastTray;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub wizard: WizardConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Timings and fixed data used by the booking wizard
#[derive(Debug, Deserialize, Clone)]
pub struct WizardConfig {
    pub confirmation_latency_ms: u64,
    #[serde(default)]
    pub gateway_failure_rate: f64,
    pub ticker_interval_ms: u64,
    pub autocomplete_debounce_ms: u64,
    pub catalog_retry_delay_ms: u64,
    pub toast_ttl_ms: u64,
    #[serde(default = "default_addresses")]
    pub addresses: Vec<String>,
}

fn default_addresses() -> Vec<String> {
    [
        "123 Main Street, Downtown",
        "456 Airport Road, Terminal 1",
        "789 Business Plaza, Suite 100",
        "321 Hotel Avenue, Grand Hotel",
        "654 Shopping Center, West Mall",
    ]
    .iter()
    .map(|a| a.to_string())
    .collect()
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            confirmation_latency_ms: 2000,
            gateway_failure_rate: 0.0,
            ticker_interval_ms: 3000,
            autocomplete_debounce_ms: 250,
            catalog_retry_delay_ms: 1000,
            toast_ttl_ms: 5000,
            addresses: default_addresses(),
        }
    }
}

impl WizardConfig {
    pub fn confirmation_latency(&self) -> Duration {
        Duration::from_millis(self.confirmation_latency_ms)
    }

    pub fn ticker_interval(&self) -> Duration {
        Duration::from_millis(self.ticker_interval_ms)
    }

    pub fn autocomplete_debounce(&self) -> Duration {
        Duration::from_millis(self.autocomplete_debounce_ms)
    }

    pub fn catalog_retry_delay(&self) -> Duration {
        Duration::from_millis(self.catalog_retry_delay_ms)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    /// Toast tray whose entries live for `toast_ttl`
    pub fn toast_tray(&self) -> ToastTray {
        ToastTray::from_std(self.toast_ttl())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DraftBackend {
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub draft_backend: DraftBackend,
    pub redis_url: Option<String>,
    #[serde(default = "default_draft_ttl")]
    pub draft_ttl_seconds: u64,
    /// JSON file for the booking history. In-memory when unset.
    pub history_path: Option<String>,
    /// JSON file for the profile. In-memory when unset.
    pub profile_path: Option<String>,
}

fn default_draft_ttl() -> u64 { 1800 }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// Vehicle fixture. The embedded fleet is used when unset.
    pub fixture_path: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Path::new("config"))
    }

    pub fn load_from(dir: &Path) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::from(dir.join("default.toml")))
            // Per-environment overrides, optional
            .add_source(config::File::from(dir.join(format!("{}.toml", run_mode))).required(false))
            // Not checked in
            .add_source(config::File::from(dir.join("local.toml")).required(false))
            // Eg. `LUXRIDE__WIZARD__TICKER_INTERVAL_MS=500`
            .add_source(config::Environment::with_prefix("LUXRIDE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
