use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of chauffeur service requested for a trip
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    #[serde(alias = "airport-transfer")]
    Airport,
    #[serde(alias = "hourly-chauffeur")]
    Hourly,
    #[serde(alias = "intercity-travel")]
    Intercity,
    #[serde(alias = "corporate-package")]
    Corporate,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Airport,
        ServiceKind::Hourly,
        ServiceKind::Intercity,
        ServiceKind::Corporate,
    ];

    /// Key used in config tables and persisted drafts
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Airport => "airport",
            ServiceKind::Hourly => "hourly",
            ServiceKind::Intercity => "intercity",
            ServiceKind::Corporate => "corporate",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceKind::Airport => "Airport Transfer",
            ServiceKind::Hourly => "Hourly Chauffeur",
            ServiceKind::Intercity => "Intercity Travel",
            ServiceKind::Corporate => "Corporate Package",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown service kind: {0}")]
pub struct UnknownServiceKind(pub String);

impl FromStr for ServiceKind {
    type Err = UnknownServiceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "airport" | "airport-transfer" => Ok(ServiceKind::Airport),
            "hourly" | "hourly-chauffeur" => Ok(ServiceKind::Hourly),
            "intercity" | "intercity-travel" => Ok(ServiceKind::Intercity),
            "corporate" | "corporate-package" => Ok(ServiceKind::Corporate),
            _ => Err(UnknownServiceKind(s.trim().to_string())),
        }
    }
}
