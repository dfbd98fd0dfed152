use crate::vehicle::{Capacity, Vehicle};
use serde::Deserialize;
use std::collections::HashSet;

/// Highest base fare a catalog entry may carry, $1,000,000
pub const MAX_BASE_PRICE_CENTS: i64 = 100_000_000;

/// Highest per-vehicle price multiplier
pub const MAX_PRICE_MULTIPLIER: f64 = 100.0;

/// Read-only fleet the wizard offers on the vehicle selection step
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleCatalog {
    vehicles: Vec<Vehicle>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<Vehicle>),
    Wrapped { vehicles: Vec<Vehicle> },
}

impl VehicleCatalog {
    pub fn new(vehicles: Vec<Vehicle>) -> Result<Self, CatalogError> {
        if vehicles.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for vehicle in &vehicles {
            if !seen.insert(vehicle.id.as_str()) {
                return Err(CatalogError::DuplicateVehicle(vehicle.id.clone()));
            }
            check_price(vehicle)?;
        }

        Ok(Self { vehicles })
    }

    /// Parse the JSON fixture, either a bare array or `{ "vehicles": [...] }`
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let vehicles = match serde_json::from_str::<CatalogDocument>(json)? {
            CatalogDocument::List(vehicles) => vehicles,
            CatalogDocument::Wrapped { vehicles } => vehicles,
        };
        Self::new(vehicles)
    }

    /// Fleet shipped with the site when no fixture is configured
    pub fn embedded() -> Self {
        let vehicle = |id: &str, name: &str, category: &str, passengers, luggage, features: &[&str], dollars: i64| Vehicle {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            capacity: Capacity { passengers, luggage },
            features: features.iter().map(|f| f.to_string()).collect(),
            base_price_cents: Some(dollars * 100),
            price_multiplier: None,
            description: None,
            explicit_class: None,
        };

        Self {
            vehicles: vec![
                vehicle("1", "Mercedes E-Class", "Executive Sedan", 4, 3, &["WiFi", "Climate Control", "Leather Seats"], 120),
                vehicle("2", "BMW 7 Series", "Luxury Sedan", 4, 3, &["WiFi", "Premium Audio", "Privacy Glass"], 180),
                vehicle("3", "Mercedes V-Class", "Executive Van", 7, 7, &["WiFi", "Extra Luggage", "Conference Setup"], 250),
            ],
        }
    }

    pub fn get(&self, vehicle_id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == vehicle_id)
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Every vehicle, ones that can carry the party first. Catalog order is
    /// kept within each group.
    pub fn ranked_for(&self, passengers: u32, luggage: u32) -> Vec<(&Vehicle, bool)> {
        let mut ranked: Vec<(&Vehicle, bool)> = self.vehicles
            .iter()
            .map(|v| (v, v.fits_party(passengers, luggage)))
            .collect();
        ranked.sort_by_key(|(_, fits)| !*fits);
        ranked
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

fn check_price(vehicle: &Vehicle) -> Result<(), CatalogError> {
    if let Some(cents) = vehicle.base_price_cents {
        if !(0..=MAX_BASE_PRICE_CENTS).contains(&cents) {
            return Err(CatalogError::PriceOutOfRange(vehicle.id.clone()));
        }
    }
    if let Some(multiplier) = vehicle.price_multiplier {
        if !multiplier.is_finite() || !(0.0..=MAX_PRICE_MULTIPLIER).contains(&multiplier) {
            return Err(CatalogError::PriceOutOfRange(vehicle.id.clone()));
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog fixture is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Catalog fixture could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("Duplicate vehicle id in catalog: {0}")]
    DuplicateVehicle(String),

    #[error("Catalog contains no vehicles")]
    Empty,

    #[error("Vehicle {0} has a price outside the supported range")]
    PriceOutOfRange(String),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}
