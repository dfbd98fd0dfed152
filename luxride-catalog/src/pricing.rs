use crate::service::ServiceKind;
use crate::vehicle::{Vehicle, VehicleClass};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tables driving ride prices. All amounts are in cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Promo code => discount percentage
    pub promo_codes: HashMap<String, u32>,

    /// Base fare per service, used for vehicles that only carry a multiplier
    pub service_base_fares_cents: HashMap<String, i64>,

    /// service => vehicle class => multiplier. Missing entries count as 1.0
    pub service_class_multipliers: HashMap<String, HashMap<String, f64>>,

    /// Rates behind the marketing-page price estimator
    pub estimator: EstimatorRates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorRates {
    pub services: HashMap<String, ServiceRate>,
    pub class_multipliers: HashMap<String, f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRate {
    pub base_cents: i64,
    pub per_mile_cents: i64,
    pub per_hour_cents: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            promo_codes: HashMap::from([
                ("SAVE10".to_string(), 10),
                ("FIRST20".to_string(), 20),
                ("VIP15".to_string(), 15),
            ]),
            service_base_fares_cents: HashMap::from([
                ("airport".to_string(), 5000),
                ("hourly".to_string(), 8000),
                ("intercity".to_string(), 10000),
                ("corporate".to_string(), 15000),
            ]),
            service_class_multipliers: HashMap::new(),
            estimator: EstimatorRates::default(),
        }
    }
}

impl Default for EstimatorRates {
    fn default() -> Self {
        let rate = |base_cents, per_mile_cents, per_hour_cents| ServiceRate {
            base_cents,
            per_mile_cents,
            per_hour_cents,
        };

        Self {
            services: HashMap::from([
                ("airport".to_string(), rate(5000, 200, 0)),
                ("hourly".to_string(), rate(0, 0, 8000)),
                ("intercity".to_string(), rate(10000, 150, 0)),
                ("corporate".to_string(), rate(15000, 250, 0)),
            ]),
            class_multipliers: HashMap::from([
                ("standard".to_string(), 1.0),
                ("executive".to_string(), 1.5),
                ("luxury".to_string(), 2.0),
            ]),
        }
    }
}

/// Result of applying a promo code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PromoOutcome {
    None,
    Applied { code: String, percent: u32 },
    Invalid { code: String },
}

/// Price of one vehicle for one trip
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceQuote {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub promo: PromoOutcome,
}

impl PriceQuote {
    pub fn invalid_code(&self) -> bool {
        matches!(self.promo, PromoOutcome::Invalid { .. })
    }

    /// The code that actually produced a discount, if any
    pub fn applied_code(&self) -> Option<&str> {
        match &self.promo {
            PromoOutcome::Applied { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EstimateRequest {
    pub service: ServiceKind,
    pub vehicle_class: VehicleClass,
    pub distance_miles: f64,
    pub hours: f64,
}

/// Rough price from the estimator, rounded to whole currency units
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceEstimate {
    pub service: ServiceKind,
    pub vehicle_class: VehicleClass,
    pub amount_cents: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("No estimator rate configured for service: {0}")]
    NoRate(String),

    #[error("Invalid estimate input: {0}")]
    InvalidInput(String),
}

/// Computes trip prices and promo discounts
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(mut config: PricingConfig) -> Self {
        // Config sources may change key case; lookups use normalized keys.
        config.promo_codes = config.promo_codes
            .into_iter()
            .map(|(code, pct)| (code.trim().to_ascii_uppercase(), pct.min(100)))
            .collect();
        config.service_base_fares_cents = config.service_base_fares_cents
            .into_iter()
            .map(|(service, cents)| (service.to_ascii_lowercase(), cents))
            .collect();
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Price a vehicle for a service, applying `promo` when given.
    ///
    /// Always starts from the vehicle's own subtotal, so re-pricing after a
    /// vehicle change never compounds an earlier discount.
    pub fn compute_price(&self, vehicle: &Vehicle, service: ServiceKind, promo: Option<&str>) -> PriceQuote {
        let subtotal_cents = self.subtotal_cents(vehicle, service);

        let promo = match promo.and_then(normalize_promo) {
            None => PromoOutcome::None,
            Some(code) => match self.config.promo_codes.get(&code) {
                Some(&percent) => PromoOutcome::Applied { code, percent },
                None => PromoOutcome::Invalid { code },
            },
        };

        let discount_cents = match &promo {
            PromoOutcome::Applied { percent, .. } => percent_of(subtotal_cents, *percent),
            _ => 0,
        };

        PriceQuote {
            subtotal_cents,
            discount_cents,
            total_cents: subtotal_cents - discount_cents,
            promo,
        }
    }

    /// `base × vehicle multiplier × service/class multiplier`, rounded to cents
    pub fn subtotal_cents(&self, vehicle: &Vehicle, service: ServiceKind) -> i64 {
        let base = vehicle.base_price_cents
            .unwrap_or_else(|| self.base_fare_cents(service));
        let multiplier = vehicle.multiplier() * self.service_class_multiplier(service, vehicle.class());

        let subtotal = if multiplier == 1.0 {
            base
        } else {
            (base as f64 * multiplier).round() as i64
        };
        subtotal.max(0)
    }

    fn base_fare_cents(&self, service: ServiceKind) -> i64 {
        self.config.service_base_fares_cents
            .get(service.as_str())
            .copied()
            .unwrap_or(0)
    }

    fn service_class_multiplier(&self, service: ServiceKind, class: VehicleClass) -> f64 {
        self.config.service_class_multipliers
            .get(service.as_str())
            .and_then(|classes| classes.get(class.as_str()))
            .copied()
            .unwrap_or(1.0)
    }

    /// Marketing-page estimate: per-service fare scaled by vehicle class
    pub fn estimate(&self, request: &EstimateRequest) -> Result<PriceEstimate, PricingError> {
        if request.distance_miles < 0.0 || request.hours < 0.0 {
            return Err(PricingError::InvalidInput(
                "distance and hours must not be negative".to_string(),
            ));
        }

        let rate = self.config.estimator.services
            .get(request.service.as_str())
            .ok_or_else(|| PricingError::NoRate(request.service.as_str().to_string()))?;

        let fare = match request.service {
            ServiceKind::Hourly => rate.per_hour_cents as f64 * request.hours,
            _ => rate.base_cents as f64 + rate.per_mile_cents as f64 * request.distance_miles,
        };

        let class_multiplier = self.config.estimator.class_multipliers
            .get(request.vehicle_class.as_str())
            .copied()
            .unwrap_or(1.0);

        let whole_units = (fare * class_multiplier / 100.0).round() as i64;

        Ok(PriceEstimate {
            service: request.service,
            vehicle_class: request.vehicle_class,
            amount_cents: whole_units.saturating_mul(100),
        })
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

/// Trim and uppercase a promo code; blank input means "no code"
pub fn normalize_promo(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_ascii_uppercase())
    }
}

// Half-up rounding to the cent. Widened so any i64 subtotal fits.
fn percent_of(cents: i64, percent: u32) -> i64 {
    let scaled = (cents as i128 * percent.min(100) as i128 + 50) / 100;
    i64::try_from(scaled).unwrap_or(i64::MAX)
}

/// Render cents as `$90.00`
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{}${}.{:02}", sign, cents / 100, cents % 100)
}
