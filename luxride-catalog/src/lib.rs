pub mod service;
pub mod vehicle;
pub mod catalog;
pub mod source;
pub mod pricing;

pub use service::ServiceKind;
pub use vehicle::{Capacity, Vehicle, VehicleClass};
pub use catalog::{CatalogError, VehicleCatalog};
pub use source::{load_with_retry, CatalogSource, EmbeddedCatalog, FileCatalog};
pub use pricing::{
    format_cents, normalize_promo, EstimateRequest, PriceEstimate, PriceQuote, PricingConfig,
    PricingEngine, PricingError, PromoOutcome,
};
