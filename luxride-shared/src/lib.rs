pub mod models;
pub mod pii;

pub use models::events::{BookingConfirmedEvent, RideStatus, RideStatusEvent};
pub use pii::Masked;
