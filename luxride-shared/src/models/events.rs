use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cosmetic ride progress shown after a booking is confirmed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Confirmed,
    DriverAssigned,
    EnRoute,
    Arrived,
}

impl RideStatus {
    /// Order in which the status ticker walks through the states
    pub const SEQUENCE: [RideStatus; 4] = [
        RideStatus::Confirmed,
        RideStatus::DriverAssigned,
        RideStatus::EnRoute,
        RideStatus::Arrived,
    ];

    pub fn message(&self) -> &'static str {
        match self {
            RideStatus::Confirmed => "Booking confirmed",
            RideStatus::DriverAssigned => "Driver assigned",
            RideStatus::EnRoute => "Vehicle en route",
            RideStatus::Arrived => "Arrived",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, RideStatus::Arrived)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RideStatusEvent {
    pub booking_number: String,
    pub status: RideStatus,
    pub sequence: u8,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BookingConfirmedEvent {
    pub booking_number: String,
    pub session_id: String,
    pub total_cents: i64,
    pub timestamp: DateTime<Utc>,
}
