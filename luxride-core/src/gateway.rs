use crate::models::BookingDraft;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayReceipt {
    pub reference: String,
    pub accepted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("Booking rejected: {0}")]
    Rejected(String),
    #[error("Booking service unavailable: {0}")]
    Unavailable(String),
}

/// Backend call made when the customer confirms a booking
#[async_trait]
pub trait ConfirmationGateway: Send + Sync {
    async fn submit(&self, draft: &BookingDraft) -> Result<GatewayReceipt, GatewayError>;
}
