use async_trait::async_trait;
use chrono::Utc;
use luxride_core::{
    BookingDraft, BookingHistoryRepository, BookingNumber, BookingRecord, ConfirmationGateway, CoreError,
    GatewayError, GatewayReceipt,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ConfirmationError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ConfirmationError {
    /// Text for the error toast
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfirmationError::Gateway(_) => "We couldn't confirm your booking. Please try again.",
            ConfirmationError::Core(CoreError::ValidationError(_)) => "Your booking is incomplete. Please review it and try again.",
            ConfirmationError::Core(_) => "Your booking could not be saved. Please try again.",
        }
    }
}

/// Stand-in backend: waits a fixed latency, then accepts, or fails with the
/// configured probability.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    latency: Duration,
    failure_rate: f64,
}

impl SimulatedGateway {
    pub fn new(latency: Duration, failure_rate: f64) -> Self {
        let failure_rate = if failure_rate.is_nan() { 0.0 } else { failure_rate.clamp(0.0, 1.0) };
        Self { latency, failure_rate }
    }

    /// Always fails after `latency`
    pub fn failing(latency: Duration) -> Self {
        Self::new(latency, 1.0)
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

#[async_trait]
impl ConfirmationGateway for SimulatedGateway {
    async fn submit(&self, _draft: &BookingDraft) -> Result<GatewayReceipt, GatewayError> {
        tokio::time::sleep(self.latency).await;

        if self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate) {
            return Err(GatewayError::Unavailable("simulated outage".to_string()));
        }

        Ok(GatewayReceipt {
            reference: format!("SIM-{}", Uuid::new_v4().simple()),
            accepted_at: Utc::now(),
        })
    }
}

/// Turns a reviewed draft into a stored booking
#[derive(Clone)]
pub struct ConfirmationService {
    gateway: Arc<dyn ConfirmationGateway>,
    history: Arc<dyn BookingHistoryRepository>,
}

impl ConfirmationService {
    pub fn new(gateway: Arc<dyn ConfirmationGateway>, history: Arc<dyn BookingHistoryRepository>) -> Self {
        Self { gateway, history }
    }

    /// Submit the draft, then append the resulting record to the history.
    ///
    /// The record is built before the gateway call, so an incomplete draft
    /// never reaches the backend.
    pub async fn confirm(&self, draft: BookingDraft) -> Result<BookingRecord, ConfirmationError> {
        let record = BookingRecord::from_draft(BookingNumber::generate(), &draft)?;

        let receipt = match self.gateway.submit(&draft).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!("Confirmation gateway failed for {}: {}", record.number, e);
                return Err(e.into());
            }
        };

        self.history.append(&record).await?;
        info!(
            "Booking {} confirmed (gateway ref {}, total {} cents)",
            record.number, receipt.reference, record.total_cents()
        );
        Ok(record)
    }
}
