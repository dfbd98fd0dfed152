use crate::events::WizardEvent;
use chrono::Utc;
use luxride_core::BookingNumber;
use luxride_shared::{RideStatus, RideStatusEvent};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

/// Walks a confirmed booking through the cosmetic ride statuses on a fixed
/// cadence. Nothing is retried or stored. Dropping the ticker stops it.
pub struct StatusTicker {
    handle: JoinHandle<()>,
}

impl StatusTicker {
    /// The first status goes out immediately, the rest one `interval` apart
    pub fn start(number: BookingNumber, interval: Duration, events: broadcast::Sender<WizardEvent>) -> Self {
        let handle = tokio::spawn(async move {
            // tokio intervals panic on a zero period
            let mut ticks = tokio::time::interval(interval.max(Duration::from_millis(1)));

            for (index, status) in RideStatus::SEQUENCE.into_iter().enumerate() {
                ticks.tick().await;
                debug!("{}: {}", number, status.message());

                // Nobody listening is fine
                let _ = events.send(WizardEvent::RideStatus(RideStatusEvent {
                    booking_number: number.to_string(),
                    status,
                    sequence: index as u8 + 1,
                    timestamp: Utc::now(),
                }));
            }
        });

        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for StatusTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
