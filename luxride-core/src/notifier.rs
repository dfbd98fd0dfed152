use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Fire-and-forget user feedback. No return value, no error path.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Sends notifications to the log only
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => tracing::error!(target: "luxride::toast", "{}", message),
            Severity::Warning => tracing::warn!(target: "luxride::toast", "{}", message),
            _ => tracing::info!(target: "luxride::toast", "{}", message),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct TrayState {
    next_id: u64,
    toasts: Vec<Toast>,
}

/// Visible toasts. Each one auto-expires after `ttl` and can be dismissed early.
pub struct ToastTray {
    ttl: Duration,
    state: Mutex<TrayState>,
}

impl ToastTray {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(TrayState::default()),
        }
    }

    /// Build from a configured lifetime. Out-of-range values keep the 5s default.
    pub fn from_std(ttl: std::time::Duration) -> Self {
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| {
            tracing::warn!("Toast lifetime {:?} is out of range, using 5s", ttl);
            Duration::seconds(5)
        });
        Self::new(ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn push(&self, message: &str, severity: Severity, now: DateTime<Utc>) -> u64 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.toasts.retain(|t| t.expires_at > now);
        state.next_id += 1;
        let id = state.next_id;
        state.toasts.push(Toast {
            id,
            message: message.to_string(),
            severity,
            created_at: now,
            expires_at: now + self.ttl,
        });
        id
    }

    /// Toasts still on screen at `now`
    pub fn visible(&self, now: DateTime<Utc>) -> Vec<Toast> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.toasts.iter().filter(|t| t.expires_at > now).cloned().collect()
    }

    /// User clicked the toast
    pub fn dismiss(&self, id: u64) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let before = state.toasts.len();
        state.toasts.retain(|t| t.id != id);
        state.toasts.len() != before
    }

    /// Drop expired toasts, returning how many were removed
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let before = state.toasts.len();
        state.toasts.retain(|t| t.expires_at > now);
        before - state.toasts.len()
    }
}

impl Notifier for ToastTray {
    fn notify(&self, message: &str, severity: Severity) {
        self.push(message, severity, Utc::now());
    }
}
