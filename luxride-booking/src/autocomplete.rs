use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Queries shorter than this get no suggestions
pub const MIN_QUERY_CHARS: usize = 2;

/// Fixed list of known addresses offered while typing pickup/dropoff
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    addresses: Vec<String>,
}

impl AddressBook {
    pub fn new(addresses: Vec<String>) -> Self {
        Self { addresses }
    }

    /// Case-insensitive substring match, in list order
    pub fn suggest(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }

        let needle = query.to_lowercase();
        self.addresses
            .iter()
            .filter(|address| address.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Runs only the most recently scheduled task, after a quiet period.
/// Scheduling again aborts whatever is still waiting.
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn book() -> AddressBook {
        AddressBook::new(vec![
            "123 Main Street, Downtown".to_string(),
            "456 Airport Road, Terminal 1".to_string(),
            "789 Business Plaza, Suite 100".to_string(),
        ])
    }

    #[test]
    fn test_case_insensitive_substring() {
        assert_eq!(book().suggest("AIRPORT"), vec!["456 Airport Road, Terminal 1".to_string()]);
        assert_eq!(book().suggest("ai").len(), 2);
        assert!(book().suggest("harbour").is_empty());
    }

    #[test]
    fn test_short_queries_ignored() {
        assert!(book().suggest("1").is_empty());
        assert!(book().suggest("  a ").is_empty());
        assert_eq!(book().suggest("12").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_query_cancels_pending_one() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(250));

        for query in ["ma", "mai", "main"] {
            let fired = fired.clone();
            debouncer.schedule(async move {
                fired.lock().unwrap().push(query);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(*fired.lock().unwrap(), vec!["main"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_task() {
        let fired = Arc::new(Mutex::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(250));

        let counter = fired.clone();
        debouncer.schedule(async move {
            *counter.lock().unwrap() += 1;
        });
        debouncer.cancel();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*fired.lock().unwrap(), 0);
    }
}
