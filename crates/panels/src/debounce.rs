use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Best-effort staleness control for interactive fetches.
///
/// Every fetch or keystroke takes a ticket; after an awaited step resolves,
/// the holder checks whether its ticket is still the newest. A stale ticket
/// means a newer interaction superseded this one and its result must be
/// discarded. Nothing is cancelled at the transport level.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Claims a new ticket, invalidating all earlier ones.
    pub fn ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether the ticket is still the newest.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Waits out the debounce delay, then reports whether the ticket
    /// survived it.
    pub async fn settle(&self, ticket: u64) -> bool {
        tokio::time::sleep(self.delay).await;
        self.is_current(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_invalidates_older_ones() {
        let debouncer = Debouncer::new(0);
        let first = debouncer.ticket();
        assert!(debouncer.is_current(first));
        let second = debouncer.ticket();
        assert!(!debouncer.is_current(first));
        assert!(debouncer.is_current(second));
    }

    #[tokio::test(start_paused = true)]
    async fn settle_reports_survival() {
        let debouncer = Debouncer::new(200);
        let first = debouncer.ticket();

        // A keystroke arriving during the delay kills the first ticket.
        let pending = debouncer.settle(first);
        let second = debouncer.ticket();
        assert!(!pending.await);
        assert!(debouncer.settle(second).await);
    }
}
