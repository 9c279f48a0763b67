//! Quiet-period debouncing for rapidly changing filter input.
//!
//! Tick-polled rather than timer-per-keystroke: the caller pushes every
//! change as it happens and polls on its event-loop tick, the same way the
//! search debounce works in a UI loop. Uses `tokio::time::Instant` so tests
//! can drive it with paused time.

use std::time::Duration;
use tokio::time::Instant;

/// Delays propagation of a changing value until it has been stable for a
/// full quiet period.
///
/// Pushing a new value supersedes any pending emission and restarts the
/// clock; pushing a value equal to the pending one leaves the clock alone,
/// so a held-down key does not postpone emission forever.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T: PartialEq> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a change. The previous pending value, if any, is dropped.
    pub fn push(&mut self, value: T) {
        match &self.pending {
            Some((pending, _)) if *pending == value => {}
            _ => self.pending = Some((value, Instant::now())),
        }
    }

    /// Emit the pending value if it has been quiet long enough.
    ///
    /// Call once per event-loop tick. Returns at most one value per push
    /// sequence; after emission the debouncer is empty.
    pub fn poll(&mut self) -> Option<T> {
        match &self.pending {
            Some((_, since)) if since.elapsed() >= self.quiet => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    /// True if a value is waiting out its quiet period.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending emission (e.g. an explicit submit supersedes it).
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    const QUIET: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn test_emits_after_quiet_period() {
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.push("rust");

        advance(Duration::from_millis(499)).await;
        assert_eq!(debouncer.poll(), None);

        advance(Duration::from_millis(1)).await;
        assert_eq!(debouncer.poll(), Some("rust"));
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_collapses_to_final_value() {
        // "reactjs" typed character by character within the quiet window
        // must produce exactly one emission, for the final string.
        let mut debouncer = Debouncer::new(QUIET);
        let mut emitted = Vec::new();

        for prefix in ["r", "re", "rea", "reac", "react", "reactj", "reactjs"] {
            debouncer.push(prefix.to_string());
            advance(Duration::from_millis(80)).await;
            if let Some(value) = debouncer.poll() {
                emitted.push(value);
            }
        }
        advance(QUIET).await;
        if let Some(value) = debouncer.poll() {
            emitted.push(value);
        }

        assert_eq!(emitted, vec!["reactjs".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_push_restarts_clock() {
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.push("a");
        advance(Duration::from_millis(400)).await;
        debouncer.push("b");
        advance(Duration::from_millis(400)).await;
        // 800ms since "a" but only 400ms since "b"
        assert_eq!(debouncer.poll(), None);
        advance(Duration::from_millis(100)).await;
        assert_eq!(debouncer.poll(), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_equal_push_does_not_restart_clock() {
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.push("same");
        advance(Duration::from_millis(400)).await;
        debouncer.push("same");
        advance(Duration::from_millis(100)).await;
        assert_eq!(debouncer.poll(), Some("same"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending() {
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.push("doomed");
        debouncer.cancel();
        advance(QUIET).await;
        assert_eq!(debouncer.poll(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_without_push_is_none() {
        let mut debouncer: Debouncer<String> = Debouncer::new(QUIET);
        advance(QUIET).await;
        assert_eq!(debouncer.poll(), None);
    }
}
