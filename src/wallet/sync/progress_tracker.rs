//! Refresh bookkeeping for an active wallet session.
//!
//! This module provides `RefreshListenerState`, the orchestrator's private record of how the engine
//! refresh is progressing: when the last block event was accepted (for coalescing), how many
//! transactions the history held at the last look, and whether the wallet changed since the last
//! authoritative refresh.

use tokio::time::{Duration, Instant};
use tracing::info;

/// Bookkeeping for the engine event handlers of one session
#[derive(Debug, Clone)]
pub struct RefreshListenerState {
    /// When the last block event was accepted
    last_block_event: Option<Instant>,
    /// Minimum spacing between accepted block events
    coalesce_window: Duration,
    /// Transaction count seen at the last history refresh
    last_transaction_count: usize,
    /// Set by `Updated` events and successful sends, cleared after an authoritative refresh
    updated: bool,
    /// Block events accepted and dropped so far
    accepted_events: u64,
    dropped_events: u64,
    /// Height at which we last logged progress
    last_logged_height: u64,
}

impl RefreshListenerState {
    /// Create the state for a freshly started session.
    ///
    /// Starts out "updated" so the first `Refreshed` event always produces a full refresh.
    pub fn new(coalesce_window: Duration) -> Self {
        Self {
            last_block_event: None,
            coalesce_window,
            last_transaction_count: 0,
            updated: true,
            accepted_events: 0,
            dropped_events: 0,
            last_logged_height: 0,
        }
    }

    /// Decide whether a block event arriving at `now` is processed or dropped.
    pub fn accept_block_event(&mut self, now: Instant) -> bool {
        let due = match self.last_block_event {
            Some(last) => now.saturating_duration_since(last) >= self.coalesce_window,
            None => true,
        };

        if due {
            self.last_block_event = Some(now);
            self.accepted_events += 1;
        } else {
            self.dropped_events += 1;
        }
        due
    }

    /// Record the current history size; returns true if it grew.
    pub fn record_transaction_count(&mut self, count: usize) -> bool {
        if count > self.last_transaction_count {
            self.last_transaction_count = count;
            true
        } else {
            false
        }
    }

    pub fn mark_updated(&mut self) {
        self.updated = true;
    }

    pub fn set_updated(&mut self, updated: bool) {
        self.updated = updated;
    }

    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// Log progress every 1000 blocks or when forced
    pub fn log_progress(&mut self, height: u64, daemon_height: u64, force: bool) {
        let blocks_since_last_log = height.saturating_sub(self.last_logged_height);
        if force || blocks_since_last_log >= 1000 {
            info!(
                "Refresh progress: height {} of {} ({} block events accepted, {} coalesced)",
                height, daemon_height, self.accepted_events, self.dropped_events
            );
            self.last_logged_height = height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesces_block_events_inside_window() {
        let mut state = RefreshListenerState::new(Duration::from_millis(2000));
        let start = Instant::now();

        assert!(state.accept_block_event(start));
        for ms in (100..2000).step_by(100) {
            assert!(!state.accept_block_event(start + Duration::from_millis(ms)));
        }
        assert!(state.accept_block_event(start + Duration::from_millis(2000)));
        assert!(!state.accept_block_event(start + Duration::from_millis(3999)));

        assert_eq!(state.accepted_events, 2);
        assert_eq!(state.dropped_events, 20);
    }

    #[test]
    fn transaction_count_only_reports_growth() {
        let mut state = RefreshListenerState::new(Duration::from_millis(2000));
        assert!(!state.record_transaction_count(0));
        assert!(state.record_transaction_count(3));
        assert!(!state.record_transaction_count(3));
        assert!(!state.record_transaction_count(2));
        assert_eq!(state.last_transaction_count, 3);
    }

    #[test]
    fn starts_updated() {
        let mut state = RefreshListenerState::new(Duration::from_millis(2000));
        assert!(state.is_updated());
        state.set_updated(false);
        assert!(!state.is_updated());
        state.mark_updated();
        assert!(state.is_updated());
    }
}
