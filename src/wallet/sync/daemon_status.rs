//! Daemon height cache and connection status derivation.
//!
//! Asking the engine for the daemon height is a network round trip, so it is rate limited here:
//! a height learnt as a side effect of a block event is always taken and resets the timer, and
//! the engine is only asked again once the cache is older than the configured interval.

use crate::wallet::WalletSyncError;
use crate::wallet::engine::WalletEngine;
use crate::wallet::types::ConnectionStatus;

use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

/// Cached daemon height and the connection status derived from it
#[derive(Debug, Clone)]
pub struct DaemonStatusTracker {
    height: u64,
    last_update: Option<Instant>,
    status: ConnectionStatus,
    interval: Duration,
    /// Engine height queries actually issued
    probes_issued: u64,
}

impl DaemonStatusTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            height: 0,
            last_update: None,
            status: ConnectionStatus::Disconnected,
            interval,
            probes_issued: 0,
        }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn probes_issued(&self) -> u64 {
        self.probes_issued
    }

    /// Whether the cache is stale enough to ask the engine again.
    pub fn probe_due(&self, now: Instant) -> bool {
        match self.last_update {
            Some(last) => now.saturating_duration_since(last) > self.interval,
            None => true,
        }
    }

    /// Update the cache from an opportunistic height, or re-probe the engine when due.
    ///
    /// `observed_height` is 0 when the caller has no trustworthy daemon height at hand.
    pub async fn refresh<E: WalletEngine + ?Sized>(
        &mut self,
        engine: &E,
        observed_height: u64,
    ) -> ConnectionStatus {
        let now = Instant::now();

        if observed_height > 0 {
            self.height = observed_height;
            self.status = ConnectionStatus::Connected;
            self.last_update = Some(now);
            return self.status;
        }

        if !self.probe_due(now) {
            return self.status;
        }

        self.last_update = Some(now);
        self.probes_issued += 1;
        self.height = engine.daemon_block_chain_height().await;

        let status = if self.height > 0 {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        };
        if status != self.status {
            match status {
                ConnectionStatus::Connected => {
                    debug!("Daemon reachable again at height {}", self.height)
                }
                ConnectionStatus::Disconnected => warn!(
                    "{}",
                    WalletSyncError::DaemonUnreachable("daemon height query returned 0".into())
                ),
            }
        }
        self.status = status;
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEngine;

    const INTERVAL: Duration = Duration::from_millis(120_000);

    #[tokio::test(start_paused = true)]
    async fn throttles_engine_height_queries() {
        let engine = MockEngine::new();
        engine.with(|s| s.daemon_height = 3_000_000);
        let mut tracker = DaemonStatusTracker::new(INTERVAL);

        assert_eq!(tracker.refresh(&engine, 0).await, ConnectionStatus::Connected);
        tokio::time::advance(Duration::from_millis(119_999)).await;
        assert_eq!(tracker.refresh(&engine, 0).await, ConnectionStatus::Connected);

        assert_eq!(engine.with(|s| s.daemon_height_queries), 1);
        assert_eq!(tracker.probes_issued(), 1);

        tokio::time::advance(Duration::from_millis(2)).await;
        tracker.refresh(&engine, 0).await;
        assert_eq!(engine.with(|s| s.daemon_height_queries), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn opportunistic_height_refreshes_cache_and_resets_timer() {
        let engine = MockEngine::new();
        engine.with(|s| s.daemon_height = 0);
        let mut tracker = DaemonStatusTracker::new(INTERVAL);

        assert_eq!(tracker.refresh(&engine, 0).await, ConnectionStatus::Disconnected);
        tokio::time::advance(Duration::from_millis(119_000)).await;
        assert_eq!(
            tracker.refresh(&engine, 2_500).await,
            ConnectionStatus::Connected
        );
        assert_eq!(tracker.height(), 2_500);

        // timer restarted by the observed height
        tokio::time::advance(Duration::from_millis(100_000)).await;
        tracker.refresh(&engine, 0).await;
        assert_eq!(engine.with(|s| s.daemon_height_queries), 1);
        assert_eq!(tracker.status(), ConnectionStatus::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn degrades_and_recovers_connection_status() {
        let engine = MockEngine::new();
        engine.with(|s| s.daemon_height = 0);
        let mut tracker = DaemonStatusTracker::new(INTERVAL);

        assert_eq!(tracker.refresh(&engine, 0).await, ConnectionStatus::Disconnected);

        engine.with(|s| s.daemon_height = 10);
        tokio::time::advance(INTERVAL + Duration::from_millis(1)).await;
        assert_eq!(tracker.refresh(&engine, 0).await, ConnectionStatus::Connected);
        assert_eq!(tracker.height(), 10);
    }
}
