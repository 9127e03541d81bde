//! Wallet sync orchestrator for one engine session.
//!
//! This module defines the `SyncOrchestrator`, which owns the wallet engine for the lifetime of a
//! session and drives it from `start` to `stop`. It opens (or recovers) the wallet, points it at
//! the selected daemon, registers itself as the engine's event sink and then turns the engine's
//! block/update/refresh events into sync state transitions and observer notifications.
//!
//! The orchestrator is responsible for:
//! - Opening and initialising the wallet, reporting start-up progress
//! - Coalescing high-frequency block events so observers see a bounded notification rate
//! - Keeping the daemon height cache and connection status current without flooding the daemon
//! - Detecting the synchronized/unsynchronized transition and new transactions during catch-up
//! - Tearing the session down (optionally storing first), idempotently
//!
//! Engine events arrive over an unbounded single-consumer channel and are handled one at a time
//! by whoever drives [`SyncOrchestrator::next_event`], normally the session task.

use crate::node::Endpoint;
use crate::wallet::WalletSyncError;
use crate::wallet::engine::{EngineEvent, OpenRequest, WalletEngine};
use crate::wallet::sync::{
    daemon_status::DaemonStatusTracker,
    events::{ObserverSlot, SessionObserver},
    progress_tracker::RefreshListenerState,
};
use crate::wallet::types::{ConnectionStatus, Progress, SyncState, WalletSnapshot, WalletStatus};

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Configuration for a wallet session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Block events closer together than this are dropped
    pub block_coalesce_window: Duration,
    /// Minimum age of the daemon height cache before the engine is asked again
    pub daemon_status_interval: Duration,
    /// Store the wallet when the session task shuts down on its own
    pub store_on_stop: bool,
    /// Capacity of the session command queue
    pub command_queue: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            block_coalesce_window: Duration::from_millis(2000),
            daemon_status_interval: Duration::from_millis(120_000),
            store_on_stop: true,
            command_queue: 32,
        }
    }
}

/// Mutable view of an active session handed to the transaction coordinator.
pub struct SessionParts<'a, E: WalletEngine> {
    pub engine: &'a mut E,
    pub observers: &'a ObserverSlot,
    pub listener: &'a mut RefreshListenerState,
}

/// Owns one wallet engine session and its sync state machine.
pub struct SyncOrchestrator<E: WalletEngine> {
    engine: E,
    config: SessionConfig,
    state: SyncState,
    observers: ObserverSlot,
    /// Present exactly while an engine session is open
    listener: Option<RefreshListenerState>,
    daemon: DaemonStatusTracker,
    events: Option<mpsc::UnboundedReceiver<EngineEvent>>,
}

impl<E: WalletEngine> SyncOrchestrator<E> {
    pub fn new(engine: E, config: SessionConfig) -> Self {
        let daemon = DaemonStatusTracker::new(config.daemon_status_interval);
        Self {
            engine,
            config,
            state: SyncState::Idle,
            observers: ObserverSlot::new(),
            listener: None,
            daemon,
            events: None,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.daemon.status()
    }

    pub fn daemon_height(&self) -> u64 {
        self.daemon.height()
    }

    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    pub fn observers(&self) -> &ObserverSlot {
        &self.observers
    }

    pub fn set_observer(&mut self, observer: Option<Arc<dyn SessionObserver>>) {
        self.observers.set(observer);
    }

    /// Borrow the engine and the bookkeeping needed to build and send transactions.
    ///
    /// `None` unless a session is active.
    pub fn session_mut(&mut self) -> Option<SessionParts<'_, E>> {
        let listener = self.listener.as_mut()?;
        Some(SessionParts {
            engine: &mut self.engine,
            observers: &self.observers,
            listener,
        })
    }

    /// Open the wallet and start syncing it against `daemon`.
    ///
    /// Returns the engine's status. A non-OK status leaves the session in `Error`; calling
    /// `start` again begins a new session.
    pub async fn start(&mut self, request: &OpenRequest, daemon: &Endpoint) -> WalletStatus {
        if self.is_active() {
            info!("Wallet {} already running", request.name);
            let status = self.engine.full_status();
            self.observers.notify(|o| o.on_wallet_started(&status));
            return status;
        }

        info!("Starting wallet {} against {}", request.name, daemon);
        self.set_state(SyncState::Starting);
        self.daemon = DaemonStatusTracker::new(self.config.daemon_status_interval);
        self.progress(Progress::Percent(10));

        let device = self.engine.query_device(request).await;
        debug!("Wallet {} uses device {:?}", request.name, device);
        self.observers.notify(|o| o.on_wallet_open(device));

        let status = self.engine.open_or_recover(request).await;
        if !status.is_ok() {
            return self.fail_start(status).await;
        }
        self.progress(Progress::Percent(60));

        let status = self.engine.init(daemon).await;
        if !status.is_ok() {
            return self.fail_start(status).await;
        }
        self.progress(Progress::Percent(90));

        let (sink, events) = mpsc::unbounded_channel();
        self.engine.set_listener(Some(sink));
        self.events = Some(events);
        self.listener = Some(RefreshListenerState::new(
            self.config.block_coalesce_window,
        ));
        self.engine.start_refresh().await;
        self.progress(Progress::Percent(100));

        self.progress(Progress::Message("connecting to daemon".to_string()));
        self.daemon.refresh(&self.engine, 0).await;
        let height = self.engine.block_chain_height();
        let state = self.derive_sync_state(height);
        self.set_state(state);
        info!(
            "Wallet {} started at height {}, daemon at {} ({:?})",
            request.name,
            height,
            self.daemon.height(),
            self.daemon.status()
        );

        let status = self.engine.full_status();
        self.observers.notify(|o| o.on_wallet_started(&status));
        if !status.is_ok() {
            error!("Wallet {} reported {} after start", request.name, status.error_message());
            self.teardown().await;
            self.set_state(SyncState::Error(status.error_message().to_string()));
        }
        status
    }

    async fn fail_start(&mut self, status: WalletStatus) -> WalletStatus {
        let err = WalletSyncError::SessionOpenFailure(status.error_message().to_string());
        error!("{}", err);
        self.engine.close().await;
        self.set_state(SyncState::Error(status.error_message().to_string()));
        self.observers.notify(|o| o.on_wallet_started(&status));
        status
    }

    /// Stop the session, storing the wallet first if `save` is set.
    ///
    /// Always detaches the observer. Without an active session this is a no-op otherwise.
    pub async fn stop(&mut self, save: bool) {
        debug!("Stopping wallet session (save: {})", save);
        if self.is_active() {
            if save {
                self.store_and_report().await;
            }
            self.teardown().await;
            self.set_state(SyncState::Stopped);
        }
        self.observers.detach();
    }

    async fn teardown(&mut self) {
        self.engine.set_listener(None);
        self.engine.pause_refresh().await;
        self.engine.dispose_pending_transaction();
        let closed = self.engine.close().await;
        info!("Wallet session closed (clean: {})", closed);
        self.listener = None;
        self.events = None;
    }

    /// Persist the wallet of the active session and report the outcome to the observer.
    pub async fn store(&mut self) -> Result<bool, WalletSyncError> {
        if !self.is_active() {
            return Err(WalletSyncError::NoActiveSession);
        }
        Ok(self.store_and_report().await)
    }

    async fn store_and_report(&mut self) -> bool {
        let stored = self.engine.store().await;
        if !stored {
            warn!(
                "{}",
                WalletSyncError::StoreFailure(self.engine.full_status().error_message().to_string())
            );
        }
        self.observers.notify(|o| o.on_wallet_stored(stored));
        stored
    }

    /// Wait for the next engine event of the active session.
    ///
    /// Pends forever when no session is active, so it can sit in a `select!` next to other
    /// sources.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        let events = match self.events.as_mut() {
            Some(events) => events,
            None => return std::future::pending().await,
        };
        let event = events.recv().await;
        if event.is_none() {
            debug!("Engine event channel closed");
            self.events = None;
        }
        event
    }

    /// Handle one engine event.
    pub async fn handle_event(&mut self, event: EngineEvent) {
        if !self.is_active() {
            debug!("Ignoring {:?} outside of an active session", event);
            return;
        }

        match event {
            EngineEvent::BlockArrived(height) => self.on_block_arrived(height).await,
            EngineEvent::Updated => {
                debug!("Wallet updated");
                if let Some(listener) = self.listener.as_mut() {
                    listener.mark_updated();
                }
            }
            EngineEvent::Refreshed => self.on_refreshed().await,
        }
    }

    async fn on_block_arrived(&mut self, height: u64) {
        let Some(listener) = self.listener.as_mut() else {
            return;
        };
        if !listener.accept_block_event(Instant::now()) {
            return;
        }
        debug!("Block {} arrived", height);

        // while catching up the event height is the wallet's, not the daemon's
        let synchronized = self.engine.is_synchronized();
        let observed = if synchronized { height } else { 0 };
        self.daemon.refresh(&self.engine, observed).await;

        let mut full = false;
        if !synchronized {
            self.engine.refresh_history().await;
            let count = self.engine.history_count();
            if let Some(listener) = self.listener.as_mut() {
                listener.mark_updated();
                full = listener.record_transaction_count(count);
            }
        }

        let state = self.derive_sync_state(height);
        self.set_state(state);
        let daemon_height = self.daemon.height();
        if let Some(listener) = self.listener.as_mut() {
            listener.log_progress(height, daemon_height, false);
        }

        let snapshot = self.snapshot();
        self.observers.refreshed(&snapshot, full);
    }

    async fn on_refreshed(&mut self) {
        debug!("Wallet refreshed to the chain tip");
        self.engine.set_synchronized();
        self.set_state(SyncState::Synced);

        let updated = self.listener.as_ref().is_some_and(|l| l.is_updated());
        if !updated {
            return;
        }

        let height = self.engine.block_chain_height();
        self.daemon.refresh(&self.engine, height).await;
        self.engine.refresh_history().await;
        let count = self.engine.history_count();
        let daemon_height = self.daemon.height();

        let snapshot = self.snapshot();
        let answer = self.observers.refreshed(&snapshot, true);
        if let Some(listener) = self.listener.as_mut() {
            listener.record_transaction_count(count);
            listener.log_progress(height, daemon_height, true);
            // keep the flag while nobody has seen this refresh or the observer asked for more
            if let Some(wants_more) = answer {
                listener.set_updated(wants_more);
            }
        }
    }

    fn set_state(&mut self, state: SyncState) {
        if self.state == state {
            return;
        }
        debug!("Sync state {} -> {}", self.state, state);
        self.state = state;
        let state = &self.state;
        self.observers.notify(|o| o.on_sync_state(state));
    }

    fn derive_sync_state(&self, height: u64) -> SyncState {
        let daemon_height = self.daemon.height();
        if self.engine.is_synchronized() || (daemon_height > 0 && height >= daemon_height) {
            return SyncState::Synced;
        }
        if daemon_height > 0 {
            return SyncState::Syncing {
                blocks_remaining: daemon_height - height,
            };
        }
        match &self.state {
            SyncState::Syncing { blocks_remaining } => SyncState::Syncing {
                blocks_remaining: *blocks_remaining,
            },
            _ => SyncState::Syncing {
                blocks_remaining: 0,
            },
        }
    }

    /// Current view of the wallet as delivered to observers.
    pub fn snapshot(&self) -> WalletSnapshot {
        let block_height = self.engine.block_chain_height();
        let daemon_height = self.daemon.height();
        let blocks_remaining = match &self.state {
            SyncState::Syncing { blocks_remaining } => *blocks_remaining,
            _ => 0,
        };
        WalletSnapshot {
            block_height,
            daemon_height,
            blocks_remaining,
            balance: self.engine.balance(),
            unlocked_balance: self.engine.unlocked_balance(),
            transaction_count: self.engine.history_count(),
            synchronized: self.engine.is_synchronized(),
            connection: self.daemon.status(),
            state: self.state.clone(),
            taken_at: chrono::Utc::now(),
        }
    }

    fn progress(&self, progress: Progress) {
        debug!("Start progress: {:?}", progress);
        self.observers.notify(|o| o.on_progress(&progress));
    }
}
