//! Observer interface for wallet session events.
//!
//! This module defines the `SessionObserver` trait implemented by the presentation layer and the
//! `ObserverSlot` through which the orchestrator and the transaction coordinator notify it. Engine
//! events themselves arrive as [`EngineEvent`](crate::wallet::engine::EngineEvent) values on the
//! session's event channel; what leaves the session towards the presentation layer goes through
//! here.
//!
//! Callbacks run on the session task. They must return quickly and must not call back into the
//! session synchronously.

use crate::transaction::TransferDraft;
use crate::wallet::engine::PendingTransaction;
use crate::wallet::types::{Progress, SyncState, WalletDevice, WalletSnapshot, WalletStatus};

use std::fmt;
use std::sync::Arc;

/// Trait for receiving wallet session events.
///
/// Only `on_refreshed` is mandatory; every other callback defaults to a no-op.
pub trait SessionObserver: Send + Sync {
    /// A refresh snapshot is available.
    ///
    /// `full` is set when the transaction list changed and should be re-rendered. Return `true`
    /// to request one more authoritative refresh on the next `Refreshed` engine event.
    fn on_refreshed(&self, snapshot: &WalletSnapshot, full: bool) -> bool;

    fn on_progress(&self, _progress: &Progress) {}

    /// The session moved to a different sync state.
    fn on_sync_state(&self, _state: &SyncState) {}

    fn on_wallet_stored(&self, _success: bool) {}

    fn on_transaction_created(&self, _tag: &str, _pending: &PendingTransaction) {}

    fn on_transaction_sent(&self, _txid: &str) {}

    fn on_send_transaction_failed(&self, _reason: &str) {}

    fn on_wallet_started(&self, _status: &WalletStatus) {}

    fn on_wallet_open(&self, _device: WalletDevice) {}

    /// The transfer draft changed (edited, or cleared after a successful send).
    fn on_draft_changed(&self, _draft: &TransferDraft) {}

    /// Get the name of this observer for logging and diagnostics.
    fn name(&self) -> &'static str {
        "SessionObserver"
    }
}

/// Holds the observer currently attached to a session, if any.
#[derive(Clone, Default)]
pub struct ObserverSlot {
    observer: Option<Arc<dyn SessionObserver>>,
}

impl ObserverSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `observer`, replacing any previous one. `None` detaches.
    pub fn set(&mut self, observer: Option<Arc<dyn SessionObserver>>) {
        match &observer {
            Some(o) => tracing::debug!("Attaching observer {}", o.name()),
            None => tracing::debug!("Detaching observer"),
        }
        self.observer = observer;
    }

    pub fn detach(&mut self) {
        self.set(None);
    }

    pub fn is_attached(&self) -> bool {
        self.observer.is_some()
    }

    /// Call `f` with the attached observer.
    ///
    /// Returns whether an observer was attached to receive the call.
    pub fn notify(&self, f: impl FnOnce(&dyn SessionObserver)) -> bool {
        match &self.observer {
            Some(observer) => {
                f(observer.as_ref());
                true
            }
            None => false,
        }
    }

    /// Deliver a refresh snapshot, returning the observer's answer if one is attached.
    pub fn refreshed(&self, snapshot: &WalletSnapshot, full: bool) -> Option<bool> {
        self.observer
            .as_ref()
            .map(|observer| observer.on_refreshed(snapshot, full))
    }
}

impl fmt::Debug for ObserverSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSlot")
            .field("observer", &self.observer.as_ref().map(|o| o.name()))
            .finish()
    }
}
