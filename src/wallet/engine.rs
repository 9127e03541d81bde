//! Capability interface of the external wallet engine.
//!
//! The engine does key handling, output scanning, transaction construction and daemon RPC. This
//! crate only orchestrates it, so everything the orchestrator and the coordinator need is expressed
//! as the [`WalletEngine`] trait. Implementations over a blocking native library are expected to
//! move their work onto a blocking pool inside the async methods.

use crate::node::Endpoint;
use crate::transaction::TxParams;
use crate::wallet::types::{WalletDevice, WalletStatus};

use tokio::sync::mpsc;

/// Asynchronous notifications emitted by the engine while it refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A block at `height` has been scanned.
    BlockArrived(u64),
    /// Wallet contents changed (outputs received or spent).
    Updated,
    /// The refresh reached the daemon's chain tip.
    Refreshed,
}

/// Sending side of the engine event channel registered with [`WalletEngine::set_listener`].
pub type EventSink = mpsc::UnboundedSender<EngineEvent>;

/// Opaque engine failure carrying the engine's own error string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct EngineError(pub String);

/// Seed material for recovering a wallet that has no files yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverySeed {
    pub mnemonic: String,
    pub restore_height: u64,
}

/// What to open: an existing wallet, or a recovery when the wallet files are missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub name: String,
    pub password: String,
    pub recovery: Option<RecoverySeed>,
}

impl OpenRequest {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            recovery: None,
        }
    }

    pub fn with_recovery(mut self, mnemonic: impl Into<String>, restore_height: u64) -> Self {
        self.recovery = Some(RecoverySeed {
            mnemonic: mnemonic.into(),
            restore_height,
        });
        self
    }
}

/// Build status of a pending transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStatus {
    Ok,
    Error,
    Critical,
}

/// Snapshot of the engine-side pending transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub status: PendingStatus,
    pub error: Option<String>,
    pub tx_ids: Vec<String>,
    pub amount: u64,
    pub fee: u64,
}

impl PendingTransaction {
    pub fn is_ok(&self) -> bool {
        self.status == PendingStatus::Ok
    }

    /// Identifier of the first transaction; unavailable once committed.
    pub fn first_tx_id(&self) -> Option<&str> {
        self.tx_ids.first().map(String::as_str)
    }

    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("unknown error")
    }
}

/// How a pending transaction is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOptions {
    /// Relay to the daemon immediately.
    pub relay: bool,
}

impl CommitOptions {
    pub fn relay_now() -> Self {
        Self { relay: true }
    }
}

/// The external wallet engine, bound to at most one open wallet at a time.
#[async_trait::async_trait]
pub trait WalletEngine: Send + Sync {
    /// Which key device guards the wallet files named in `request`.
    async fn query_device(&self, request: &OpenRequest) -> WalletDevice;

    /// Open the wallet, recovering it from seed first if its files do not exist.
    async fn open_or_recover(&mut self, request: &OpenRequest) -> WalletStatus;

    /// Point the open wallet at a daemon.
    async fn init(&mut self, daemon: &Endpoint) -> WalletStatus;

    /// Register (or with `None`, remove) the event sink.
    fn set_listener(&mut self, sink: Option<EventSink>);

    async fn start_refresh(&mut self);

    async fn pause_refresh(&mut self);

    /// Reload the transaction history from the wallet cache.
    async fn refresh_history(&mut self);

    fn history_count(&self) -> usize;

    fn balance(&self) -> u64;

    fn unlocked_balance(&self) -> u64;

    /// Height the wallet has scanned up to.
    fn block_chain_height(&self) -> u64;

    /// Ask the daemon for its height. This is a network round trip; 0 means unreachable.
    async fn daemon_block_chain_height(&self) -> u64;

    fn is_synchronized(&self) -> bool;

    fn set_synchronized(&mut self);

    fn default_mixin(&self) -> u32;

    /// Build a pending transaction. The engine keeps it until disposed or committed.
    async fn create_transaction(&mut self, params: &TxParams) -> PendingTransaction;

    async fn create_sweep_unmixable_transaction(&mut self) -> PendingTransaction;

    fn pending_transaction(&self) -> Option<PendingTransaction>;

    fn dispose_pending_transaction(&mut self);

    async fn commit_pending_transaction(&mut self, options: &CommitOptions)
    -> Result<(), EngineError>;

    /// Persist the wallet to disk.
    async fn store(&mut self) -> bool;

    fn full_status(&self) -> WalletStatus;

    fn set_user_note(&mut self, txid: &str, note: &str) -> bool;

    async fn close(&mut self) -> bool;
}
