//! Test doubles shared by the unit tests: a scripted in-memory wallet engine and an observer that
//! records every callback.

use crate::node::Endpoint;
use crate::transaction::{TransferDraft, TxParams};
use crate::wallet::engine::{
    CommitOptions, EngineError, EngineEvent, EventSink, OpenRequest, PendingStatus,
    PendingTransaction, WalletEngine,
};
use crate::wallet::sync::events::SessionObserver;
use crate::wallet::types::{Progress, SyncState, WalletDevice, WalletSnapshot, WalletStatus};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Everything the mock engine knows, plus counters the tests assert on
#[derive(Debug)]
pub struct MockState {
    pub device: WalletDevice,
    pub open_status: WalletStatus,
    pub init_status: WalletStatus,
    pub status: WalletStatus,
    pub opened: Option<OpenRequest>,
    pub daemon: Option<Endpoint>,
    pub block_height: u64,
    pub daemon_height: u64,
    pub daemon_height_queries: u64,
    pub synchronized: bool,
    pub history: usize,
    pub history_refreshes: u64,
    pub balance: u64,
    pub unlocked: u64,
    pub default_mixin: u32,
    pub listener: Option<EventSink>,
    pub refreshing: bool,
    pub closed: bool,
    pub closes: u64,
    pub pending: Option<PendingTransaction>,
    /// Builds that found an undisposed pending transaction
    pub leaked_pending: u64,
    pub created: u64,
    pub last_params: Option<TxParams>,
    pub build_error: Option<String>,
    pub commit_error: Option<String>,
    pub committed: Vec<String>,
    pub store_ok: bool,
    pub stores: u64,
    pub notes: Vec<(String, String)>,
    next_txid: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            device: WalletDevice::Software,
            open_status: WalletStatus::ok(),
            init_status: WalletStatus::ok(),
            status: WalletStatus::ok(),
            opened: None,
            daemon: None,
            block_height: 0,
            daemon_height: 0,
            daemon_height_queries: 0,
            synchronized: false,
            history: 0,
            history_refreshes: 0,
            balance: 0,
            unlocked: 0,
            default_mixin: 15,
            listener: None,
            refreshing: false,
            closed: false,
            closes: 0,
            pending: None,
            leaked_pending: 0,
            created: 0,
            last_params: None,
            build_error: None,
            commit_error: None,
            committed: Vec::new(),
            store_ok: true,
            stores: 0,
            notes: Vec::new(),
            next_txid: 1,
        }
    }
}

impl MockState {
    fn build(&mut self, amount: u64) -> PendingTransaction {
        if self.pending.is_some() {
            self.leaked_pending += 1;
        }
        self.created += 1;

        let pending = match &self.build_error {
            Some(error) => PendingTransaction {
                status: PendingStatus::Error,
                error: Some(error.clone()),
                tx_ids: Vec::new(),
                amount,
                fee: 0,
            },
            None => {
                let txid = format!("{:064x}", self.next_txid);
                self.next_txid += 1;
                PendingTransaction {
                    status: PendingStatus::Ok,
                    error: None,
                    tx_ids: vec![txid],
                    amount,
                    fee: 30_000_000,
                }
            }
        };
        self.pending = Some(pending.clone());
        pending
    }
}

/// Cloneable handle to a shared [`MockState`]
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A wallet recovered at `restore_height` against a daemon at `daemon_height`.
    pub fn recovered(restore_height: u64, daemon_height: u64) -> Self {
        let engine = Self::new();
        engine.with(|s| {
            s.block_height = restore_height;
            s.daemon_height = daemon_height;
            s.balance = 5_000_000_000_000;
            s.unlocked = 4_000_000_000_000;
        });
        engine
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    /// Push an event through the registered sink; false if none is registered.
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.with(|s| match &s.listener {
            Some(sink) => sink.send(event).is_ok(),
            None => false,
        })
    }
}

#[async_trait::async_trait]
impl WalletEngine for MockEngine {
    async fn query_device(&self, _request: &OpenRequest) -> WalletDevice {
        self.with(|s| s.device)
    }

    async fn open_or_recover(&mut self, request: &OpenRequest) -> WalletStatus {
        self.with(|s| {
            s.opened = Some(request.clone());
            s.closed = false;
            s.open_status.clone()
        })
    }

    async fn init(&mut self, daemon: &Endpoint) -> WalletStatus {
        self.with(|s| {
            s.daemon = Some(daemon.clone());
            s.init_status.clone()
        })
    }

    fn set_listener(&mut self, sink: Option<EventSink>) {
        self.with(|s| s.listener = sink);
    }

    async fn start_refresh(&mut self) {
        self.with(|s| s.refreshing = true);
    }

    async fn pause_refresh(&mut self) {
        self.with(|s| s.refreshing = false);
    }

    async fn refresh_history(&mut self) {
        self.with(|s| s.history_refreshes += 1);
    }

    fn history_count(&self) -> usize {
        self.with(|s| s.history)
    }

    fn balance(&self) -> u64 {
        self.with(|s| s.balance)
    }

    fn unlocked_balance(&self) -> u64 {
        self.with(|s| s.unlocked)
    }

    fn block_chain_height(&self) -> u64 {
        self.with(|s| s.block_height)
    }

    async fn daemon_block_chain_height(&self) -> u64 {
        self.with(|s| {
            s.daemon_height_queries += 1;
            s.daemon_height
        })
    }

    fn is_synchronized(&self) -> bool {
        self.with(|s| s.synchronized)
    }

    fn set_synchronized(&mut self) {
        self.with(|s| s.synchronized = true);
    }

    fn default_mixin(&self) -> u32 {
        self.with(|s| s.default_mixin)
    }

    async fn create_transaction(&mut self, params: &TxParams) -> PendingTransaction {
        self.with(|s| {
            s.last_params = Some(params.clone());
            s.build(params.amount)
        })
    }

    async fn create_sweep_unmixable_transaction(&mut self) -> PendingTransaction {
        self.with(|s| s.build(0))
    }

    fn pending_transaction(&self) -> Option<PendingTransaction> {
        self.with(|s| s.pending.clone())
    }

    fn dispose_pending_transaction(&mut self) {
        self.with(|s| s.pending = None);
    }

    async fn commit_pending_transaction(
        &mut self,
        _options: &CommitOptions,
    ) -> Result<(), EngineError> {
        self.with(|s| {
            let Some(pending) = s.pending.as_mut() else {
                return Err(EngineError("no pending transaction".into()));
            };
            if let Some(error) = &s.commit_error {
                return Err(EngineError(error.clone()));
            }
            // ids vanish on commit
            let ids = std::mem::take(&mut pending.tx_ids);
            s.committed.extend(ids);
            Ok(())
        })
    }

    async fn store(&mut self) -> bool {
        self.with(|s| {
            s.stores += 1;
            s.store_ok
        })
    }

    fn full_status(&self) -> WalletStatus {
        self.with(|s| s.status.clone())
    }

    fn set_user_note(&mut self, txid: &str, note: &str) -> bool {
        self.with(|s| {
            s.notes.push((txid.to_string(), note.to_string()));
            true
        })
    }

    async fn close(&mut self) -> bool {
        self.with(|s| {
            s.closed = true;
            s.closes += 1;
            s.listener = None;
            s.pending = None;
            true
        })
    }
}

/// One recorded observer callback other than `on_refreshed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Progress(Progress),
    State(SyncState),
    WalletOpen(WalletDevice),
    WalletStarted(WalletStatus),
    WalletStored(bool),
    TransactionCreated { tag: String, ok: bool },
    TransactionSent(String),
    SendFailed(String),
    DraftChanged(TransferDraft),
}

/// Observer recording callbacks; `on_refreshed` answers with `request_more`
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Observed>>,
    refreshes: Mutex<Vec<(WalletSnapshot, bool)>>,
    request_more: AtomicBool,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Observed> {
        self.events.lock().unwrap().clone()
    }

    /// Sync states reported so far, in order
    pub fn states(&self) -> Vec<SyncState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Observed::State(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn refreshes(&self) -> Vec<(WalletSnapshot, bool)> {
        self.refreshes.lock().unwrap().clone()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
        self.refreshes.lock().unwrap().clear();
    }

    pub fn request_more(&self, more: bool) {
        self.request_more.store(more, Ordering::SeqCst);
    }

    fn record(&self, event: Observed) {
        self.events.lock().unwrap().push(event);
    }
}

impl SessionObserver for RecordingObserver {
    fn on_refreshed(&self, snapshot: &WalletSnapshot, full: bool) -> bool {
        self.refreshes.lock().unwrap().push((snapshot.clone(), full));
        self.request_more.load(Ordering::SeqCst)
    }

    fn on_progress(&self, progress: &Progress) {
        self.record(Observed::Progress(progress.clone()));
    }

    fn on_sync_state(&self, state: &SyncState) {
        self.record(Observed::State(state.clone()));
    }

    fn on_wallet_stored(&self, success: bool) {
        self.record(Observed::WalletStored(success));
    }

    fn on_transaction_created(&self, tag: &str, pending: &PendingTransaction) {
        self.record(Observed::TransactionCreated {
            tag: tag.to_string(),
            ok: pending.is_ok(),
        });
    }

    fn on_transaction_sent(&self, txid: &str) {
        self.record(Observed::TransactionSent(txid.to_string()));
    }

    fn on_send_transaction_failed(&self, reason: &str) {
        self.record(Observed::SendFailed(reason.to_string()));
    }

    fn on_wallet_started(&self, status: &WalletStatus) {
        self.record(Observed::WalletStarted(status.clone()));
    }

    fn on_wallet_open(&self, device: WalletDevice) {
        self.record(Observed::WalletOpen(device));
    }

    fn on_draft_changed(&self, draft: &TransferDraft) {
        self.record(Observed::DraftChanged(draft.clone()));
    }

    fn name(&self) -> &'static str {
        "RecordingObserver"
    }
}
