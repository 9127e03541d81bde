//! Session task owning the orchestrator and the transaction coordinator.
//!
//! Callers talk to a running session through a cloneable [`SessionHandle`]. Every command is
//! queued to the one task that owns the engine, so `start`, `stop`, `prepare` and `send` never
//! overlap with each other or with engine event handling. When the last handle is dropped the
//! task stops the session and exits.

use crate::node::Endpoint;
use crate::transaction::{
    DraftEdit, SendOutcome, TransactionCoordinator, TransferDraft, TxParams, TxPriority,
};
use crate::wallet::WalletSyncError;
use crate::wallet::engine::{OpenRequest, PendingTransaction, WalletEngine};
use crate::wallet::sync::{SessionConfig, SessionObserver, SyncOrchestrator};
use crate::wallet::types::{ConnectionStatus, SyncState, WalletStatus};

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

enum SessionCommand {
    SetObserver {
        observer: Option<Arc<dyn SessionObserver>>,
        response: oneshot::Sender<()>,
    },
    Start {
        request: OpenRequest,
        daemon: Endpoint,
        response: oneshot::Sender<WalletStatus>,
    },
    Stop {
        save: bool,
        response: oneshot::Sender<()>,
    },
    Prepare {
        tag: String,
        params: TxParams,
        response: oneshot::Sender<Result<PendingTransaction, WalletSyncError>>,
    },
    PrepareDraft {
        tag: String,
        priority: TxPriority,
        response: oneshot::Sender<Result<PendingTransaction, WalletSyncError>>,
    },
    SweepUnmixable {
        tag: String,
        response: oneshot::Sender<Result<PendingTransaction, WalletSyncError>>,
    },
    Send {
        notes: Option<String>,
        response: oneshot::Sender<Result<SendOutcome, WalletSyncError>>,
    },
    Store {
        response: oneshot::Sender<Result<bool, WalletSyncError>>,
    },
    EditDraft {
        edit: DraftEdit,
        response: oneshot::Sender<TransferDraft>,
    },
    Status {
        response: oneshot::Sender<SessionStatus>,
    },
}

/// Read-only view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub state: SyncState,
    pub connection: ConnectionStatus,
    pub daemon_height: u64,
    pub draft: TransferDraft,
    pub has_pending: bool,
}

/// The task side of a session
pub struct WalletSession<E: WalletEngine> {
    orchestrator: SyncOrchestrator<E>,
    coordinator: TransactionCoordinator,
    commands: mpsc::Receiver<SessionCommand>,
    store_on_stop: bool,
}

impl<E: WalletEngine + 'static> WalletSession<E> {
    /// Spawn the session task for `engine` on the current runtime.
    pub fn spawn(engine: E, config: SessionConfig) -> (SessionHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(config.command_queue.max(1));
        let session = Self {
            store_on_stop: config.store_on_stop,
            orchestrator: SyncOrchestrator::new(engine, config),
            coordinator: TransactionCoordinator::new(),
            commands: command_rx,
        };
        let task = tokio::spawn(session.run());
        (
            SessionHandle {
                commands: command_tx,
            },
            task,
        )
    }

    async fn run(mut self) {
        debug!("Wallet session task started");
        loop {
            tokio::select! {
                // drain engine events before acting on the next command
                biased;

                Some(event) = self.orchestrator.next_event() => {
                    self.orchestrator.handle_event(event).await;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.dispatch(command).await,
                    None => break,
                },
            }
        }

        info!("All session handles dropped, shutting down");
        self.orchestrator.stop(self.store_on_stop).await;
        self.coordinator.discard();
    }

    async fn dispatch(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SetObserver { observer, response } => {
                self.orchestrator.set_observer(observer);
                let _ = response.send(());
            }
            SessionCommand::Start {
                request,
                daemon,
                response,
            } => {
                // a running session keeps its pending transaction
                if !self.orchestrator.is_active() {
                    self.coordinator.discard();
                }
                let status = self.orchestrator.start(&request, &daemon).await;
                let _ = response.send(status);
            }
            SessionCommand::Stop { save, response } => {
                self.orchestrator.stop(save).await;
                self.coordinator.discard();
                let _ = response.send(());
            }
            SessionCommand::Prepare {
                tag,
                params,
                response,
            } => {
                let result = match self.orchestrator.session_mut() {
                    Some(mut parts) => Ok(self.coordinator.prepare(&mut parts, &tag, &params).await),
                    None => Err(WalletSyncError::NoActiveSession),
                };
                let _ = response.send(result);
            }
            SessionCommand::PrepareDraft {
                tag,
                priority,
                response,
            } => {
                let result = match self.orchestrator.session_mut() {
                    Some(mut parts) => {
                        self.coordinator
                            .prepare_draft(&mut parts, &tag, priority)
                            .await
                    }
                    None => Err(WalletSyncError::NoActiveSession),
                };
                let _ = response.send(result);
            }
            SessionCommand::SweepUnmixable { tag, response } => {
                let result = match self.orchestrator.session_mut() {
                    Some(mut parts) => Ok(self.coordinator.sweep_unmixable(&mut parts, &tag).await),
                    None => Err(WalletSyncError::NoActiveSession),
                };
                let _ = response.send(result);
            }
            SessionCommand::Send { notes, response } => {
                let result = match self.orchestrator.session_mut() {
                    Some(mut parts) => self.coordinator.send(&mut parts, notes.as_deref()).await,
                    None => Err(WalletSyncError::NoActiveSession),
                };
                let _ = response.send(result);
            }
            SessionCommand::Store { response } => {
                let _ = response.send(self.orchestrator.store().await);
            }
            SessionCommand::EditDraft { edit, response } => {
                let draft = self
                    .coordinator
                    .edit_draft(self.orchestrator.observers(), edit);
                let _ = response.send(draft);
            }
            SessionCommand::Status { response } => {
                let _ = response.send(SessionStatus {
                    state: self.orchestrator.state().clone(),
                    connection: self.orchestrator.connection_status(),
                    daemon_height: self.orchestrator.daemon_height(),
                    draft: self.coordinator.draft().clone(),
                    has_pending: self.coordinator.has_pending(),
                });
            }
        }
    }
}

/// Cloneable client of a running session
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, WalletSyncError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| WalletSyncError::SessionClosed)?;
        rx.await.map_err(|_| WalletSyncError::SessionClosed)
    }

    /// Attach (or with `None`, detach) the observer.
    pub async fn set_observer(
        &self,
        observer: Option<Arc<dyn SessionObserver>>,
    ) -> Result<(), WalletSyncError> {
        self.request(|response| SessionCommand::SetObserver { observer, response })
            .await
    }

    /// Open the wallet and start syncing against `daemon`.
    ///
    /// Returns the engine status; a non-OK status means the session is in `Error`.
    pub async fn start(
        &self,
        request: OpenRequest,
        daemon: Endpoint,
    ) -> Result<WalletStatus, WalletSyncError> {
        self.request(|response| SessionCommand::Start {
            request,
            daemon,
            response,
        })
        .await
    }

    pub async fn stop(&self, save: bool) -> Result<(), WalletSyncError> {
        self.request(|response| SessionCommand::Stop { save, response })
            .await
    }

    pub async fn prepare(
        &self,
        tag: impl Into<String>,
        params: TxParams,
    ) -> Result<PendingTransaction, WalletSyncError> {
        let tag = tag.into();
        self.request(|response| SessionCommand::Prepare {
            tag,
            params,
            response,
        })
        .await?
    }

    pub async fn prepare_draft(
        &self,
        tag: impl Into<String>,
        priority: TxPriority,
    ) -> Result<PendingTransaction, WalletSyncError> {
        let tag = tag.into();
        self.request(|response| SessionCommand::PrepareDraft {
            tag,
            priority,
            response,
        })
        .await?
    }

    pub async fn sweep_unmixable(
        &self,
        tag: impl Into<String>,
    ) -> Result<PendingTransaction, WalletSyncError> {
        let tag = tag.into();
        self.request(|response| SessionCommand::SweepUnmixable { tag, response })
            .await?
    }

    pub async fn send(&self, notes: Option<String>) -> Result<SendOutcome, WalletSyncError> {
        self.request(|response| SessionCommand::Send { notes, response })
            .await?
    }

    pub async fn store(&self) -> Result<bool, WalletSyncError> {
        self.request(|response| SessionCommand::Store { response })
            .await?
    }

    pub async fn edit_draft(&self, edit: DraftEdit) -> Result<TransferDraft, WalletSyncError> {
        self.request(|response| SessionCommand::EditDraft { edit, response })
            .await
    }

    pub async fn status(&self) -> Result<SessionStatus, WalletSyncError> {
        self.request(|response| SessionCommand::Status { response })
            .await
    }

    pub async fn state(&self) -> Result<SyncState, WalletSyncError> {
        Ok(self.status().await?.state)
    }
}
