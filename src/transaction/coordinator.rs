//! Single-flight pending transaction protocol.
//!
//! The coordinator mediates prepare -> commit -> store against the engine of an active session.
//! At most one pending transaction exists at a time: every build first disposes whatever the
//! engine still holds, and every send outcome leaves the slot empty.

use crate::transaction::builder::{TxParams, TxPriority};
use crate::transaction::draft::{DraftEdit, TransferDraft};
use crate::wallet::WalletSyncError;
use crate::wallet::engine::{CommitOptions, PendingTransaction, WalletEngine};
use crate::wallet::sync::SessionParts;
use crate::wallet::sync::events::ObserverSlot;

use serde::Serialize;
use tracing::{debug, info, warn};

/// Result of a send that got as far as the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SendOutcome {
	/// Committed and relayed. `stored` tells whether the wallet was persisted afterwards.
	Sent { txid: String, stored: bool },
	/// Rejected before or during commit; nothing was broadcast.
	Failed { reason: String },
}

/// What the coordinator remembers about the prepared transaction
#[derive(Debug, Clone)]
struct PendingSlot {
	tag: String,
	notes: Option<String>,
}

/// Owns the pending transaction slot and the transfer draft of one session
#[derive(Debug, Clone, Default)]
pub struct TransactionCoordinator {
	slot: Option<PendingSlot>,
	draft: TransferDraft,
}

impl TransactionCoordinator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn draft(&self) -> &TransferDraft {
		&self.draft
	}

	/// Whether a successfully built transaction is waiting for `send`
	pub fn has_pending(&self) -> bool {
		self.slot.is_some()
	}

	/// Forget the slot after the engine dropped its pending transaction (e.g. on stop).
	pub fn discard(&mut self) {
		if let Some(slot) = self.slot.take() {
			debug!("Discarding pending transaction {}", slot.tag);
		}
	}

	/// Apply a draft edit and report the new draft to the observer if it changed.
	pub fn edit_draft(&mut self, observers: &ObserverSlot, edit: DraftEdit) -> TransferDraft {
		if self.draft.apply(edit) {
			observers.notify(|o| o.on_draft_changed(&self.draft));
		}
		self.draft.clone()
	}

	fn dispose<E: WalletEngine>(&mut self, engine: &mut E) {
		engine.dispose_pending_transaction();
		self.slot = None;
	}

	/// Build a pending transaction for `params`, replacing any previous one.
	///
	/// The returned status must be checked before calling `send`; a failed build leaves the slot
	/// empty.
	pub async fn prepare<E: WalletEngine>(
		&mut self,
		session: &mut SessionParts<'_, E>,
		tag: &str,
		params: &TxParams,
	) -> PendingTransaction {
		debug!("Preparing transaction {} of {} atomic units", tag, params.amount);
		self.dispose(session.engine);
		let pending = session.engine.create_transaction(params).await;
		self.settle_prepared(session, tag, params.notes.clone(), pending)
	}

	/// Build a pending transaction from the current draft with the engine's default mixin.
	pub async fn prepare_draft<E: WalletEngine>(
		&mut self,
		session: &mut SessionParts<'_, E>,
		tag: &str,
		priority: TxPriority,
	) -> Result<PendingTransaction, WalletSyncError> {
		// a draft that no longer converts must not leave an older transaction sendable
		self.dispose(session.engine);
		let params = self
			.draft
			.to_params(session.engine.default_mixin(), priority)?;
		Ok(self.prepare(session, tag, &params).await)
	}

	/// Build a transaction sweeping unmixable outputs, replacing any previous one.
	pub async fn sweep_unmixable<E: WalletEngine>(
		&mut self,
		session: &mut SessionParts<'_, E>,
		tag: &str,
	) -> PendingTransaction {
		debug!("Preparing sweep of unmixable outputs {}", tag);
		self.dispose(session.engine);
		let pending = session.engine.create_sweep_unmixable_transaction().await;
		self.settle_prepared(session, tag, None, pending)
	}

	fn settle_prepared<E: WalletEngine>(
		&mut self,
		session: &mut SessionParts<'_, E>,
		tag: &str,
		notes: Option<String>,
		pending: PendingTransaction,
	) -> PendingTransaction {
		if !pending.is_ok() {
			warn!(
				"{}",
				WalletSyncError::PendingTransactionBuildFailure(pending.error_message().to_string())
			);
			self.dispose(session.engine);
		}

		let delivered = session
			.observers
			.notify(|o| o.on_transaction_created(tag, &pending));

		if pending.is_ok() {
			if delivered {
				self.slot = Some(PendingSlot {
					tag: tag.to_string(),
					notes,
				});
			} else {
				debug!("No observer for transaction {}, disposing it", tag);
				self.dispose(session.engine);
			}
		}
		pending
	}

	/// Commit and relay the prepared transaction, then store the wallet.
	///
	/// `notes` overrides the notes given at prepare time. Fails fast with
	/// `NoPendingTransaction` when nothing was prepared; every other failure is reported through
	/// the observer and as [`SendOutcome::Failed`].
	pub async fn send<E: WalletEngine>(
		&mut self,
		session: &mut SessionParts<'_, E>,
		notes: Option<&str>,
	) -> Result<SendOutcome, WalletSyncError> {
		let Some(pending) = session.engine.pending_transaction() else {
			self.slot = None;
			return Err(WalletSyncError::NoPendingTransaction);
		};
		let slot = self.slot.take();

		if !pending.is_ok() {
			let reason = pending.error_message().to_string();
			warn!("Refusing to send broken pending transaction: {}", reason);
			self.dispose(session.engine);
			session
				.observers
				.notify(|o| o.on_send_transaction_failed(&reason));
			return Ok(SendOutcome::Failed { reason });
		}

		// ids are gone once the engine has committed
		let txid = pending.first_tx_id().unwrap_or_default().to_string();

		if let Err(err) = session
			.engine
			.commit_pending_transaction(&CommitOptions::relay_now())
			.await
		{
			let reason = err.to_string();
			warn!("{}", WalletSyncError::CommitFailure(reason.clone()));
			self.dispose(session.engine);
			session
				.observers
				.notify(|o| o.on_send_transaction_failed(&reason));
			return Ok(SendOutcome::Failed { reason });
		}
		info!("Transaction {} committed", txid);
		self.dispose(session.engine);

		let note = notes
			.map(str::to_string)
			.or(slot.and_then(|s| s.notes))
			.filter(|n| !n.trim().is_empty());
		if let Some(note) = note {
			if !session.engine.set_user_note(&txid, &note) {
				warn!("Failed to attach note to {}", txid);
			}
		}
		session.observers.notify(|o| o.on_transaction_sent(&txid));

		let stored = session.engine.store().await;
		if !stored {
			warn!(
				"{}",
				WalletSyncError::StoreFailure(
					session.engine.full_status().error_message().to_string()
				)
			);
		}
		session.observers.notify(|o| o.on_wallet_stored(stored));
		session.listener.mark_updated();

		self.draft.clear();
		session
			.observers
			.notify(|o| o.on_draft_changed(&self.draft));

		Ok(SendOutcome::Sent { txid, stored })
	}
}
