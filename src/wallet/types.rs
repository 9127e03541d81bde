use crate::transaction::TransactionError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Daemon connectivity as last derived from a height probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
	Connected,
	#[default]
	Disconnected,
}

/// Lifecycle of one wallet session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
	#[default]
	Idle,
	Starting,
	Syncing { blocks_remaining: u64 },
	Synced,
	Stopped,
	Error(String),
}

impl fmt::Display for SyncState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncState::Idle => f.write_str("Not synced"),
			SyncState::Starting => f.write_str("Starting"),
			SyncState::Syncing { blocks_remaining } => {
				write!(f, "Syncing, {} blocks left", blocks_remaining)
			}
			SyncState::Synced => f.write_str("Synced"),
			SyncState::Stopped => f.write_str("Stopped"),
			SyncState::Error(message) => write!(f, "Error: {}", message),
		}
	}
}

/// Progress reported while a session starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
	Message(String),
	Percent(u8),
}

/// Severity of an engine status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
	Ok,
	Error,
	Critical,
}

/// Status reported by the wallet engine after open/init and on demand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStatus {
	pub code: StatusCode,
	pub message: Option<String>,
}

impl WalletStatus {
	pub fn ok() -> Self {
		Self {
			code: StatusCode::Ok,
			message: None,
		}
	}

	pub fn error(message: impl Into<String>) -> Self {
		Self {
			code: StatusCode::Error,
			message: Some(message.into()),
		}
	}

	pub fn is_ok(&self) -> bool {
		self.code == StatusCode::Ok
	}

	pub fn error_message(&self) -> &str {
		self.message.as_deref().unwrap_or("unknown error")
	}
}

/// Key storage behind a wallet file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletDevice {
	#[default]
	Software,
	Ledger,
	Trezor,
	Unknown,
}

/// Point-in-time view of the wallet delivered to the observer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
	pub block_height: u64,
	pub daemon_height: u64,
	pub blocks_remaining: u64,
	pub balance: u64,
	pub unlocked_balance: u64,
	pub transaction_count: usize,
	pub synchronized: bool,
	pub connection: ConnectionStatus,
	pub state: SyncState,
	pub taken_at: DateTime<Utc>,
}

/// Error types for the wallet session
#[derive(Debug, thiserror::Error)]
pub enum WalletSyncError {
	#[error("Failed to open wallet session: {0}")]
	SessionOpenFailure(String),

	#[error("Daemon unreachable: {0}")]
	DaemonUnreachable(String),

	#[error("Failed to build pending transaction: {0}")]
	PendingTransactionBuildFailure(String),

	#[error("Failed to commit transaction: {0}")]
	CommitFailure(String),

	#[error("No pending transaction")]
	NoPendingTransaction,

	#[error("Transaction sent but wallet store failed: {0}")]
	StoreFailure(String),

	#[error("No active wallet session")]
	NoActiveSession,

	#[error("Wallet session has shut down")]
	SessionClosed,

	#[error("Transaction error: {0}")]
	Transaction(#[from] TransactionError),
}
