//! Transfer parameter builder
//!
//! This module provides a builder pattern for constructing the parameters the wallet engine needs
//! to build a pending transaction. Amounts are carried in atomic units; conversion from a display
//! amount happens at the edge via [`parse_amount`](crate::utils::parse_amount).

use crate::utils::AmountParseError;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
	#[error("Missing destination address")]
	MissingDestination,

	#[error("Missing amount")]
	MissingAmount,

	#[error("Invalid amount: {0}")]
	InvalidAmount(#[from] AmountParseError),
}

/// Fee priority requested from the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TxPriority {
	#[default]
	Default,
	Low,
	Medium,
	High,
	Last,
}

/// Parameters for one outgoing transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxParams {
	pub destination: String,
	/// Amount in atomic units
	pub amount: u64,
	/// Ring size minus one
	pub mixin: u32,
	pub priority: TxPriority,
	pub notes: Option<String>,
}

/// Builder for [`TxParams`]
#[derive(Debug, Clone, Default)]
pub struct TransferBuilder {
	destination: Option<String>,
	amount: Option<u64>,
	mixin: u32,
	priority: TxPriority,
	notes: Option<String>,
}

impl TransferBuilder {
	/// Creates a new transfer builder
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the destination address
	pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
		self.destination = Some(destination.into());
		self
	}

	/// Sets the amount in atomic units
	pub fn with_amount(mut self, amount: u64) -> Self {
		self.amount = Some(amount);
		self
	}

	/// Sets the amount from a decimal display string
	pub fn with_display_amount(mut self, amount: &str) -> Result<Self, TransactionError> {
		self.amount = Some(crate::utils::parse_amount(amount)?);
		Ok(self)
	}

	pub fn with_mixin(mut self, mixin: u32) -> Self {
		self.mixin = mixin;
		self
	}

	pub fn with_priority(mut self, priority: TxPriority) -> Self {
		self.priority = priority;
		self
	}

	/// Sets the user note; an empty note is treated as none
	pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
		let notes = notes.into();
		self.notes = if notes.trim().is_empty() {
			None
		} else {
			Some(notes)
		};
		self
	}

	/// Builds the final parameters
	///
	/// Only checks that the required fields are present; address validity is the caller's
	/// concern.
	pub fn build(self) -> Result<TxParams, TransactionError> {
		let destination = self
			.destination
			.filter(|d| !d.trim().is_empty())
			.ok_or(TransactionError::MissingDestination)?;
		let amount = self.amount.ok_or(TransactionError::MissingAmount)?;

		Ok(TxParams {
			destination: destination.trim().to_string(),
			amount,
			mixin: self.mixin,
			priority: self.priority,
			notes: self.notes,
		})
	}
}
