//! Editable transfer draft held by the coordinator between user edits and `prepare`.

use crate::transaction::builder::{TransactionError, TransferBuilder, TxParams, TxPriority};

use serde::Serialize;

/// Destination, amount and notes as typed, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferDraft {
	pub destination: String,
	/// Display amount, e.g. "0.25"
	pub amount: String,
	pub notes: String,
}

/// One edit to a [`TransferDraft`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
	Destination(String),
	Amount(String),
	Notes(String),
	Clear,
}

impl TransferDraft {
	pub fn is_empty(&self) -> bool {
		self.destination.is_empty() && self.amount.is_empty() && self.notes.is_empty()
	}

	pub fn clear(&mut self) {
		*self = Self::default();
	}

	/// Apply `edit`; returns whether the draft changed.
	pub fn apply(&mut self, edit: DraftEdit) -> bool {
		let before = self.clone();
		match edit {
			DraftEdit::Destination(destination) => self.destination = destination,
			DraftEdit::Amount(amount) => self.amount = amount,
			DraftEdit::Notes(notes) => self.notes = notes,
			DraftEdit::Clear => self.clear(),
		}
		*self != before
	}

	/// Turn the draft into engine parameters.
	pub fn to_params(&self, mixin: u32, priority: TxPriority) -> Result<TxParams, TransactionError> {
		TransferBuilder::new()
			.with_destination(self.destination.as_str())
			.with_display_amount(&self.amount)?
			.with_mixin(mixin)
			.with_priority(priority)
			.with_notes(self.notes.as_str())
			.build()
	}
}
