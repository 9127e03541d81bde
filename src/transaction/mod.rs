/// Transfer parameter builder
pub mod builder;
/// Single-flight prepare/commit/store protocol
pub mod coordinator;
/// Editable transfer draft
pub mod draft;

pub use builder::{TransactionError, TransferBuilder, TxParams, TxPriority};
pub use coordinator::{SendOutcome, TransactionCoordinator};
pub use draft::{DraftEdit, TransferDraft};
