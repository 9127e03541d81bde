//!
//! Utility module for the wallet sync crate.
//!
//! Re-exports amount formatting and parsing helpers used by snapshots and the transfer draft.
/// Utility functions for formatting and parsing amounts
pub mod index;

pub use index::{ATOMIC_UNIT_DECIMALS, AmountParseError, format_amount, parse_amount};
