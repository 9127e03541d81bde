//! Wallet session orchestration on top of an external Monero wallet engine.
//!
//! - [`node`] picks a daemon by probing candidates concurrently under a time budget.
//! - [`wallet`] drives one engine session: open, sync, observe, stop.
//! - [`transaction`] holds the single-flight prepare/commit/store protocol and the transfer draft.

pub mod config;
pub mod node;
pub mod transaction;
pub mod utils;
pub mod wallet;

#[cfg(test)]
mod testing;
