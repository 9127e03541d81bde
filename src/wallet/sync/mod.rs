//! Wallet Synchronization Module
//!
//! This module provides the state machine that drives one wallet engine session from start to
//! stop. It is composed of several submodules, each responsible for a specific aspect of the sync
//! process:
//!
//! - `orchestrator`: The main entry point. Owns the engine, opens the wallet and turns engine events into state transitions.
//! - `events`: The observer trait through which the session reports to the presentation layer.
//! - `progress_tracker`: Block event coalescing, transaction count tracking and the "updated" latch.
//! - `daemon_status`: Rate-limited daemon height cache and the connection status derived from it.

/// Throttled daemon height cache
pub mod daemon_status;
/// Observer interface for session events
pub mod events;
/// Main coordinator for the wallet sync process
pub mod orchestrator;
/// Refresh bookkeeping and block event coalescing
pub mod progress_tracker;

pub use events::{ObserverSlot, SessionObserver};
pub use orchestrator::*;
