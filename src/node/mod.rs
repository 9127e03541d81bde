//! Daemon node selection
//!
//! This module provides the concurrent prober used to pick a daemon before a wallet session is
//! started, together with the JSON-RPC client that performs the actual reachability check and
//! the endpoint/probe result types it ranks.

/// JSON-RPC client used as the default reachability probe
mod client;
/// Concurrent, budget-bounded node selection
pub mod prober;
/// Type definitions for endpoints and probe results
mod types;

pub use client::DaemonRpcClient;
pub use prober::{NodeProbe, NodeProber, ProbeListener, ProberConfig};
pub use types::*;
