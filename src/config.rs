//! Binary configuration read from the environment.
//!
//! Every setting has a default; values that fail to parse are logged and replaced by the default
//! so a typo never stops node selection.

use crate::node::{Endpoint, ProberConfig};

use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const NODES_VAR: &str = "WALLET_SYNC_NODES";
pub const PROBE_BUDGET_VAR: &str = "WALLET_SYNC_PROBE_BUDGET_SECS";
pub const PROBE_TIMEOUT_VAR: &str = "WALLET_SYNC_PROBE_TIMEOUT_SECS";
pub const PROBE_CONCURRENCY_VAR: &str = "WALLET_SYNC_PROBE_CONCURRENCY";

/// Candidate daemons used when none are configured
pub const DEFAULT_NODES: &[&str] = &[
	"node.moneroworld.com:18089/mainnet/moneroworld",
	"xmr-node.cakewallet.com:18081/mainnet/cakewallet",
	"node.sethforprivacy.com:18089/mainnet/sethforprivacy",
	"nodes.hashvault.pro:18081/mainnet/hashvault",
];

#[derive(Debug, Clone)]
pub struct AppConfig {
	pub nodes: Vec<Endpoint>,
	pub prober: ProberConfig,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			nodes: parse_nodes(&DEFAULT_NODES.join(",")),
			prober: ProberConfig::default(),
		}
	}
}

impl AppConfig {
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Build the configuration from an arbitrary variable source.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let mut config = Self::default();

		if let Some(raw) = lookup(NODES_VAR).filter(|v| !v.trim().is_empty()) {
			let nodes = parse_nodes(&raw);
			if nodes.is_empty() {
				warn!("{} has no usable endpoint, using the default list", NODES_VAR);
			} else {
				config.nodes = nodes;
			}
		}

		if let Some(secs) = parse_var::<u64>(&lookup, PROBE_BUDGET_VAR).filter(|s| *s > 0) {
			config.prober.selection_budget = Duration::from_secs(secs);
		}
		if let Some(secs) = parse_var::<u64>(&lookup, PROBE_TIMEOUT_VAR).filter(|s| *s > 0) {
			config.prober.per_endpoint_timeout = Duration::from_secs(secs);
		}
		if let Some(max) = parse_var::<usize>(&lookup, PROBE_CONCURRENCY_VAR).filter(|m| *m > 0) {
			config.prober.max_concurrent_probes = max;
		}

		config
	}
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
	let raw = lookup(key)?;
	match raw.trim().parse() {
		Ok(value) => Some(value),
		Err(_) => {
			warn!("Ignoring invalid {}={:?}, using the default", key, raw);
			None
		}
	}
}

/// Parse a comma separated endpoint list, skipping (and logging) bad entries.
pub fn parse_nodes(raw: &str) -> Vec<Endpoint> {
	raw.split(',')
		.map(str::trim)
		.filter(|entry| !entry.is_empty())
		.filter_map(|entry| match entry.parse::<Endpoint>() {
			Ok(endpoint) => Some(endpoint),
			Err(e) => {
				warn!("Skipping node {:?}: {}", entry, e);
				None
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::node::NetworkType;
	use std::collections::HashMap;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key: &str| vars.get(key).cloned()
	}

	#[test]
	fn defaults_without_environment() {
		let config = AppConfig::from_lookup(lookup(&[]));
		assert_eq!(config.nodes.len(), DEFAULT_NODES.len());
		assert_eq!(config.prober.max_concurrent_probes, 10);
		assert_eq!(config.prober.selection_budget, Duration::from_secs(50));
	}

	#[test]
	fn reads_overrides() {
		let config = AppConfig::from_lookup(lookup(&[
			(NODES_VAR, "127.0.0.1:38081/stagenet/local, https://node.example:443"),
			(PROBE_BUDGET_VAR, "5"),
			(PROBE_TIMEOUT_VAR, "2"),
			(PROBE_CONCURRENCY_VAR, "3"),
		]));

		assert_eq!(config.nodes.len(), 2);
		assert_eq!(config.nodes[0].network(), NetworkType::Stagenet);
		assert_eq!(config.nodes[0].name(), Some("local"));
		assert_eq!(config.nodes[1].uri(), "https://node.example:443");
		assert_eq!(config.prober.selection_budget, Duration::from_secs(5));
		assert_eq!(config.prober.per_endpoint_timeout, Duration::from_secs(2));
		assert_eq!(config.prober.max_concurrent_probes, 3);
	}

	#[test]
	fn invalid_values_fall_back_to_defaults() {
		let config = AppConfig::from_lookup(lookup(&[
			(NODES_VAR, "ftp://nope, :18081"),
			(PROBE_BUDGET_VAR, "soon"),
			(PROBE_CONCURRENCY_VAR, "0"),
		]));

		assert_eq!(config.nodes.len(), DEFAULT_NODES.len());
		assert_eq!(config.prober.selection_budget, Duration::from_secs(50));
		assert_eq!(config.prober.max_concurrent_probes, 10);
	}
}
