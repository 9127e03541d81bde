//! Types for daemon endpoint probing and node selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Network a daemon serves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
    Stagenet,
}

impl NetworkType {
    /// Default restricted RPC port for this network
    pub fn default_rpc_port(&self) -> u16 {
        match self {
            NetworkType::Mainnet => 18081,
            NetworkType::Testnet => 28081,
            NetworkType::Stagenet => 38081,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Testnet => "testnet",
            NetworkType::Stagenet => "stagenet",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(NetworkType::Mainnet),
            "testnet" | "test" => Ok(NetworkType::Testnet),
            "stagenet" | "stage" => Ok(NetworkType::Stagenet),
            other => Err(NodeError::InvalidEndpoint(format!(
                "unknown network type: {}",
                other
            ))),
        }
    }
}

/// A candidate daemon endpoint.
///
/// Immutable once constructed. The textual form accepted by [`Endpoint::from_str`] is
/// `[scheme://]host[:port][/network[/name]]`, e.g. `node.example.org:18089/mainnet/example`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Base URI of the daemon RPC, always with scheme and port.
    uri: String,
    /// The network this endpoint claims to serve.
    network: NetworkType,
    /// Optional human readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl Endpoint {
    pub fn new(uri: impl Into<String>, network: NetworkType) -> Self {
        Self {
            uri: uri.into(),
            network,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn network(&self) -> NetworkType {
        self.network
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// URL of the daemon's JSON-RPC entry point.
    pub fn json_rpc_url(&self) -> String {
        format!("{}/json_rpc", self.uri.trim_end_matches('/'))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({}, {})", name, self.uri, self.network),
            None => write!(f, "{} ({})", self.uri, self.network),
        }
    }
}

impl FromStr for Endpoint {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (scheme, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => (scheme, rest),
            None => ("http", trimmed),
        };
        if scheme != "http" && scheme != "https" {
            return Err(NodeError::InvalidEndpoint(format!(
                "unsupported scheme in {}",
                trimmed
            )));
        }

        let mut parts = rest.splitn(3, '/');
        let authority = parts.next().unwrap_or_default();
        let network = match parts.next().filter(|p| !p.is_empty()) {
            Some(network) => network.parse()?,
            None => NetworkType::Mainnet,
        };
        let name = parts.next().filter(|p| !p.is_empty()).map(str::to_string);

        if authority.is_empty() {
            return Err(NodeError::InvalidEndpoint(format!("missing host in {}", trimmed)));
        }
        let invalid = || NodeError::InvalidEndpoint(format!("invalid host or port in {}", trimmed));

        // IPv6 literals are bracketed and carry their own colons
        let (host, port) = match authority.strip_prefix('[') {
            Some(rest) => {
                let (address, tail) = rest.split_once(']').ok_or_else(invalid)?;
                if address.is_empty() {
                    return Err(invalid());
                }
                let port = match tail {
                    "" => None,
                    tail => Some(tail.strip_prefix(':').ok_or_else(invalid)?),
                };
                (&authority[..address.len() + 2], port)
            }
            None => match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            },
        };
        if host.is_empty() || (!host.starts_with('[') && host.contains(':')) {
            return Err(invalid());
        }
        let port = match port {
            Some(port) => port.parse::<u16>().map_err(|_| invalid())?,
            None => network.default_rpc_port(),
        };
        let authority = format!("{}:{}", host, port);

        let endpoint = Endpoint::new(format!("{}://{}", scheme, authority), network);
        Ok(match name {
            Some(name) => endpoint.with_name(name),
            None => endpoint,
        })
    }
}

/// What a daemon reported about itself in response to a probe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaemonInfo {
    /// Current chain height as seen by the daemon.
    pub height: u64,
    /// The network the daemon reported, if it did.
    pub network: Option<NetworkType>,
    /// Whether the daemon considers itself synchronized.
    pub synchronized: bool,
}

/// Outcome of probing one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The daemon answered in time and passed the capability checks.
    Reachable { latency: Duration, info: DaemonInfo },
    /// The probe failed, timed out or the daemon is not usable.
    Unreachable { reason: String },
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable { .. })
    }

    pub fn latency(&self) -> Option<Duration> {
        match self {
            ProbeOutcome::Reachable { latency, .. } => Some(*latency),
            ProbeOutcome::Unreachable { .. } => None,
        }
    }
}

/// Probe result for one endpoint, tagged with its declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// Position of the endpoint in the caller's list; breaks latency ties.
    pub index: usize,
    pub endpoint: Endpoint,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    /// Ranking key: reachable before unreachable, then lower latency, then declaration order.
    pub fn rank_key(&self) -> (bool, Duration, usize) {
        match self.outcome.latency() {
            Some(latency) => (false, latency, self.index),
            None => (true, Duration::MAX, self.index),
        }
    }
}

/// Pick the best reachable result, if any.
pub fn best_result(results: &[ProbeResult]) -> Option<&ProbeResult> {
    results
        .iter()
        .filter(|r| r.outcome.is_reachable())
        .min_by_key(|r| r.rank_key())
}

/// Error types for daemon probing
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("No data returned")]
    NoData,

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Network mismatch: endpoint declares {declared}, daemon reports {reported}")]
    NetworkMismatch {
        declared: NetworkType,
        reported: NetworkType,
    },

    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
