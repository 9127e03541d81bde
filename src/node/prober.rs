use crate::node::types::{DaemonInfo, Endpoint, NodeError, ProbeOutcome, ProbeResult, best_result};
use futures::stream;
use futures_util::StreamExt;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Trait for the reachability check run against each candidate endpoint
#[async_trait::async_trait]
pub trait NodeProbe: Send + Sync {
	/// Ask the daemon behind `endpoint` about itself
	async fn probe(&self, endpoint: &Endpoint) -> Result<DaemonInfo, NodeError>;

	/// Get the name of this probe
	fn name(&self) -> &'static str;
}

/// Receives each probe result as soon as it is available.
///
/// Calls are fire-and-forget: there is no ordering guarantee and nothing is published for
/// probes abandoned when the selection budget runs out.
pub trait ProbeListener: Send + Sync {
	fn publish(&self, result: &ProbeResult);
}

impl<F> ProbeListener for F
where
	F: Fn(&ProbeResult) + Send + Sync,
{
	fn publish(&self, result: &ProbeResult) {
		self(result)
	}
}

/// Configuration for node selection
#[derive(Debug, Clone)]
pub struct ProberConfig {
	/// Maximum number of probes in flight at once
	pub max_concurrent_probes: usize,
	/// Wall-clock budget for a whole selection
	pub selection_budget: Duration,
	/// Default timeout for a single probe
	pub per_endpoint_timeout: Duration,
	/// Timeout of the underlying HTTP request
	pub request_timeout: Duration,
}

impl Default for ProberConfig {
	fn default() -> Self {
		Self {
			max_concurrent_probes: 10,
			selection_budget: Duration::from_secs(50),
			per_endpoint_timeout: Duration::from_secs(10),
			request_timeout: Duration::from_secs(30),
		}
	}
}

/// Concurrently probes candidate daemons and picks the fastest one
pub struct NodeProber<P: NodeProbe> {
	probe: P,
	config: ProberConfig,
}

impl<P: NodeProbe> NodeProber<P> {
	pub fn new(probe: P, config: ProberConfig) -> Self {
		Self { probe, config }
	}

	pub fn config(&self) -> &ProberConfig {
		&self.config
	}

	/// Select the best responding endpoint.
	///
	/// Returns `None` when no endpoint answers before the selection budget expires.
	pub async fn select(
		&self,
		endpoints: &[Endpoint],
		per_endpoint_timeout: Duration,
		listener: Option<&dyn ProbeListener>,
	) -> Option<Endpoint> {
		let results = self.probe_all(endpoints, per_endpoint_timeout, listener).await;

		match best_result(&results) {
			Some(best) => {
				info!(
					"Selected node {} ({:?}) out of {} candidates, {} responded",
					best.endpoint,
					best.outcome.latency().unwrap_or_default(),
					endpoints.len(),
					results.iter().filter(|r| r.outcome.is_reachable()).count()
				);
				Some(best.endpoint.clone())
			}
			None => {
				warn!("None of {} candidate nodes responded", endpoints.len());
				None
			}
		}
	}

	/// Probe every endpoint and return the results that finished within the budget.
	///
	/// Results are in completion order. Probes still running when the budget expires are
	/// dropped, which cancels their in-flight requests.
	pub async fn probe_all(
		&self,
		endpoints: &[Endpoint],
		per_endpoint_timeout: Duration,
		listener: Option<&dyn ProbeListener>,
	) -> Vec<ProbeResult> {
		if endpoints.is_empty() {
			return Vec::new();
		}

		info!(
			"Probing {} nodes with {} ({} at a time, budget {:?})",
			endpoints.len(),
			self.probe.name(),
			self.config.max_concurrent_probes,
			self.config.selection_budget
		);

		let deadline = Instant::now() + self.config.selection_budget;
		let probes = stream::iter(endpoints.iter().enumerate())
			.map(|(index, endpoint)| self.probe_one(index, endpoint, per_endpoint_timeout))
			.buffer_unordered(self.config.max_concurrent_probes.max(1));
		tokio::pin!(probes);

		let mut results = Vec::with_capacity(endpoints.len());
		loop {
			match tokio::time::timeout_at(deadline, probes.next()).await {
				Ok(Some(result)) => {
					if let Some(listener) = listener {
						listener.publish(&result);
					}
					results.push(result);
				}
				Ok(None) => break,
				Err(_) => {
					warn!(
						"Node selection budget of {:?} expired, abandoning {} probes",
						self.config.selection_budget,
						endpoints.len() - results.len()
					);
					break;
				}
			}
		}

		results
	}

	async fn probe_one(
		&self,
		index: usize,
		endpoint: &Endpoint,
		timeout: Duration,
	) -> ProbeResult {
		let started = Instant::now();
		let outcome = match tokio::time::timeout(timeout, self.probe.probe(endpoint)).await {
			Ok(Ok(info)) => {
				let latency = started.elapsed();
				debug!("Node {} answered in {:?} at height {}", endpoint, latency, info.height);
				ProbeOutcome::Reachable { latency, info }
			}
			Ok(Err(e)) => {
				debug!("Node {} failed its probe: {}", endpoint, e);
				ProbeOutcome::Unreachable {
					reason: e.to_string(),
				}
			}
			Err(_) => {
				let e = NodeError::Timeout(timeout);
				debug!("Node {}: {}", endpoint, e);
				ProbeOutcome::Unreachable {
					reason: e.to_string(),
				}
			}
		};

		ProbeResult {
			index,
			endpoint: endpoint.clone(),
			outcome,
		}
	}
}
