//!
//! JSON-RPC client used to probe daemon reachability.
//!
//! The client issues a single `get_info` call against a daemon's `/json_rpc` entry point and
//! reports the chain height, network and synchronization flag it returns. Latency is measured
//! by the caller around [`NodeProbe::probe`], so the client itself stays a plain request/response
//! wrapper over `reqwest`.

use super::prober::NodeProbe;
use super::types::*;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// `result` object of a `get_info` response; only the fields we rank on.
#[derive(Debug, Deserialize)]
struct GetInfoResult {
	status: Option<String>,
	height: Option<u64>,
	nettype: Option<String>,
	#[serde(default)]
	mainnet: bool,
	#[serde(default)]
	testnet: bool,
	#[serde(default)]
	stagenet: bool,
	#[serde(default)]
	synchronized: bool,
}

impl GetInfoResult {
	fn network(&self) -> Option<NetworkType> {
		if let Some(network) = self.nettype.as_deref().and_then(|n| n.parse().ok()) {
			return Some(network);
		}
		match (self.mainnet, self.testnet, self.stagenet) {
			(true, _, _) => Some(NetworkType::Mainnet),
			(_, true, _) => Some(NetworkType::Testnet),
			(_, _, true) => Some(NetworkType::Stagenet),
			_ => None,
		}
	}
}

/// Daemon JSON-RPC client
#[derive(Clone)]
pub struct DaemonRpcClient {
	/// The underlying HTTP client.
	http_client: Client,
}

impl DaemonRpcClient {
	/// Create a new daemon client.
	///
	/// # Arguments
	/// * `request_timeout` - Upper bound for one HTTP round trip.
	///
	/// # Returns
	/// A new `DaemonRpcClient`, or a `NodeError` if the HTTP client cannot be built.
	pub fn new(request_timeout: Duration) -> Result<Self, NodeError> {
		let http_client = Client::builder().timeout(request_timeout).build()?;

		Ok(Self { http_client })
	}

	/// Query `get_info` on the given endpoint.
	///
	/// # Arguments
	/// * `endpoint` - The daemon to ask.
	///
	/// # Returns
	/// What the daemon reported about itself, or a `NodeError` if the call failed or the
	/// daemon is not usable for the endpoint's declared network.
	pub async fn get_info(&self, endpoint: &Endpoint) -> Result<DaemonInfo, NodeError> {
		let request_body = json!({
			"jsonrpc": "2.0",
			"id": "0",
			"method": "get_info"
		});

		let response_json = self
			.execute_rpc(&endpoint.json_rpc_url(), &request_body)
			.await?;

		let result = response_json.get("result").ok_or(NodeError::NoData)?;
		let info: GetInfoResult = serde_json::from_value(result.clone())?;

		match info.status.as_deref() {
			Some("OK") => {}
			Some(other) => {
				return Err(NodeError::RpcError(format!("daemon status {}", other)));
			}
			None => return Err(NodeError::RpcError("daemon status missing".to_string())),
		}

		let height = info.height.ok_or(NodeError::NoData)?;
		let network = info.network();
		if let Some(reported) = network {
			if reported != endpoint.network() {
				return Err(NodeError::NetworkMismatch {
					declared: endpoint.network(),
					reported,
				});
			}
		}

		debug!(
			"Daemon {} reports height {} on {:?} (synchronized: {})",
			endpoint, height, network, info.synchronized
		);

		Ok(DaemonInfo {
			height,
			network,
			synchronized: info.synchronized,
		})
	}

	/// Execute a JSON-RPC request.
	///
	/// # Arguments
	/// * `url` - The JSON-RPC URL.
	/// * `request_body` - The request envelope.
	///
	/// # Returns
	/// The JSON response from the daemon, or a `NodeError` if the request fails.
	async fn execute_rpc(
		&self,
		url: &str,
		request_body: &serde_json::Value,
	) -> Result<serde_json::Value, NodeError> {
		let response = self
			.http_client
			.post(url)
			.header("Content-Type", "application/json")
			.json(request_body)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(NodeError::RpcError(format!(
				"HTTP error: {}",
				response.status()
			)));
		}

		let response_json: serde_json::Value = response.json().await?;

		if let Some(error) = response_json.get("error") {
			return Err(NodeError::RpcError(format!("RPC error: {}", error)));
		}

		Ok(response_json)
	}
}

#[async_trait::async_trait]
impl NodeProbe for DaemonRpcClient {
	async fn probe(&self, endpoint: &Endpoint) -> Result<DaemonInfo, NodeError> {
		self.get_info(endpoint).await
	}

	fn name(&self) -> &'static str {
		"DaemonRpcClient"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tokio::io::{AsyncReadExt, AsyncWriteExt};
	use tokio::net::TcpListener;

	/// Serve exactly one HTTP request with the given JSON body and return the endpoint URI.
	async fn serve_once(body: &'static str) -> String {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			let (mut socket, _) = listener.accept().await.unwrap();
			let mut request = Vec::new();
			let mut buf = [0u8; 1024];
			loop {
				let n = socket.read(&mut buf).await.unwrap();
				if n == 0 {
					break;
				}
				request.extend_from_slice(&buf[..n]);
				let text = String::from_utf8_lossy(&request);
				if let Some(header_end) = text.find("\r\n\r\n") {
					let content_length = text[..header_end]
						.lines()
						.find_map(|line| {
							let (name, value) = line.split_once(':')?;
							name.eq_ignore_ascii_case("content-length")
								.then(|| value.trim().parse::<usize>().ok())
								.flatten()
						})
						.unwrap_or(0);
					if request.len() >= header_end + 4 + content_length {
						break;
					}
				}
			}
			let response = format!(
				"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
				body.len(),
				body
			);
			socket.write_all(response.as_bytes()).await.unwrap();
			socket.shutdown().await.unwrap();
		});
		format!("http://{}", addr)
	}

	#[tokio::test]
	async fn reads_height_and_network_from_get_info() {
		let uri = serve_once(
			r#"{"id":"0","jsonrpc":"2.0","result":{"status":"OK","height":3123456,"nettype":"mainnet","synchronized":true}}"#,
		)
		.await;
		let client = DaemonRpcClient::new(Duration::from_secs(5)).unwrap();
		let info = client
			.get_info(&Endpoint::new(uri, NetworkType::Mainnet))
			.await
			.unwrap();

		assert_eq!(info.height, 3_123_456);
		assert_eq!(info.network, Some(NetworkType::Mainnet));
		assert!(info.synchronized);
	}

	#[tokio::test]
	async fn rejects_daemon_on_other_network() {
		let uri = serve_once(
			r#"{"id":"0","jsonrpc":"2.0","result":{"status":"OK","height":10,"stagenet":true}}"#,
		)
		.await;
		let client = DaemonRpcClient::new(Duration::from_secs(5)).unwrap();
		let err = client
			.get_info(&Endpoint::new(uri, NetworkType::Mainnet))
			.await
			.unwrap_err();

		assert!(matches!(
			err,
			NodeError::NetworkMismatch {
				declared: NetworkType::Mainnet,
				reported: NetworkType::Stagenet
			}
		));
	}

	#[tokio::test]
	async fn surfaces_rpc_errors() {
		let uri = serve_once(
			r#"{"id":"0","jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"}}"#,
		)
		.await;
		let client = DaemonRpcClient::new(Duration::from_secs(5)).unwrap();
		let err = client
			.get_info(&Endpoint::new(uri, NetworkType::Mainnet))
			.await
			.unwrap_err();

		assert!(matches!(err, NodeError::RpcError(_)));
	}
}
