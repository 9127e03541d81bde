use monero_wallet_sync::config::AppConfig;
use monero_wallet_sync::node::{DaemonRpcClient, NodeProber, ProbeOutcome, ProbeResult};
use std::process::ExitCode;
use tracing::{error, info, warn};

fn init_logging() {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn,reqwest=warn"));
	let use_json = std::env::var("WALLET_SYNC_LOG_JSON")
		.map(|value| value == "1")
		.unwrap_or(false);

	let builder = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_writer(std::io::stderr);

	if use_json {
		builder.json().init();
	} else {
		builder
			.with_timer(tracing_subscriber::fmt::time::time())
			.init();
	}
}

fn log_probe(result: &ProbeResult) {
	match &result.outcome {
		ProbeOutcome::Reachable { latency, info } => info!(
			"{} answered in {} ms at height {}",
			result.endpoint,
			latency.as_millis(),
			info.height
		),
		ProbeOutcome::Unreachable { reason } => warn!("{} unreachable: {}", result.endpoint, reason),
	}
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	init_logging();

	info!("Starting daemon selection");
	let config = AppConfig::from_env();

	let client = match DaemonRpcClient::new(config.prober.request_timeout) {
		Ok(client) => client,
		Err(e) => {
			error!("Failed to create daemon RPC client: {}", e);
			return ExitCode::FAILURE;
		}
	};

	let prober = NodeProber::new(client, config.prober.clone());
	let selected = prober
		.select(
			&config.nodes,
			config.prober.per_endpoint_timeout,
			Some(&log_probe),
		)
		.await;

	let Some(endpoint) = selected else {
		error!("No daemon responded within the selection budget");
		return ExitCode::FAILURE;
	};

	info!("Selected daemon {}", endpoint);
	match serde_json::to_string_pretty(&endpoint) {
		Ok(json) => {
			println!("{}", json);
			ExitCode::SUCCESS
		}
		Err(e) => {
			error!("Failed to serialize endpoint: {}", e);
			ExitCode::FAILURE
		}
	}
}
