//! Webhook relay service entry point.
//!
//! Initializes all required services, loads subscription configurations and
//! runs the delivery pipeline until interrupted.
//!
//! # Flow
//! 1. Loads the relay configuration and subscription definitions
//! 2. Initializes core services (filtering, queueing, sending, tracking)
//! 3. Starts the event processor and its event source
//! 4. Handles graceful shutdown on Ctrl+C, letting in-flight deliveries
//!    finish

use std::path::Path;

use clap::{Arg, Command};
use dotenvy::dotenv;
use tracing::{error, info};

use chain_webhook_relay::{
	bootstrap::{initialize_services, load_subscriptions},
	models::RelayConfig,
	utils::logging::setup_logging,
};

#[tokio::main]
async fn main() {
	// Load environment variables from .env file
	dotenv().ok();

	let matches = Command::new("chain-webhook-relay")
		.about("Relays on-chain events to HTTP webhooks")
		.arg(
			Arg::new("config")
				.long("config")
				.value_name("FILE")
				.help("Path to the relay configuration file"),
		)
		.arg(
			Arg::new("subscriptions")
				.long("subscriptions")
				.value_name("DIR")
				.help("Directory of subscription configuration files"),
		)
		.get_matches();

	if let Err(e) = setup_logging() {
		eprintln!("Failed to setup logging: {}", e);
	}

	let config_path = matches.get_one::<String>("config").map(Path::new);
	let config = match RelayConfig::load(config_path) {
		Ok(config) => config,
		Err(e) => {
			error!("failed to load relay configuration: {}", e);
			std::process::exit(1);
		}
	};

	let services = match initialize_services(&config, None, None) {
		Ok(services) => services,
		Err(e) => {
			error!("failed to initialize services: {}", e);
			std::process::exit(1);
		}
	};

	let subscription_path = matches.get_one::<String>("subscriptions").map(Path::new);
	match load_subscriptions(&services.processor, subscription_path).await {
		Ok(count) => info!("loaded {} subscriptions", count),
		Err(e) => {
			error!("failed to load subscriptions: {}", e);
			std::process::exit(1);
		}
	}

	if let Err(e) = services.processor.start().await {
		error!("failed to start event processor: {}", e);
		std::process::exit(1);
	}
	info!("relay started, waiting for events");

	if let Err(e) = tokio::signal::ctrl_c().await {
		error!("failed to listen for shutdown signal: {}", e);
	}

	info!("shutting down");
	if let Err(e) = services.processor.stop().await {
		error!("error during shutdown: {}", e);
	}

	let stats = services.processor.stats().await;
	info!(
		completed = stats.queue.completed_count,
		failed = stats.queue.failed_count,
		pending = stats.queue.pending_count,
		"final delivery statistics"
	);
}
