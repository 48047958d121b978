//! Mock implementations and fixture builders for integration tests.
//!
//! Provides:
//! - [`MockHttpTransport`] - mockall double for the transport seam
//! - [`MockDeliveryStorage`] - mockall double for the storage seam
//! - fixture builders for events, subscriptions and webhook configurations

use std::collections::HashMap;
use std::time::Duration;

use chain_webhook_relay::models::{
	BlockchainEvent, DeliveryRecord, EventSubscription, FilterCondition, WebhookConfig,
};
use chain_webhook_relay::services::sender::{HttpTransport, TransportOutcome};
use chain_webhook_relay::services::tracker::DeliveryStorage;

use async_trait::async_trait;
use chrono::Utc;
use mockall::mock;
use reqwest::header::HeaderMap;
use serde_json::{json, Value};

mock! {
	/// Mock implementation of the HTTP transport seam.
	pub HttpTransport {}

	#[async_trait]
	impl HttpTransport for HttpTransport {
		async fn post(
			&self,
			url: &str,
			payload: &Value,
			headers: &HeaderMap,
			timeout: Duration,
		) -> TransportOutcome;
	}
}

mock! {
	/// Mock implementation of the delivery record storage seam.
	pub DeliveryStorage {}

	#[async_trait]
	impl DeliveryStorage for DeliveryStorage {
		async fn insert(
			&self,
			record: DeliveryRecord,
		) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

		async fn get_by_webhook(
			&self,
			webhook_id: &str,
		) -> Result<Vec<DeliveryRecord>, Box<dyn std::error::Error + Send + Sync>>;
	}
}

pub const TEST_CONTRACT: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

/// A successful transport outcome with the given status.
pub fn outcome(status: u16) -> TransportOutcome {
	let success = (200..300).contains(&status);
	TransportOutcome {
		success,
		status_code: Some(status),
		response_time_ms: 5,
		body: None,
		error: (!success).then(|| format!("webhook returned error status: {}", status)),
	}
}

/// A valid webhook configuration pointing at `url`.
pub fn webhook(id: &str, url: &str, retry_attempts: u32) -> WebhookConfig {
	WebhookConfig {
		id: id.to_string(),
		url: url.to_string(),
		format: "flat".to_string(),
		headers: HashMap::new(),
		timeout_ms: 5_000,
		retry_attempts,
		secret: None,
	}
}

/// A subscription on the test contract's Transfer event.
pub fn subscription(
	id: &str,
	filters: HashMap<String, FilterCondition>,
	webhooks: Vec<WebhookConfig>,
) -> EventSubscription {
	EventSubscription {
		id: id.to_string(),
		contract_address: TEST_CONTRACT.to_string(),
		event_signature: "Transfer(address,address,uint256)".to_string(),
		filters,
		webhooks,
	}
}

/// A structurally valid Transfer event with the given args.
pub fn transfer_event(args: Value) -> BlockchainEvent {
	BlockchainEvent {
		contract_address: TEST_CONTRACT.to_string(),
		event_name: "Transfer".to_string(),
		block_number: 18_000_000,
		transaction_hash: format!("0x{}", "ab".repeat(32)),
		log_index: 0,
		args: serde_json::from_value(args).expect("object args"),
		timestamp: Utc::now(),
	}
}

/// The `value > 10^18` filter used by the end-to-end scenarios.
pub fn large_value_filter() -> HashMap<String, FilterCondition> {
	serde_json::from_value(json!({
		"value": { "operator": "gt", "value": "1000000000000000000" }
	}))
	.expect("valid filter")
}
