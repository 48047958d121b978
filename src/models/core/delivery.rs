//! Delivery bookkeeping models.
//!
//! A [`WebhookDelivery`] is created per matched webhook and mutated by the
//! queue as attempts proceed. Every attempt produces one immutable
//! [`DeliveryResult`], which the tracker persists as a [`DeliveryRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::core::{event::BlockchainEvent, webhook::WebhookConfig};

/// Lifecycle status of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
	Pending,
	Processing,
	Completed,
	Failed,
}

/// One attempted or completed transmission of a matched event to one
/// webhook destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
	/// Unique delivery identifier
	pub id: String,
	/// Owning subscription
	pub subscription_id: String,
	/// Destination webhook
	pub webhook_id: String,
	/// The triggering event; the wire payload is always rebuilt from this
	pub event: BlockchainEvent,
	/// Payload snapshot computed at match time, kept for bookkeeping only
	pub payload: Value,
	/// Retries consumed so far (0 for a delivery that has not been retried)
	pub attempts: u32,
	/// Retry budget from the webhook configuration
	pub max_attempts: u32,
	pub status: DeliveryStatus,
	pub created_at: DateTime<Utc>,
}

impl WebhookDelivery {
	/// Creates a pending delivery for one webhook of a matched subscription.
	pub fn new(
		subscription_id: &str,
		webhook: &WebhookConfig,
		event: BlockchainEvent,
		payload: Value,
	) -> Self {
		Self {
			id: Uuid::new_v4().to_string(),
			subscription_id: subscription_id.to_string(),
			webhook_id: webhook.id.clone(),
			event,
			payload,
			attempts: 0,
			max_attempts: webhook.retry_attempts,
			status: DeliveryStatus::Pending,
			created_at: Utc::now(),
		}
	}

	/// True once the delivery reached a terminal state.
	pub fn is_terminal(&self) -> bool {
		matches!(self.status, DeliveryStatus::Completed | DeliveryStatus::Failed)
	}
}

/// Outcome of a single send attempt. Produced once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
	pub success: bool,
	/// Wall-clock time of the attempt in milliseconds
	pub response_time_ms: u64,
	/// HTTP status, when a response was received
	pub status_code: Option<u16>,
	/// Response body, when a response was received
	pub response_body: Option<String>,
	/// Failure description, when the attempt did not succeed
	pub error: Option<String>,
	/// Earliest next attempt, set when the circuit breaker denied the call
	pub retry_after: Option<DateTime<Utc>>,
}

impl DeliveryResult {
	/// A failure result that never reached the transport.
	pub fn failure(error: impl Into<String>) -> Self {
		Self {
			success: false,
			response_time_ms: 0,
			status_code: None,
			response_body: None,
			error: Some(error.into()),
			retry_after: None,
		}
	}
}

/// Persisted record of one attempt, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
	pub id: String,
	pub delivery_id: String,
	pub subscription_id: String,
	pub webhook_id: String,
	/// Attempt ordinal: 0 for the initial send, 1.. for retries
	pub attempt: u32,
	pub success: bool,
	pub status_code: Option<u16>,
	pub response_time_ms: u64,
	pub error: Option<String>,
	/// Set only when the endpoint accepted the delivery (status < 300)
	pub delivered_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
}

impl DeliveryRecord {
	/// Builds the record for one attempt of `delivery` with outcome `result`.
	pub fn from_attempt(delivery: &WebhookDelivery, result: &DeliveryResult) -> Self {
		let now = Utc::now();
		let delivered = result.success && result.status_code.map(|s| s < 300).unwrap_or(false);
		Self {
			id: Uuid::new_v4().to_string(),
			delivery_id: delivery.id.clone(),
			subscription_id: delivery.subscription_id.clone(),
			webhook_id: delivery.webhook_id.clone(),
			attempt: delivery.attempts,
			success: result.success,
			status_code: result.status_code,
			response_time_ms: result.response_time_ms,
			error: result.error.clone(),
			delivered_at: delivered.then_some(now),
			created_at: now,
		}
	}
}

/// Aggregated delivery statistics for one webhook endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryStats {
	pub total_attempts: u64,
	pub successful_attempts: u64,
	pub failed_attempts: u64,
	pub avg_response_time_ms: f64,
	pub min_response_time_ms: Option<u64>,
	pub max_response_time_ms: Option<u64>,
	pub last_delivered_at: Option<DateTime<Utc>>,
}
