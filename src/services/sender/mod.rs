//! Webhook send orchestration.
//!
//! `send_webhook` is the single path every delivery attempt goes through:
//! resolve and validate the configuration, consult the endpoint's circuit
//! breaker, build the formatted payload and headers, invoke the transport,
//! and hand the outcome to the delivery tracker. Tracking happens exactly
//! once per call on every path, success or failure.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use sha2::Sha256;
use tokio::sync::RwLock;

use crate::{
	models::{DeliveryResult, WebhookConfig, WebhookDelivery},
	services::{
		breaker::CircuitBreakerRegistry,
		formatter::formatter_for,
		queue::DeliverySender,
		tracker::DeliveryTracker,
	},
};

mod error;
mod transport;

pub use error::SenderError;
pub use transport::{HttpClientTransport, HttpTransport, TransportOutcome};

/// HMAC SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Service sending webhook deliveries through the transport seam.
pub struct WebhookSender {
	transport: Arc<dyn HttpTransport>,
	breakers: Arc<CircuitBreakerRegistry>,
	tracker: Arc<DeliveryTracker>,
	/// Registered webhook configurations, looked up when no explicit config is passed
	configs: RwLock<HashMap<String, WebhookConfig>>,
}

impl WebhookSender {
	pub fn new(
		transport: Arc<dyn HttpTransport>,
		breakers: Arc<CircuitBreakerRegistry>,
		tracker: Arc<DeliveryTracker>,
	) -> Self {
		Self {
			transport,
			breakers,
			tracker,
			configs: RwLock::new(HashMap::new()),
		}
	}

	/// Registers (or replaces) a webhook configuration for lookup.
	pub async fn register_webhook(&self, config: WebhookConfig) {
		self.configs.write().await.insert(config.id.clone(), config);
	}

	/// Removes a registered webhook configuration.
	pub async fn remove_webhook(&self, webhook_id: &str) {
		self.configs.write().await.remove(webhook_id);
	}

	/// Sends one delivery attempt.
	///
	/// # Arguments
	/// * `delivery` - The delivery to attempt; the payload is rebuilt from
	///   its canonical event, never taken from the bookkeeping snapshot
	/// * `config` - Explicit configuration; falls back to the registered one
	///
	/// # Returns
	/// * `Ok(DeliveryResult)` - The attempt outcome (including circuit-open
	///   denials, which never reach the transport)
	/// * `Err(SenderError)` - The configuration was missing or invalid; no
	///   network call was made
	pub async fn send_webhook(
		&self,
		delivery: &WebhookDelivery,
		config: Option<&WebhookConfig>,
	) -> Result<DeliveryResult, SenderError> {
		// Resolve configuration: explicit argument or internal lookup
		let config = match config {
			Some(config) => config.clone(),
			None => match self.configs.read().await.get(&delivery.webhook_id) {
				Some(config) => config.clone(),
				None => {
					let error = SenderError::not_found(format!(
						"no configuration registered for webhook {}",
						delivery.webhook_id
					));
					let result = DeliveryResult::failure(error.to_string());
					self.tracker.track_delivery(delivery, &result).await;
					return Err(error);
				}
			},
		};

		// Validate field-by-field before anything touches the network
		if let Err(msg) = config.validate() {
			let error = SenderError::validation_error(msg);
			let result = DeliveryResult::failure(error.to_string());
			self.tracker.track_delivery(delivery, &result).await;
			return Err(error);
		}

		// Consult the endpoint's circuit breaker
		let breaker = self.breakers.get_or_create(&config.id).await;
		{
			let mut breaker = breaker.lock().await;
			if !breaker.can_execute() {
				let result = DeliveryResult {
					success: false,
					response_time_ms: 0,
					status_code: None,
					response_body: None,
					error: Some(format!(
						"circuit breaker is {} for webhook {}",
						breaker.state(),
						config.id
					)),
					retry_after: breaker.next_attempt_at(),
				};
				drop(breaker);

				tracing::warn!(
					webhook = %config.id,
					"delivery denied by circuit breaker"
				);
				self.tracker.track_delivery(delivery, &result).await;
				return Ok(result);
			}
		}

		// Build the wire payload from the canonical event
		let format = match config.payload_format() {
			Ok(format) => format,
			// unreachable after validate() unless the config was replaced
			Err(msg) => {
				let error = SenderError::validation_error(msg);
				let result = DeliveryResult::failure(error.to_string());
				self.tracker.track_delivery(delivery, &result).await;
				return Err(error);
			}
		};
		let formatter = formatter_for(format);
		if !formatter.validate_format() {
			let error = SenderError::validation_error(format!(
				"formatter for '{}' failed validation",
				config.format
			));
			let result = DeliveryResult::failure(error.to_string());
			self.tracker.track_delivery(delivery, &result).await;
			return Err(error);
		}
		let payload = formatter.format_payload(&delivery.event);

		let headers = match self.build_headers(&config, &payload) {
			Ok(headers) => headers,
			Err(error) => {
				let result = DeliveryResult::failure(error.to_string());
				self.tracker.track_delivery(delivery, &result).await;
				return Err(error);
			}
		};

		// Invoke the transport and feed the breaker
		let outcome = self
			.transport
			.post(&config.url, &payload, &headers, config.timeout())
			.await;

		{
			let mut breaker = breaker.lock().await;
			if outcome.success {
				breaker.record_success();
			} else {
				breaker.record_failure();
			}
		}

		let result = DeliveryResult {
			success: outcome.success,
			response_time_ms: outcome.response_time_ms,
			status_code: outcome.status_code,
			response_body: outcome.body,
			error: outcome.error,
			retry_after: None,
		};

		// Tracking is unconditional, error paths included
		self.tracker.track_delivery(delivery, &result).await;
		Ok(result)
	}

	/// Default headers merged with per-webhook headers (webhook wins),
	/// plus signature headers when a secret is configured.
	fn build_headers(
		&self,
		config: &WebhookConfig,
		payload: &Value,
	) -> Result<HeaderMap, SenderError> {
		let mut headers = HeaderMap::new();
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		for (key, value) in &config.headers {
			let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
				SenderError::internal_error(format!("invalid header name: {}", key))
			})?;
			let value = HeaderValue::from_str(value).map_err(|_| {
				SenderError::internal_error(format!("invalid header value for key: {}", key))
			})?;
			headers.insert(name, value);
		}

		if let Some(secret) = &config.secret {
			let (signature, timestamp) = sign_payload(secret, payload)?;
			headers.insert(
				HeaderName::from_static("x-signature"),
				HeaderValue::from_str(&signature).map_err(|_| {
					SenderError::internal_error("invalid signature value")
				})?,
			);
			headers.insert(
				HeaderName::from_static("x-timestamp"),
				HeaderValue::from_str(&timestamp).map_err(|_| {
					SenderError::internal_error("invalid timestamp value")
				})?,
			);
		}

		Ok(headers)
	}
}

/// HMAC-SHA256 signature over the serialized payload and a millisecond
/// timestamp.
///
/// # Returns
/// * `(signature_hex, timestamp)` on success
fn sign_payload(secret: &str, payload: &Value) -> Result<(String, String), SenderError> {
	let timestamp = Utc::now().timestamp_millis();

	let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
		.map_err(|e| SenderError::internal_error(format!("invalid signing secret: {}", e)))?;

	let message = format!("{}{}", payload, timestamp);
	mac.update(message.as_bytes());

	let signature = hex::encode(mac.finalize().into_bytes());
	Ok((signature, timestamp.to_string()))
}

#[async_trait]
impl DeliverySender for WebhookSender {
	async fn send(&self, delivery: &WebhookDelivery) -> Result<DeliveryResult, SenderError> {
		self.send_webhook(delivery, None).await
	}
}
