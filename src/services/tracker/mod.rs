//! Delivery outcome tracking.
//!
//! Records one row per send attempt and aggregates per-endpoint statistics.
//! Persistence failures are logged and swallowed: a tracking error must
//! never mask or abort the delivery flow that produced the outcome.

use std::sync::Arc;

use thiserror::Error;

use crate::models::{DeliveryRecord, DeliveryResult, DeliveryStats, WebhookDelivery};

mod storage;

pub use storage::{DeliveryStorage, FileDeliveryStorage, InMemoryDeliveryStorage};

#[derive(Debug, Error)]
pub enum TrackerError {
	#[error("Failed to read delivery records: {0}")]
	StorageReadError(String),
}

/// Service recording delivery attempts and aggregating statistics.
pub struct DeliveryTracker {
	storage: Arc<dyn DeliveryStorage>,
}

impl DeliveryTracker {
	pub fn new(storage: Arc<dyn DeliveryStorage>) -> Self {
		Self { storage }
	}

	/// Persists the record for one attempt.
	///
	/// Called exactly once per send attempt regardless of the outcome.
	/// Storage errors are logged, never propagated.
	pub async fn track_delivery(&self, delivery: &WebhookDelivery, result: &DeliveryResult) {
		let record = DeliveryRecord::from_attempt(delivery, result);
		if let Err(e) = self.storage.insert(record).await {
			tracing::error!(
				delivery = %delivery.id,
				webhook = %delivery.webhook_id,
				"failed to persist delivery record: {}",
				e
			);
		}
	}

	/// Aggregates historical records for one webhook endpoint.
	pub async fn get_delivery_stats(
		&self,
		webhook_id: &str,
	) -> Result<DeliveryStats, TrackerError> {
		let records = self
			.storage
			.get_by_webhook(webhook_id)
			.await
			.map_err(|e| TrackerError::StorageReadError(e.to_string()))?;

		let mut stats = DeliveryStats::default();
		let mut total_time: u128 = 0;

		for record in &records {
			stats.total_attempts += 1;
			if record.success {
				stats.successful_attempts += 1;
			} else {
				stats.failed_attempts += 1;
			}

			total_time += record.response_time_ms as u128;
			stats.min_response_time_ms = Some(
				stats
					.min_response_time_ms
					.map_or(record.response_time_ms, |m| m.min(record.response_time_ms)),
			);
			stats.max_response_time_ms = Some(
				stats
					.max_response_time_ms
					.map_or(record.response_time_ms, |m| m.max(record.response_time_ms)),
			);
			if let Some(delivered_at) = record.delivered_at {
				stats.last_delivered_at = Some(
					stats
						.last_delivered_at
						.map_or(delivered_at, |last| last.max(delivered_at)),
				);
			}
		}

		if stats.total_attempts > 0 {
			stats.avg_response_time_ms = total_time as f64 / stats.total_attempts as f64;
		}

		Ok(stats)
	}
}
