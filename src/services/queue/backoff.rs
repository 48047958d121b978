//! Retry backoff scheduling.
//!
//! A pure delay calculator: every call is independently reproducible given
//! the same attempt number and jitter draw. No state is carried between
//! calls.

use std::time::Duration;

use crate::models::{DeliveryStatus, RetrySettings, WebhookDelivery};

/// Exponential backoff with a cap and optional additive jitter.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
	/// Delay before the first retry
	pub base_delay: Duration,
	/// Cap applied to the exponential term
	pub max_delay: Duration,
	/// Additive jitter as a fraction of the computed delay, 0.0..=1.0
	pub jitter_factor: f64,
}

impl From<&RetrySettings> for BackoffPolicy {
	fn from(settings: &RetrySettings) -> Self {
		Self {
			base_delay: Duration::from_millis(settings.base_delay_ms),
			max_delay: Duration::from_millis(settings.max_delay_ms),
			jitter_factor: settings.jitter_factor,
		}
	}
}

impl Default for BackoffPolicy {
	fn default() -> Self {
		(&RetrySettings::default()).into()
	}
}

impl BackoffPolicy {
	/// Delay before retry number `attempt` (0-based).
	///
	/// `min(base_delay * 2^attempt, max_delay)`, plus a non-negative jitter
	/// drawn uniformly from `[0, jitter_factor * delay]`. The jitter is
	/// additive, so the result never drops below the capped exponential
	/// value.
	pub fn backoff_delay(&self, attempt: u32) -> Duration {
		let base_ms = self.base_delay.as_millis();
		let exponential = base_ms.saturating_mul(1u128 << attempt.min(64));
		let capped = exponential.min(self.max_delay.as_millis()) as u64;

		let jitter = if self.jitter_factor > 0.0 {
			(capped as f64 * self.jitter_factor * rand::random::<f64>()) as u64
		} else {
			0
		};

		Duration::from_millis(capped.saturating_add(jitter))
	}

	/// Whether a failed delivery has retry budget left.
	///
	/// True iff the delivery has not completed and its retry budget is not
	/// exhausted.
	pub fn should_retry(&self, delivery: &WebhookDelivery) -> bool {
		delivery.attempts < delivery.max_attempts
			&& delivery.status != DeliveryStatus::Completed
	}
}
