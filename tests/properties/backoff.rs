//! Retry scheduler properties.

use std::time::Duration;

use chain_webhook_relay::models::{DeliveryStatus, WebhookDelivery};
use chain_webhook_relay::services::queue::BackoffPolicy;
use proptest::prelude::*;
use serde_json::json;

use super::strategies::valid_event_strategy;

fn policy(base_ms: u64, max_ms: u64, jitter: f64) -> BackoffPolicy {
	BackoffPolicy {
		base_delay: Duration::from_millis(base_ms),
		max_delay: Duration::from_millis(max_ms),
		jitter_factor: jitter,
	}
}

proptest! {
	/// With jitter disabled the delay is exactly `min(base * 2^n, max)`.
	#[test]
	fn prop_delay_formula_is_exact_without_jitter(
		base_ms in 1u64..10_000,
		attempt in 0u32..=20,
	) {
		let max_ms = 60_000u64;
		let expected = ((base_ms as u128) << attempt).min(max_ms as u128) as u64;

		let delay = policy(base_ms, max_ms, 0.0).backoff_delay(attempt);
		prop_assert_eq!(delay, Duration::from_millis(expected));
	}

	/// Jitter is additive and bounded: the delay never drops below the
	/// capped exponential value and never exceeds it by more than the
	/// jitter fraction.
	#[test]
	fn prop_jitter_is_additive_and_bounded(
		base_ms in 1u64..5_000,
		attempt in 0u32..=10,
		jitter in 0.0f64..=1.0,
	) {
		let max_ms = 30_000u64;
		let floor = ((base_ms as u128) << attempt).min(max_ms as u128) as u64;
		let ceiling = floor + (floor as f64 * jitter) as u64 + 1;

		let delay = policy(base_ms, max_ms, jitter).backoff_delay(attempt).as_millis() as u64;
		prop_assert!(delay >= floor, "delay {} below floor {}", delay, floor);
		prop_assert!(delay <= ceiling, "delay {} above ceiling {}", delay, ceiling);
	}

	/// `should_retry` is exactly `attempts < max_attempts` for non-terminal
	/// deliveries, and always false after completion.
	#[test]
	fn prop_should_retry_boundary(
		event in valid_event_strategy(),
		attempts in 0u32..12,
		max_attempts in 0u32..12,
		completed in any::<bool>(),
	) {
		let webhook = chain_webhook_relay::models::WebhookConfig {
			id: "wh-prop".to_string(),
			url: "https://hooks.example.com/x".to_string(),
			format: "flat".to_string(),
			headers: Default::default(),
			timeout_ms: 30_000,
			retry_attempts: max_attempts,
			secret: None,
		};
		let mut delivery = WebhookDelivery::new("sub-prop", &webhook, event, json!({}));
		delivery.attempts = attempts;
		if completed {
			delivery.status = DeliveryStatus::Completed;
		}

		let expected = !completed && attempts < max_attempts;
		prop_assert_eq!(policy(1_000, 60_000, 0.0).should_retry(&delivery), expected);
	}
}
