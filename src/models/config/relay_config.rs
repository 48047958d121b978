//! Application-level relay configuration.
//!
//! Tuning knobs for the delivery pipeline: queue concurrency, retry policy,
//! circuit breaker thresholds and the delivery record store. Loaded from a
//! JSON file; individual values can be overridden through environment
//! variables (RELAY_MAX_CONCURRENT_DELIVERIES, RELAY_DATA_DIR).

use std::{env, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::models::config::error::ConfigError;

/// Delivery queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSettings {
	/// Maximum simultaneous in-flight deliveries
	#[serde(default = "default_max_concurrent")]
	pub max_concurrent_deliveries: usize,
}

/// Retry scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
	#[serde(default = "default_base_delay_ms")]
	pub base_delay_ms: u64,
	#[serde(default = "default_max_delay_ms")]
	pub max_delay_ms: u64,
	/// Additive jitter as a fraction of the computed delay, 0.0..=1.0
	#[serde(default = "default_jitter_factor")]
	pub jitter_factor: f64,
}

/// Circuit breaker settings applied to every webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerSettings {
	#[serde(default = "default_failure_threshold")]
	pub failure_threshold: u32,
	#[serde(default = "default_reset_timeout_ms")]
	pub reset_timeout_ms: u64,
	#[serde(default = "default_monitoring_window_ms")]
	pub monitoring_window_ms: u64,
}

/// Where delivery records are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
	Memory,
	File,
}

fn default_max_concurrent() -> usize {
	10
}
fn default_base_delay_ms() -> u64 {
	1_000
}
fn default_max_delay_ms() -> u64 {
	60_000
}
fn default_jitter_factor() -> f64 {
	0.1
}
fn default_failure_threshold() -> u32 {
	5
}
fn default_reset_timeout_ms() -> u64 {
	60_000
}
fn default_monitoring_window_ms() -> u64 {
	120_000
}
fn default_storage() -> StorageBackend {
	StorageBackend::Memory
}
fn default_data_dir() -> String {
	"data".to_string()
}

/// Top-level relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
	#[serde(default)]
	pub queue: QueueSettings,
	#[serde(default)]
	pub retry: RetrySettings,
	#[serde(default)]
	pub circuit_breaker: BreakerSettings,
	#[serde(default = "default_storage")]
	pub storage: StorageBackend,
	/// Directory for the file storage backend
	#[serde(default = "default_data_dir")]
	pub data_dir: String,
}

impl Default for QueueSettings {
	fn default() -> Self {
		Self {
			max_concurrent_deliveries: default_max_concurrent(),
		}
	}
}

impl Default for RetrySettings {
	fn default() -> Self {
		Self {
			base_delay_ms: default_base_delay_ms(),
			max_delay_ms: default_max_delay_ms(),
			jitter_factor: default_jitter_factor(),
		}
	}
}

impl Default for BreakerSettings {
	fn default() -> Self {
		Self {
			failure_threshold: default_failure_threshold(),
			reset_timeout_ms: default_reset_timeout_ms(),
			monitoring_window_ms: default_monitoring_window_ms(),
		}
	}
}

impl Default for RelayConfig {
	fn default() -> Self {
		Self {
			queue: QueueSettings::default(),
			retry: RetrySettings::default(),
			circuit_breaker: BreakerSettings::default(),
			storage: default_storage(),
			data_dir: default_data_dir(),
		}
	}
}

impl RelayConfig {
	/// Load the relay configuration from a JSON file, falling back to
	/// defaults when no path is given, then apply environment overrides.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let mut config = match path {
			Some(path) => {
				let content = fs::read_to_string(path)?;
				serde_json::from_str(&content)?
			}
			None => Self::default(),
		};

		if let Ok(value) = env::var("RELAY_MAX_CONCURRENT_DELIVERIES") {
			config.queue.max_concurrent_deliveries = value.parse().map_err(|_| {
				ConfigError::validation_error(format!(
					"RELAY_MAX_CONCURRENT_DELIVERIES must be a positive integer, got '{}'",
					value
				))
			})?;
		}
		if let Ok(value) = env::var("RELAY_DATA_DIR") {
			config.data_dir = value;
		}

		config.validate()?;
		Ok(config)
	}

	/// Validate bounds on every setting.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.queue.max_concurrent_deliveries == 0 {
			return Err(ConfigError::validation_error(
				"max_concurrent_deliveries must be at least 1",
			));
		}
		if self.retry.base_delay_ms == 0 {
			return Err(ConfigError::validation_error(
				"base_delay_ms must be positive",
			));
		}
		if self.retry.max_delay_ms < self.retry.base_delay_ms {
			return Err(ConfigError::validation_error(
				"max_delay_ms must be at least base_delay_ms",
			));
		}
		if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
			return Err(ConfigError::validation_error(
				"jitter_factor must be between 0.0 and 1.0",
			));
		}
		if self.circuit_breaker.failure_threshold == 0 {
			return Err(ConfigError::validation_error(
				"failure_threshold must be at least 1",
			));
		}
		if self.circuit_breaker.reset_timeout_ms == 0
			|| self.circuit_breaker.monitoring_window_ms == 0
		{
			return Err(ConfigError::validation_error(
				"circuit breaker timeouts must be positive",
			));
		}
		if self.storage == StorageBackend::File && self.data_dir.trim().is_empty() {
			return Err(ConfigError::validation_error(
				"data_dir is required for the file storage backend",
			));
		}
		Ok(())
	}
}
