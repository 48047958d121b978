//! Webhook destination configuration.

use std::{collections::HashMap, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

/// Upper bound on per-request timeout (5 minutes)
pub const MAX_TIMEOUT_MS: u64 = 300_000;
/// Upper bound on the retry attempt budget
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Configuration for a single webhook destination.
///
/// Validated before every delivery attempt; an invalid config never reaches
/// the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
	/// Unique webhook identifier
	pub id: String,
	/// Destination URL (http or https)
	pub url: String,
	/// Wire payload shape; one of the names accepted by [`PayloadFormat`]
	#[serde(default = "default_format")]
	pub format: String,
	/// Static headers merged into every request (override defaults on conflict)
	#[serde(default)]
	pub headers: HashMap<String, String>,
	/// Per-request timeout in milliseconds (positive, at most 5 minutes)
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	/// Retry budget after the initial attempt (0-10)
	#[serde(default = "default_retry_attempts")]
	pub retry_attempts: u32,
	/// Optional HMAC-SHA256 signing secret; adds X-Signature/X-Timestamp headers
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secret: Option<String>,
}

fn default_format() -> String {
	PayloadFormat::Flat.as_str().to_string()
}

fn default_timeout_ms() -> u64 {
	30_000
}

fn default_retry_attempts() -> u32 {
	3
}

/// Closed enumeration of supported wire payload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
	/// Flat object with `event_`-prefixed snake_case fields
	Flat,
	/// `metadata` + `data` envelope
	Nested,
	/// camelCase fields under an `eventData` envelope
	CamelCase,
	/// Canonical event serialized as-is
	Raw,
}

impl PayloadFormat {
	/// All supported formats, in wire-name order
	pub const ALL: [PayloadFormat; 4] = [
		PayloadFormat::Flat,
		PayloadFormat::Nested,
		PayloadFormat::CamelCase,
		PayloadFormat::Raw,
	];

	/// Wire name for this format
	pub fn as_str(&self) -> &'static str {
		match self {
			PayloadFormat::Flat => "flat",
			PayloadFormat::Nested => "nested",
			PayloadFormat::CamelCase => "camelcase",
			PayloadFormat::Raw => "raw",
		}
	}

	/// Comma-separated list of supported wire names, for error messages
	pub fn supported_names() -> String {
		Self::ALL
			.iter()
			.map(|f| f.as_str())
			.collect::<Vec<_>>()
			.join(", ")
	}
}

impl FromStr for PayloadFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"flat" => Ok(PayloadFormat::Flat),
			"nested" => Ok(PayloadFormat::Nested),
			"camelcase" => Ok(PayloadFormat::CamelCase),
			"raw" => Ok(PayloadFormat::Raw),
			other => Err(format!(
				"unsupported payload format '{}'; supported formats: {}",
				other,
				PayloadFormat::supported_names()
			)),
		}
	}
}

impl WebhookConfig {
	/// Validates every field of the configuration.
	///
	/// # Returns
	/// * `Err(String)` naming the first invalid field, `Ok(())` otherwise
	pub fn validate(&self) -> Result<(), String> {
		if self.id.trim().is_empty() {
			return Err("webhook id is required".to_string());
		}

		let url = url::Url::parse(&self.url).map_err(|e| format!("invalid url: {}", e))?;
		if url.scheme() != "http" && url.scheme() != "https" {
			return Err(format!(
				"unsupported url scheme '{}'; expected http or https",
				url.scheme()
			));
		}

		PayloadFormat::from_str(&self.format)?;

		if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
			return Err(format!(
				"timeout must be between 1 and {} ms, got {}",
				MAX_TIMEOUT_MS, self.timeout_ms
			));
		}

		if self.retry_attempts > MAX_RETRY_ATTEMPTS {
			return Err(format!(
				"retry attempts must be at most {}, got {}",
				MAX_RETRY_ATTEMPTS, self.retry_attempts
			));
		}

		for (name, value) in &self.headers {
			if reqwest::header::HeaderName::from_bytes(name.as_bytes()).is_err() {
				return Err(format!("invalid header name: {}", name));
			}
			if reqwest::header::HeaderValue::from_str(value).is_err() {
				return Err(format!("invalid header value for key: {}", name));
			}
		}

		Ok(())
	}

	/// Parsed payload format; only valid after [`validate`](Self::validate)
	pub fn payload_format(&self) -> Result<PayloadFormat, String> {
		PayloadFormat::from_str(&self.format)
	}

	/// Request timeout as a `Duration`
	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}
}
