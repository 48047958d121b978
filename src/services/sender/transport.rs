//! Outbound HTTP transport seam.
//!
//! The sender talks to the network through [`HttpTransport`], a single
//! send-and-measure primitive. Network-level failures (timeout, DNS,
//! connection refused) fold into an unsuccessful [`TransportOutcome`] so the
//! caller handles them identically to non-2xx responses.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;

/// Response bodies are truncated beyond this many bytes
const MAX_BODY_BYTES: usize = 8 * 1024;

/// Measured outcome of one POST attempt.
#[derive(Debug, Clone)]
pub struct TransportOutcome {
	pub success: bool,
	pub status_code: Option<u16>,
	pub response_time_ms: u64,
	pub body: Option<String>,
	pub error: Option<String>,
}

/// Swappable send-and-measure primitive.
#[async_trait]
pub trait HttpTransport: Send + Sync {
	/// POSTs `payload` as JSON to `url` with the given headers and timeout.
	async fn post(
		&self,
		url: &str,
		payload: &Value,
		headers: &HeaderMap,
		timeout: Duration,
	) -> TransportOutcome;
}

/// Production transport over a shared pooled `reqwest` client.
pub struct HttpClientTransport {
	client: reqwest::Client,
}

impl HttpClientTransport {
	pub fn new(client: reqwest::Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl HttpTransport for HttpClientTransport {
	async fn post(
		&self,
		url: &str,
		payload: &Value,
		headers: &HeaderMap,
		timeout: Duration,
	) -> TransportOutcome {
		let started = Instant::now();

		let response = self
			.client
			.post(url)
			.headers(headers.clone())
			.timeout(timeout)
			.json(payload)
			.send()
			.await;

		let response_time_ms = started.elapsed().as_millis() as u64;

		match response {
			Ok(response) => {
				let status = response.status();
				let body = response.text().await.ok().map(|mut body| {
					body.truncate(MAX_BODY_BYTES);
					body
				});

				if status.is_success() {
					TransportOutcome {
						success: true,
						status_code: Some(status.as_u16()),
						response_time_ms,
						body,
						error: None,
					}
				} else {
					TransportOutcome {
						success: false,
						status_code: Some(status.as_u16()),
						response_time_ms,
						body,
						error: Some(format!("webhook returned error status: {}", status)),
					}
				}
			}
			Err(e) => TransportOutcome {
				success: false,
				status_code: None,
				response_time_ms,
				body: None,
				error: Some(format!("failed to send webhook request: {}", e)),
			},
		}
	}
}
