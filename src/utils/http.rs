//! Shared HTTP client construction.

use std::time::Duration;

/// Builds the pooled `reqwest` client shared by every webhook transport.
///
/// Retries are deliberately not configured here: the delivery queue owns
/// retry scheduling, and the transport must perform exactly one attempt per
/// queue item.
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
	reqwest::Client::builder()
		.pool_max_idle_per_host(10)
		.pool_idle_timeout(Some(Duration::from_secs(90)))
		.connect_timeout(Duration::from_secs(10))
		.build()
}
