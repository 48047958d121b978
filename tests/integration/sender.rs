//! Webhook sender integration tests: transport gating, tracking guarantees
//! and real HTTP round trips.

use std::sync::Arc;

use chain_webhook_relay::models::{DeliveryResult, WebhookDelivery};
use chain_webhook_relay::services::{
	breaker::{CircuitBreakerConfig, CircuitBreakerRegistry},
	sender::{HttpClientTransport, HttpTransport, SenderError, WebhookSender},
	tracker::{DeliveryTracker, InMemoryDeliveryStorage},
};
use mockito::Matcher;
use serde_json::json;

use super::mocks::{outcome, subscription, transfer_event, webhook, MockDeliveryStorage, MockHttpTransport};

fn breakers() -> Arc<CircuitBreakerRegistry> {
	Arc::new(CircuitBreakerRegistry::new(CircuitBreakerConfig {
		failure_threshold: 3,
		reset_timeout: chrono::Duration::milliseconds(60_000),
		monitoring_window: chrono::Duration::milliseconds(120_000),
	}))
}

fn delivery_for(config: &chain_webhook_relay::models::WebhookConfig) -> WebhookDelivery {
	WebhookDelivery::new(
		"sub-1",
		config,
		transfer_event(json!({"value": "1"})),
		json!({}),
	)
}

////////////////////////////////////////////////////////////
// transport gating
////////////////////////////////////////////////////////////

#[tokio::test]
async fn test_invalid_format_never_invokes_transport() {
	let mut transport = MockHttpTransport::new();
	transport.expect_post().times(0);

	let sender = WebhookSender::new(
		Arc::new(transport),
		breakers(),
		Arc::new(DeliveryTracker::new(Arc::new(
			InMemoryDeliveryStorage::new(),
		))),
	);

	let mut config = webhook("wh-1", "https://hooks.example.com/x", 0);
	config.format = "protobuf".to_string();

	let err = sender
		.send_webhook(&delivery_for(&config), Some(&config))
		.await
		.unwrap_err();

	assert!(matches!(err, SenderError::ValidationError(_)));
	assert!(err.to_string().contains("flat, nested, camelcase, raw"));
}

#[tokio::test]
async fn test_open_breaker_never_invokes_transport() {
	let mut transport = MockHttpTransport::new();
	transport.expect_post().times(0);

	let registry = breakers();
	let sender = WebhookSender::new(
		Arc::new(transport),
		registry.clone(),
		Arc::new(DeliveryTracker::new(Arc::new(
			InMemoryDeliveryStorage::new(),
		))),
	);

	let config = webhook("wh-1", "https://hooks.example.com/x", 0);
	registry.get_or_create("wh-1").await.lock().await.force_open();

	let result: DeliveryResult = sender
		.send_webhook(&delivery_for(&config), Some(&config))
		.await
		.unwrap();

	assert!(!result.success);
	assert!(result.retry_after.is_some());
	assert!(result
		.error
		.as_deref()
		.unwrap()
		.contains("circuit breaker is open"));
}

////////////////////////////////////////////////////////////
// tracking guarantees
////////////////////////////////////////////////////////////

#[tokio::test]
async fn test_tracking_happens_exactly_once_per_attempt() {
	let mut transport = MockHttpTransport::new();
	transport
		.expect_post()
		.times(2)
		.returning(|_, _, _, _| outcome(500));

	// one tracked record per send_webhook call: two transport failures plus
	// one validation failure
	let mut storage = MockDeliveryStorage::new();
	storage.expect_insert().times(3).returning(|_| Ok(()));

	let sender = WebhookSender::new(
		Arc::new(transport),
		breakers(),
		Arc::new(DeliveryTracker::new(Arc::new(storage))),
	);

	let config = webhook("wh-1", "https://hooks.example.com/x", 0);
	let delivery = delivery_for(&config);

	for _ in 0..2 {
		let result = sender
			.send_webhook(&delivery, Some(&config))
			.await
			.unwrap();
		assert!(!result.success);
	}

	let mut bad = config.clone();
	bad.timeout_ms = 0;
	assert!(sender.send_webhook(&delivery, Some(&bad)).await.is_err());
}

////////////////////////////////////////////////////////////
// real HTTP round trips
////////////////////////////////////////////////////////////

#[tokio::test]
async fn test_delivery_over_real_http_with_merged_headers() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("POST", "/hook")
		.match_header("content-type", "application/json")
		.match_header("x-api-key", "k-123")
		.match_header("x-signature", Matcher::Regex("^[0-9a-f]{64}$".to_string()))
		.match_header("x-timestamp", Matcher::Regex("^[0-9]+$".to_string()))
		.match_body(Matcher::PartialJson(json!({"event_name": "Transfer"})))
		.with_status(200)
		.create_async()
		.await;

	let sender = WebhookSender::new(
		Arc::new(HttpClientTransport::new(reqwest::Client::new())),
		breakers(),
		Arc::new(DeliveryTracker::new(Arc::new(
			InMemoryDeliveryStorage::new(),
		))),
	);

	let mut config = webhook("wh-1", &format!("{}/hook", server.url()), 0);
	config
		.headers
		.insert("X-Api-Key".to_string(), "k-123".to_string());
	config.secret = Some("top-secret".to_string());

	let result = sender
		.send_webhook(&delivery_for(&config), Some(&config))
		.await
		.unwrap();

	assert!(result.success);
	assert_eq!(result.status_code, Some(200));
	mock.assert_async().await;
}

#[tokio::test]
async fn test_non_2xx_response_is_a_failed_result() {
	let mut server = mockito::Server::new_async().await;
	server
		.mock("POST", "/hook")
		.with_status(503)
		.create_async()
		.await;

	let sender = WebhookSender::new(
		Arc::new(HttpClientTransport::new(reqwest::Client::new())),
		breakers(),
		Arc::new(DeliveryTracker::new(Arc::new(
			InMemoryDeliveryStorage::new(),
		))),
	);

	let config = webhook("wh-1", &format!("{}/hook", server.url()), 0);
	let result = sender
		.send_webhook(&delivery_for(&config), Some(&config))
		.await
		.unwrap();

	assert!(!result.success);
	assert_eq!(result.status_code, Some(503));
	assert!(result.error.unwrap().contains("503"));
}

#[tokio::test]
async fn test_registered_config_lookup_by_webhook_id() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("POST", "/hook")
		.with_status(204)
		.create_async()
		.await;

	let sender = WebhookSender::new(
		Arc::new(HttpClientTransport::new(reqwest::Client::new())),
		breakers(),
		Arc::new(DeliveryTracker::new(Arc::new(
			InMemoryDeliveryStorage::new(),
		))),
	);

	let config = webhook("wh-1", &format!("{}/hook", server.url()), 0);
	sender.register_webhook(config.clone()).await;

	// sanity: the subscription fixture carries this webhook
	let sub = subscription("sub-1", Default::default(), vec![config.clone()]);
	assert_eq!(sub.webhooks[0].id, "wh-1");

	let result = sender
		.send_webhook(&delivery_for(&config), None)
		.await
		.unwrap();

	assert!(result.success);
	mock.assert_async().await;
}
