//! End-to-end pipeline scenarios: source -> processor -> filter -> queue ->
//! sender -> tracker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chain_webhook_relay::models::DeliveryStats;
use chain_webhook_relay::services::{
	breaker::{CircuitBreakerConfig, CircuitBreakerRegistry},
	filter::FilterService,
	processor::EventProcessor,
	queue::{BackoffPolicy, DeliveryQueue, DeliverySender},
	sender::{HttpTransport, TransportOutcome, WebhookSender},
	source::ChannelEventSource,
	tracker::{DeliveryTracker, InMemoryDeliveryStorage},
};
use futures::future::join_all;
use reqwest::header::HeaderMap;
use serde_json::{json, Value};

use super::mocks::{large_value_filter, outcome, subscription, transfer_event, webhook};

/// Transport double returning a fixed status, recording call instants.
struct RecordingTransport {
	status: u16,
	calls: AtomicU32,
	call_times: Mutex<Vec<Instant>>,
}

impl RecordingTransport {
	fn returning(status: u16) -> Arc<Self> {
		Arc::new(Self {
			status,
			calls: AtomicU32::new(0),
			call_times: Mutex::new(Vec::new()),
		})
	}

	fn calls(&self) -> u32 {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl HttpTransport for RecordingTransport {
	async fn post(
		&self,
		_url: &str,
		_payload: &Value,
		_headers: &HeaderMap,
		_timeout: Duration,
	) -> TransportOutcome {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.call_times.lock().unwrap().push(Instant::now());
		outcome(self.status)
	}
}

struct Pipeline {
	processor: Arc<EventProcessor>,
	source: Arc<ChannelEventSource>,
	tracker: Arc<DeliveryTracker>,
}

/// Wires a full pipeline around the given transport with fast backoff.
fn pipeline(transport: Arc<dyn HttpTransport>) -> Pipeline {
	let storage = Arc::new(InMemoryDeliveryStorage::new());
	let tracker = Arc::new(DeliveryTracker::new(storage));
	let breakers = Arc::new(CircuitBreakerRegistry::new(CircuitBreakerConfig {
		failure_threshold: 100,
		reset_timeout: chrono::Duration::milliseconds(60_000),
		monitoring_window: chrono::Duration::milliseconds(120_000),
	}));
	let sender = Arc::new(WebhookSender::new(transport, breakers, tracker.clone()));
	let queue = Arc::new(DeliveryQueue::new(
		sender.clone() as Arc<dyn DeliverySender>,
		BackoffPolicy {
			base_delay: Duration::from_millis(100),
			max_delay: Duration::from_millis(2_000),
			jitter_factor: 0.0,
		},
		4,
	));
	let source = Arc::new(ChannelEventSource::new(256));
	let processor = Arc::new(EventProcessor::new(
		source.clone(),
		Arc::new(FilterService::new()),
		queue,
		sender,
	));
	Pipeline {
		processor,
		source,
		tracker,
	}
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
	for _ in 0..300 {
		if condition() {
			return;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	panic!("condition not reached within timeout");
}

#[tokio::test]
async fn test_gt_filter_boundary_does_not_match_but_larger_does() {
	let transport = RecordingTransport::returning(200);
	let p = pipeline(transport.clone());

	p.processor
		.add_subscription(subscription(
			"large-transfers",
			large_value_filter(),
			vec![
				webhook("wh-a", "https://hooks.example.com/a", 0),
				webhook("wh-b", "https://hooks.example.com/b", 0),
			],
		))
		.await
		.unwrap();
	p.processor.start().await.unwrap();
	let handle = p.source.handle();

	// exactly the boundary: gt is strict, no delivery
	handle
		.emit(
			"large-transfers",
			transfer_event(json!({"value": "1000000000000000000"})),
		)
		.unwrap();
	tokio::time::sleep(Duration::from_millis(150)).await;
	assert_eq!(transport.calls(), 0);

	// strictly greater: one delivery per configured webhook
	handle
		.emit(
			"large-transfers",
			transfer_event(json!({"value": "2000000000000000000"})),
		)
		.unwrap();

	wait_until(|| transport.calls() == 2).await;
	p.processor.stop().await.unwrap();

	let stats = p.processor.stats().await;
	assert_eq!(stats.queue.completed_count, 2);
	assert_eq!(stats.queue.failed_count, 0);
}

#[tokio::test]
async fn test_always_failing_webhook_makes_initial_plus_retry_attempts() {
	let transport = RecordingTransport::returning(500);
	let p = pipeline(transport.clone());

	p.processor
		.add_subscription(subscription(
			"sub-1",
			HashMap::new(),
			vec![webhook("wh-flaky", "https://hooks.example.com/x", 2)],
		))
		.await
		.unwrap();
	p.processor.start().await.unwrap();

	p.source
		.handle()
		.emit("sub-1", transfer_event(json!({"value": "1"})))
		.unwrap();

	// initial attempt + 2 retries, then terminal failure
	wait_until(|| transport.calls() == 3).await;

	let mut failed = 0;
	for _ in 0..100 {
		failed = p.processor.stats().await.queue.failed_count;
		if failed == 1 {
			break;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	assert_eq!(failed, 1);
	assert_eq!(transport.calls(), 3);

	// backoff between attempts grows: ~100ms then ~200ms
	let times = transport.call_times.lock().unwrap().clone();
	let first_gap = times[1].duration_since(times[0]);
	let second_gap = times[2].duration_since(times[1]);
	assert!(first_gap >= Duration::from_millis(80), "{:?}", first_gap);
	assert!(second_gap >= Duration::from_millis(160), "{:?}", second_gap);
	assert!(second_gap > first_gap);

	p.processor.stop().await.unwrap();

	// every attempt produced exactly one record
	let records = p.tracker.get_delivery_stats("wh-flaky").await.unwrap();
	assert_eq!(records.total_attempts, 3);
	assert_eq!(records.failed_attempts, 3);
}

#[tokio::test]
async fn test_burst_of_events_all_delivered() {
	let transport = RecordingTransport::returning(200);
	let p = pipeline(transport.clone());

	p.processor
		.add_subscription(subscription(
			"sub-1",
			HashMap::new(),
			vec![webhook("wh-1", "https://hooks.example.com/x", 0)],
		))
		.await
		.unwrap();
	p.processor.start().await.unwrap();

	let emits = (0..10u64).map(|i| {
		let handle = p.source.handle();
		async move {
			let mut event = transfer_event(json!({"value": i.to_string()}));
			event.log_index = i;
			handle.emit("sub-1", event)
		}
	});
	for result in join_all(emits).await {
		result.unwrap();
	}

	wait_until(|| transport.calls() == 10).await;
	p.processor.stop().await.unwrap();
	assert_eq!(p.processor.stats().await.queue.completed_count, 10);
}

#[tokio::test]
async fn test_tracker_stats_aggregate_the_run() {
	let transport = RecordingTransport::returning(200);
	let p = pipeline(transport.clone());

	p.processor
		.add_subscription(subscription(
			"sub-1",
			HashMap::new(),
			vec![webhook("wh-1", "https://hooks.example.com/x", 0)],
		))
		.await
		.unwrap();
	p.processor.start().await.unwrap();

	for i in 0..3u64 {
		let mut event = transfer_event(json!({"value": "1"}));
		event.log_index = i;
		p.source.handle().emit("sub-1", event).unwrap();
	}

	wait_until(|| transport.calls() == 3).await;
	p.processor.stop().await.unwrap();

	let stats: DeliveryStats = p.tracker.get_delivery_stats("wh-1").await.unwrap();
	assert_eq!(stats.total_attempts, 3);
	assert_eq!(stats.successful_attempts, 3);
	assert_eq!(stats.failed_attempts, 0);
	assert!(stats.last_delivered_at.is_some());
}
