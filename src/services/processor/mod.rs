//! Top-level event processing orchestration.
//!
//! The processor owns the subscription map, consumes the event source's
//! message stream, runs each event through the filter engine, and enqueues
//! one delivery per matching webhook. Source lifecycle signals are
//! re-emitted on the processor's own channel for external observers.
//!
//! Every per-event error is caught and logged; nothing propagates back to
//! the event source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;

use crate::{
	models::{BlockchainEvent, EventSubscription, WebhookDelivery},
	services::{
		filter::FilterService,
		formatter::formatter_for,
		queue::{DeliveryQueue, QueueStats},
		sender::WebhookSender,
		source::{EventSource, SourceMessage},
	},
};

mod error;

pub use error::ProcessorError;

/// Lifecycle signals re-emitted by the processor.
#[derive(Debug, Clone)]
pub enum ProcessorSignal {
	/// The event source started
	Started,
	/// The event source stopped
	Stopped,
	/// The event source reported an error
	Error(String),
}

/// Aggregate processor statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessorStats {
	pub running: bool,
	pub subscription_count: usize,
	pub queue: QueueStats,
}

/// Orchestrator of the event-to-webhook pipeline.
pub struct EventProcessor {
	source: Arc<dyn EventSource>,
	filter: Arc<FilterService>,
	queue: Arc<DeliveryQueue>,
	sender: Arc<WebhookSender>,
	subscriptions: Arc<RwLock<HashMap<String, EventSubscription>>>,
	running: AtomicBool,
	signals_tx: broadcast::Sender<ProcessorSignal>,
	shutdown_tx: watch::Sender<bool>,
	event_loop: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl EventProcessor {
	pub fn new(
		source: Arc<dyn EventSource>,
		filter: Arc<FilterService>,
		queue: Arc<DeliveryQueue>,
		sender: Arc<WebhookSender>,
	) -> Self {
		let (signals_tx, _) = broadcast::channel(64);
		let (shutdown_tx, _) = watch::channel(false);
		Self {
			source,
			filter,
			queue,
			sender,
			subscriptions: Arc::new(RwLock::new(HashMap::new())),
			running: AtomicBool::new(false),
			signals_tx,
			shutdown_tx,
			event_loop: tokio::sync::Mutex::new(None),
		}
	}

	/// New receiver for the processor's lifecycle signal stream.
	pub fn signals(&self) -> broadcast::Receiver<ProcessorSignal> {
		self.signals_tx.subscribe()
	}

	/// Starts the pipeline: queue processing, the event loop and the source.
	///
	/// Idempotent; a second call while running is a no-op.
	pub async fn start(&self) -> Result<(), ProcessorError> {
		if self.running.swap(true, Ordering::SeqCst) {
			tracing::debug!("event processor already running");
			return Ok(());
		}

		self.queue.start_processing().await;

		let _ = self.shutdown_tx.send(false);
		let source_rx = self.source.subscribe();
		let handle = tokio::spawn(event_loop(
			source_rx,
			self.shutdown_tx.subscribe(),
			self.filter.clone(),
			self.queue.clone(),
			self.subscriptions.clone(),
			self.signals_tx.clone(),
		));
		*self.event_loop.lock().await = Some(handle);

		self.source
			.start()
			.await
			.map_err(|e| ProcessorError::source_error(e.to_string()))?;

		tracing::info!("event processor started");
		Ok(())
	}

	/// Stops the pipeline, letting in-flight deliveries finish.
	///
	/// Idempotent; a call while stopped is a no-op.
	pub async fn stop(&self) -> Result<(), ProcessorError> {
		if !self.running.swap(false, Ordering::SeqCst) {
			tracing::debug!("event processor not running");
			return Ok(());
		}

		self.source
			.stop()
			.await
			.map_err(|e| ProcessorError::source_error(e.to_string()))?;

		let _ = self.shutdown_tx.send(true);
		if let Some(handle) = self.event_loop.lock().await.take() {
			if let Err(e) = handle.await {
				tracing::error!("event loop panicked: {}", e);
			}
		}

		self.queue.stop_processing().await;
		tracing::info!("event processor stopped");
		Ok(())
	}

	/// Adds a subscription, validating it synchronously.
	///
	/// The subscription's webhook configurations are registered with the
	/// sender for lookup at delivery time.
	pub async fn add_subscription(
		&self,
		subscription: EventSubscription,
	) -> Result<(), ProcessorError> {
		subscription
			.validate()
			.map_err(ProcessorError::validation_error)?;

		for webhook in &subscription.webhooks {
			self.sender.register_webhook(webhook.clone()).await;
		}

		self.source
			.add_subscription(&subscription)
			.await
			.map_err(|e| ProcessorError::source_error(e.to_string()))?;

		tracing::info!(
			subscription = %subscription.id,
			webhooks = subscription.webhooks.len(),
			"subscription added"
		);
		self.subscriptions
			.write()
			.await
			.insert(subscription.id.clone(), subscription);
		Ok(())
	}

	/// Removes a subscription. Unknown ids log a warning and are a no-op.
	pub async fn remove_subscription(&self, subscription_id: &str) -> Result<(), ProcessorError> {
		let removed = self.subscriptions.write().await.remove(subscription_id);

		let Some(subscription) = removed else {
			tracing::warn!(
				subscription = subscription_id,
				"removing unknown subscription"
			);
			return Ok(());
		};

		for webhook in &subscription.webhooks {
			self.sender.remove_webhook(&webhook.id).await;
		}

		self.source
			.remove_subscription(subscription_id)
			.await
			.map_err(|e| ProcessorError::source_error(e.to_string()))?;

		tracing::info!(subscription = subscription_id, "subscription removed");
		Ok(())
	}

	/// All current subscriptions.
	pub async fn list_subscriptions(&self) -> Vec<EventSubscription> {
		self.subscriptions.read().await.values().cloned().collect()
	}

	/// Aggregate statistics: running flag, subscription count, queue counters.
	pub async fn stats(&self) -> ProcessorStats {
		ProcessorStats {
			running: self.running.load(Ordering::SeqCst),
			subscription_count: self.subscriptions.read().await.len(),
			queue: self.queue.stats(),
		}
	}
}

/// Consumes source messages until shutdown.
async fn event_loop(
	mut source_rx: broadcast::Receiver<SourceMessage>,
	mut shutdown_rx: watch::Receiver<bool>,
	filter: Arc<FilterService>,
	queue: Arc<DeliveryQueue>,
	subscriptions: Arc<RwLock<HashMap<String, EventSubscription>>>,
	signals_tx: broadcast::Sender<ProcessorSignal>,
) {
	loop {
		let message = tokio::select! {
			message = source_rx.recv() => message,
			_ = shutdown_rx.changed() => {
				// drain buffered messages so the final lifecycle signals
				// are still re-emitted
				while let Ok(message) = source_rx.try_recv() {
					match message {
						SourceMessage::Started => {
							let _ = signals_tx.send(ProcessorSignal::Started);
						}
						SourceMessage::Stopped => {
							let _ = signals_tx.send(ProcessorSignal::Stopped);
						}
						SourceMessage::Error(error) => {
							let _ = signals_tx.send(ProcessorSignal::Error(error));
						}
						SourceMessage::Event { .. } => {}
					}
				}
				break;
			}
		};

		match message {
			Ok(SourceMessage::Event {
				subscription_id,
				event,
			}) => {
				handle_event(&filter, &queue, &subscriptions, &subscription_id, event).await;
			}
			Ok(SourceMessage::Started) => {
				let _ = signals_tx.send(ProcessorSignal::Started);
			}
			Ok(SourceMessage::Stopped) => {
				let _ = signals_tx.send(ProcessorSignal::Stopped);
			}
			Ok(SourceMessage::Error(message)) => {
				tracing::error!("event source error: {}", message);
				let _ = signals_tx.send(ProcessorSignal::Error(message));
			}
			Err(broadcast::error::RecvError::Lagged(skipped)) => {
				tracing::warn!(skipped, "event loop lagged behind the source");
			}
			Err(broadcast::error::RecvError::Closed) => break,
		}
	}
}

/// Matches one event and enqueues a delivery per webhook.
///
/// A failure enqueueing one delivery must not prevent enqueueing the others,
/// and nothing here may propagate to the source.
async fn handle_event(
	filter: &FilterService,
	queue: &DeliveryQueue,
	subscriptions: &RwLock<HashMap<String, EventSubscription>>,
	subscription_id: &str,
	event: BlockchainEvent,
) {
	let subscriptions = subscriptions.read().await;
	let Some(subscription) = subscriptions.get(subscription_id) else {
		tracing::warn!(
			subscription = subscription_id,
			"received event for unknown subscription"
		);
		return;
	};

	if !filter.matches_subscription(subscription, &event) {
		tracing::debug!(
			subscription = subscription_id,
			event = %event.event_name,
			"event did not match"
		);
		return;
	}

	for webhook in &subscription.webhooks {
		let payload = match webhook.payload_format() {
			Ok(format) => formatter_for(format).format_payload(&event),
			Err(e) => {
				// still enqueue: the sender surfaces the configuration error
				tracing::warn!(webhook = %webhook.id, "payload snapshot skipped: {}", e);
				serde_json::Value::Null
			}
		};

		let delivery = WebhookDelivery::new(&subscription.id, webhook, event.clone(), payload);
		if let Err(e) = queue.enqueue(delivery) {
			tracing::error!(
				subscription = subscription_id,
				webhook = %webhook.id,
				"failed to enqueue delivery: {}",
				e
			);
		}
	}
}
