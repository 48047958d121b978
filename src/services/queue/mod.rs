//! Admission-controlled delivery queue.
//!
//! The queue is the single point that launches concurrent send operations,
//! bounded by a configurable ceiling. Enqueueing is fire-and-forget; a
//! background loop pulls pending deliveries, invokes the sender, and
//! schedules retries through the backoff policy. Stopping lets in-flight
//! sends finish without losing delivery records.

use std::collections::VecDeque;
use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Arc, Mutex,
};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{watch, Notify, Semaphore};
use tokio::task::JoinHandle;

use crate::models::{DeliveryResult, DeliveryStatus, WebhookDelivery};
use crate::services::sender::SenderError;

mod backoff;
mod error;

pub use backoff::BackoffPolicy;
pub use error::QueueError;

/// Seam between the queue and the webhook sender.
///
/// `Err` means the delivery could never have been attempted (configuration
/// problems); the queue fails such deliveries terminally. `Ok` carries the
/// attempt outcome and goes through the retry policy on failure.
#[async_trait]
pub trait DeliverySender: Send + Sync {
	async fn send(&self, delivery: &WebhookDelivery) -> Result<DeliveryResult, SenderError>;
}

/// Live queue counters, polled by operators and tests.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
	pub pending_count: usize,
	pub processing_count: usize,
	pub completed_count: usize,
	pub failed_count: usize,
	pub max_concurrent_deliveries: usize,
}

struct QueueInner {
	pending: Mutex<VecDeque<WebhookDelivery>>,
	notify: Notify,
	pending_count: AtomicUsize,
	processing_count: AtomicUsize,
	completed_count: AtomicUsize,
	failed_count: AtomicUsize,
	semaphore: Arc<Semaphore>,
	max_concurrent: usize,
	sender: Arc<dyn DeliverySender>,
	backoff: BackoffPolicy,
}

/// Bounded-concurrency delivery queue.
pub struct DeliveryQueue {
	inner: Arc<QueueInner>,
	shutdown_tx: watch::Sender<bool>,
	worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl DeliveryQueue {
	/// Creates a queue delivering through `sender`, retrying per `backoff`,
	/// with at most `max_concurrent` simultaneous in-flight deliveries.
	pub fn new(
		sender: Arc<dyn DeliverySender>,
		backoff: BackoffPolicy,
		max_concurrent: usize,
	) -> Self {
		let (shutdown_tx, _) = watch::channel(false);
		Self {
			inner: Arc::new(QueueInner {
				pending: Mutex::new(VecDeque::new()),
				notify: Notify::new(),
				pending_count: AtomicUsize::new(0),
				processing_count: AtomicUsize::new(0),
				completed_count: AtomicUsize::new(0),
				failed_count: AtomicUsize::new(0),
				semaphore: Arc::new(Semaphore::new(max_concurrent)),
				max_concurrent,
				sender,
				backoff,
			}),
			shutdown_tx,
			worker: tokio::sync::Mutex::new(None),
		}
	}

	/// Appends a delivery to the pending set and returns immediately.
	///
	/// Never waits for delivery completion; the caller may enqueue from a
	/// synchronous context (the event loop must not block the source).
	pub fn enqueue(&self, delivery: WebhookDelivery) -> Result<(), QueueError> {
		if delivery.is_terminal() {
			return Err(QueueError::invalid_delivery(format!(
				"delivery {} is already {:?}",
				delivery.id, delivery.status
			)));
		}

		let mut pending = self
			.inner
			.pending
			.lock()
			.map_err(|e| QueueError::internal_error(format!("pending lock poisoned: {}", e)))?;
		pending.push_back(delivery);
		drop(pending);

		self.inner.pending_count.fetch_add(1, Ordering::SeqCst);
		self.inner.notify.notify_one();
		Ok(())
	}

	/// Starts the background processing loop. Idempotent.
	pub async fn start_processing(&self) {
		let mut worker = self.worker.lock().await;
		if worker.is_some() {
			tracing::debug!("delivery queue already processing");
			return;
		}

		let _ = self.shutdown_tx.send(false);
		let inner = self.inner.clone();
		let shutdown_rx = self.shutdown_tx.subscribe();
		*worker = Some(tokio::spawn(run_loop(inner, shutdown_rx)));
		tracing::info!(
			max_concurrent = self.inner.max_concurrent,
			"delivery queue processing started"
		);
	}

	/// Stops the loop and waits for in-flight deliveries to finish.
	///
	/// Pending items (including retries waiting out their backoff) stay
	/// queued and survive a later `start_processing`.
	pub async fn stop_processing(&self) {
		let handle = self.worker.lock().await.take();
		let Some(handle) = handle else {
			tracing::debug!("delivery queue not processing");
			return;
		};

		let _ = self.shutdown_tx.send(true);
		self.inner.notify.notify_one();
		if let Err(e) = handle.await {
			tracing::error!("delivery queue loop panicked: {}", e);
		}

		// Drain: every in-flight send holds one permit
		if let Ok(all) = self
			.inner
			.semaphore
			.clone()
			.acquire_many_owned(self.inner.max_concurrent as u32)
			.await
		{
			drop(all);
		}
		tracing::info!("delivery queue processing stopped");
	}

	/// Current queue counters.
	pub fn stats(&self) -> QueueStats {
		QueueStats {
			pending_count: self.inner.pending_count.load(Ordering::SeqCst),
			processing_count: self.inner.processing_count.load(Ordering::SeqCst),
			completed_count: self.inner.completed_count.load(Ordering::SeqCst),
			failed_count: self.inner.failed_count.load(Ordering::SeqCst),
			max_concurrent_deliveries: self.inner.max_concurrent,
		}
	}
}

/// Background loop: admits pending deliveries up to the concurrency ceiling.
async fn run_loop(inner: Arc<QueueInner>, mut shutdown_rx: watch::Receiver<bool>) {
	loop {
		if *shutdown_rx.borrow() {
			break;
		}

		let next = inner
			.pending
			.lock()
			.ok()
			.and_then(|mut pending| pending.pop_front());

		match next {
			Some(delivery) => {
				inner.pending_count.fetch_sub(1, Ordering::SeqCst);

				let permit = tokio::select! {
					permit = inner.semaphore.clone().acquire_owned() => match permit {
						Ok(permit) => permit,
						Err(_) => break,
					},
					_ = shutdown_rx.changed() => {
						// put the delivery back, it is not lost
						if let Ok(mut pending) = inner.pending.lock() {
							pending.push_front(delivery);
							inner.pending_count.fetch_add(1, Ordering::SeqCst);
						}
						break;
					}
				};

				let task_inner = inner.clone();
				tokio::spawn(async move {
					process_delivery(task_inner, delivery).await;
					drop(permit);
				});
			}
			None => {
				tokio::select! {
					_ = inner.notify.notified() => {}
					_ = shutdown_rx.changed() => break,
				}
			}
		}
	}
}

/// Runs one attempt of one delivery and routes the outcome.
async fn process_delivery(inner: Arc<QueueInner>, mut delivery: WebhookDelivery) {
	delivery.status = DeliveryStatus::Processing;
	inner.processing_count.fetch_add(1, Ordering::SeqCst);

	let outcome = inner.sender.send(&delivery).await;
	inner.processing_count.fetch_sub(1, Ordering::SeqCst);

	match outcome {
		Ok(result) if result.success => {
			delivery.status = DeliveryStatus::Completed;
			inner.completed_count.fetch_add(1, Ordering::SeqCst);
			tracing::debug!(
				delivery = %delivery.id,
				webhook = %delivery.webhook_id,
				"delivery completed"
			);
		}
		Ok(result) => {
			if inner.backoff.should_retry(&delivery) {
				let delay = inner.backoff.backoff_delay(delivery.attempts);
				delivery.attempts += 1;
				delivery.status = DeliveryStatus::Pending;
				inner.pending_count.fetch_add(1, Ordering::SeqCst);

				tracing::info!(
					delivery = %delivery.id,
					attempt = delivery.attempts,
					delay_ms = delay.as_millis() as u64,
					error = result.error.as_deref().unwrap_or("unknown"),
					"delivery failed, scheduling retry"
				);

				// released from the concurrency slot while waiting out the backoff
				let retry_inner = inner.clone();
				tokio::spawn(async move {
					tokio::time::sleep(delay).await;
					if let Ok(mut pending) = retry_inner.pending.lock() {
						pending.push_back(delivery);
					}
					retry_inner.notify.notify_one();
				});
			} else {
				delivery.status = DeliveryStatus::Failed;
				inner.failed_count.fetch_add(1, Ordering::SeqCst);
				tracing::warn!(
					delivery = %delivery.id,
					webhook = %delivery.webhook_id,
					attempts = delivery.attempts + 1,
					error = result.error.as_deref().unwrap_or("unknown"),
					"delivery failed terminally, retry budget exhausted"
				);
			}
		}
		Err(e) => {
			// configuration errors cannot self-heal, no retry
			delivery.status = DeliveryStatus::Failed;
			inner.failed_count.fetch_add(1, Ordering::SeqCst);
			tracing::error!(
				delivery = %delivery.id,
				webhook = %delivery.webhook_id,
				"delivery rejected: {}",
				e
			);
		}
	}
}
