//! Event source contract.
//!
//! The blockchain side of the relay is an external collaborator: anything
//! able to produce decoded [`BlockchainEvent`]s can feed the pipeline. The
//! provided [`ChannelEventSource`] bridges external producers into the
//! processor through a broadcast channel, so emission never blocks on
//! processing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

use crate::models::{BlockchainEvent, EventSubscription};

#[derive(Debug, Error)]
pub enum SourceError {
	#[error("event source is not listening")]
	NotListening,
}

/// Messages emitted by an event source.
#[derive(Debug, Clone)]
pub enum SourceMessage {
	/// A decoded event for one subscription
	Event {
		subscription_id: String,
		event: BlockchainEvent,
	},
	/// The source started listening
	Started,
	/// The source stopped listening
	Stopped,
	/// The source hit an error; it may keep listening
	Error(String),
}

/// Contract every event source implementation satisfies.
#[async_trait]
pub trait EventSource: Send + Sync {
	async fn start(&self) -> Result<(), SourceError>;
	async fn stop(&self) -> Result<(), SourceError>;
	async fn add_subscription(&self, subscription: &EventSubscription) -> Result<(), SourceError>;
	async fn remove_subscription(&self, subscription_id: &str) -> Result<(), SourceError>;
	fn is_listening(&self) -> bool;
	/// New receiver for this source's message stream.
	fn subscribe(&self) -> broadcast::Receiver<SourceMessage>;
}

struct SourceShared {
	tx: broadcast::Sender<SourceMessage>,
	listening: AtomicBool,
	subscriptions: RwLock<HashSet<String>>,
}

/// Channel-backed event source.
///
/// External producers obtain an [`EventSourceHandle`] and push decoded
/// events through it; the source fans them out to every subscriber.
pub struct ChannelEventSource {
	shared: Arc<SourceShared>,
}

impl ChannelEventSource {
	/// Creates a source whose channel buffers up to `capacity` messages
	/// per lagging receiver.
	pub fn new(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity);
		Self {
			shared: Arc::new(SourceShared {
				tx,
				listening: AtomicBool::new(false),
				subscriptions: RwLock::new(HashSet::new()),
			}),
		}
	}

	/// Producer-side handle for pushing events into the source.
	pub fn handle(&self) -> EventSourceHandle {
		EventSourceHandle {
			shared: self.shared.clone(),
		}
	}
}

impl Default for ChannelEventSource {
	fn default() -> Self {
		Self::new(1024)
	}
}

#[async_trait]
impl EventSource for ChannelEventSource {
	async fn start(&self) -> Result<(), SourceError> {
		self.shared.listening.store(true, Ordering::SeqCst);
		let _ = self.shared.tx.send(SourceMessage::Started);
		tracing::info!("event source started");
		Ok(())
	}

	async fn stop(&self) -> Result<(), SourceError> {
		self.shared.listening.store(false, Ordering::SeqCst);
		let _ = self.shared.tx.send(SourceMessage::Stopped);
		tracing::info!("event source stopped");
		Ok(())
	}

	async fn add_subscription(&self, subscription: &EventSubscription) -> Result<(), SourceError> {
		self.shared
			.subscriptions
			.write()
			.await
			.insert(subscription.id.clone());
		Ok(())
	}

	async fn remove_subscription(&self, subscription_id: &str) -> Result<(), SourceError> {
		if !self.shared.subscriptions.write().await.remove(subscription_id) {
			tracing::warn!(
				subscription = subscription_id,
				"removing unknown subscription from event source"
			);
		}
		Ok(())
	}

	fn is_listening(&self) -> bool {
		self.shared.listening.load(Ordering::SeqCst)
	}

	fn subscribe(&self) -> broadcast::Receiver<SourceMessage> {
		self.shared.tx.subscribe()
	}
}

/// Producer handle into a [`ChannelEventSource`].
#[derive(Clone)]
pub struct EventSourceHandle {
	shared: Arc<SourceShared>,
}

impl EventSourceHandle {
	/// Emits one decoded event for a subscription.
	///
	/// # Returns
	/// * `Err(SourceError::NotListening)` while the source is stopped
	pub fn emit(
		&self,
		subscription_id: &str,
		event: BlockchainEvent,
	) -> Result<(), SourceError> {
		if !self.shared.listening.load(Ordering::SeqCst) {
			return Err(SourceError::NotListening);
		}
		let _ = self.shared.tx.send(SourceMessage::Event {
			subscription_id: subscription_id.to_string(),
			event,
		});
		Ok(())
	}

	/// Forwards a source-level error to subscribers.
	pub fn emit_error(&self, message: impl Into<String>) {
		let _ = self.shared.tx.send(SourceMessage::Error(message.into()));
	}
}
