//! Bootstrap module for initializing services and wiring the pipeline.
//!
//! Builds the full delivery pipeline from a [`RelayConfig`]: storage,
//! tracker, circuit breakers, sender, queue, event source and processor.
//! Individual collaborators can be injected (tests swap the transport and
//! storage seams); anything not provided is built from the configuration.

use std::{error::Error, path::Path, sync::Arc};

use crate::{
	models::{ConfigError, RelayConfig, StorageBackend},
	repositories::{SubscriptionRepository, SubscriptionRepositoryTrait},
	services::{
		breaker::CircuitBreakerRegistry,
		filter::FilterService,
		processor::EventProcessor,
		queue::{BackoffPolicy, DeliveryQueue, DeliverySender},
		sender::{HttpClientTransport, HttpTransport, WebhookSender},
		source::{ChannelEventSource, EventSourceHandle},
		tracker::{DeliveryStorage, DeliveryTracker, FileDeliveryStorage, InMemoryDeliveryStorage},
	},
	utils::build_http_client,
};

/// Type alias for handling service results
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// The wired pipeline and its externally-useful handles.
pub struct RelayServices {
	pub processor: Arc<EventProcessor>,
	pub source: Arc<ChannelEventSource>,
	pub source_handle: EventSourceHandle,
	pub tracker: Arc<DeliveryTracker>,
	pub breakers: Arc<CircuitBreakerRegistry>,
}

/// Initializes all required services for the relay.
///
/// # Arguments
/// * `config` - Relay configuration (queue, retry, breaker, storage)
/// * `transport` - Optional HTTP transport override
/// * `storage` - Optional delivery record storage override
///
/// # Errors
/// Returns an error if the HTTP client cannot be built
pub fn initialize_services(
	config: &RelayConfig,
	transport: Option<Arc<dyn HttpTransport>>,
	storage: Option<Arc<dyn DeliveryStorage>>,
) -> Result<RelayServices> {
	let storage: Arc<dyn DeliveryStorage> = match storage {
		Some(storage) => storage,
		None => match config.storage {
			StorageBackend::Memory => Arc::new(InMemoryDeliveryStorage::new()),
			StorageBackend::File => Arc::new(FileDeliveryStorage::new(config.data_dir.clone())),
		},
	};

	let transport: Arc<dyn HttpTransport> = match transport {
		Some(transport) => transport,
		None => Arc::new(HttpClientTransport::new(build_http_client()?)),
	};

	let tracker = Arc::new(DeliveryTracker::new(storage));
	let breakers = Arc::new(CircuitBreakerRegistry::new(
		(&config.circuit_breaker).into(),
	));
	let sender = Arc::new(WebhookSender::new(
		transport,
		breakers.clone(),
		tracker.clone(),
	));
	let queue = Arc::new(DeliveryQueue::new(
		sender.clone() as Arc<dyn DeliverySender>,
		BackoffPolicy::from(&config.retry),
		config.queue.max_concurrent_deliveries,
	));

	let source = Arc::new(ChannelEventSource::default());
	let source_handle = source.handle();
	let processor = Arc::new(EventProcessor::new(
		source.clone(),
		Arc::new(FilterService::new()),
		queue,
		sender,
	));

	Ok(RelayServices {
		processor,
		source,
		source_handle,
		tracker,
		breakers,
	})
}

/// Loads subscriptions from a config directory into the processor.
///
/// Invalid subscriptions are skipped with an error log; one bad file cannot
/// prevent the rest from loading.
///
/// # Returns
/// The number of subscriptions added
pub async fn load_subscriptions(
	processor: &EventProcessor,
	path: Option<&Path>,
) -> Result<usize> {
	let subscriptions = SubscriptionRepository::load_all(path)
		.map_err(|e| Box::new(ConfigError::file_error(e.to_string())) as Box<dyn Error>)?;

	let mut added = 0;
	for (id, subscription) in subscriptions {
		match processor.add_subscription(subscription).await {
			Ok(()) => added += 1,
			Err(e) => tracing::error!("skipping subscription {}: {}", id, e),
		}
	}
	Ok(added)
}
