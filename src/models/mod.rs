//! Domain models and data structures for the webhook relay.
//!
//! This module contains all the core data structures used throughout the
//! application:
//!
//! - `config`: Configuration loading and validation
//! - `core`: Core domain models (events, subscriptions, webhooks, deliveries)

mod config;
mod core;

// Re-export core types
pub use core::{
	are_same_address, normalize_address, BlockchainEvent, DeliveryRecord, DeliveryResult,
	DeliveryStats, DeliveryStatus, EventSubscription, FilterCondition, FilterOperator,
	PayloadFormat, WebhookConfig, WebhookDelivery, MAX_RETRY_ATTEMPTS, MAX_TIMEOUT_MS,
};

// Re-export config types
pub use config::{
	BreakerSettings, ConfigError, ConfigLoader, QueueSettings, RelayConfig, RetrySettings,
	StorageBackend,
};
