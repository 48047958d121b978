//! Core domain models for the event relay.
//!
//! This module contains the fundamental data structures of the pipeline:
//! - Events: the canonical decoded on-chain event
//! - Subscriptions: matching rules and their webhook destinations
//! - Webhooks: destination configuration and payload formats
//! - Deliveries: per-attempt bookkeeping, results and persisted records

pub mod delivery;
pub mod event;
pub mod subscription;
pub mod webhook;

pub use delivery::{
	DeliveryRecord, DeliveryResult, DeliveryStats, DeliveryStatus, WebhookDelivery,
};
pub use event::{are_same_address, normalize_address, BlockchainEvent};
pub use subscription::{EventSubscription, FilterCondition, FilterOperator};
pub use webhook::{PayloadFormat, WebhookConfig, MAX_RETRY_ATTEMPTS, MAX_TIMEOUT_MS};
