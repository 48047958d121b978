//! Subscription configuration repository implementation.
//!
//! This module provides storage and retrieval of subscription configurations,
//! which define the events to match and the webhooks to deliver them to.
//! The repository loads subscription configurations from JSON files.

use std::{collections::HashMap, path::Path};

use crate::{
	models::{ConfigLoader, EventSubscription},
	repositories::error::RepositoryError,
};

/// Repository for storing and retrieving subscription configurations
#[derive(Clone)]
pub struct SubscriptionRepository {
	/// Map of subscription ids to their configurations
	pub subscriptions: HashMap<String, EventSubscription>,
}

impl SubscriptionRepository {
	/// Create a new subscription repository from the given path
	///
	/// Loads all subscription configurations from JSON files in the specified
	/// directory (or default config directory if None is provided).
	pub fn new(path: Option<&Path>) -> Result<Self, RepositoryError> {
		let subscriptions = <Self as SubscriptionRepositoryTrait>::load_all(path)?;
		Ok(SubscriptionRepository { subscriptions })
	}
}

/// Interface for subscription repository implementations
///
/// This trait defines the standard operations that any subscription repository
/// must support, allowing for different storage backends while maintaining a
/// consistent interface.
pub trait SubscriptionRepositoryTrait: Clone {
	/// Create a new subscription repository from the given path
	fn new(path: Option<&Path>) -> Result<Self, RepositoryError>
	where
		Self: Sized;

	/// Load all subscription configurations from the given path
	///
	/// If no path is provided, uses the default config directory.
	fn load_all(path: Option<&Path>) -> Result<HashMap<String, EventSubscription>, RepositoryError>;

	/// Get a specific subscription by id
	///
	/// Returns None if the subscription doesn't exist.
	fn get(&self, subscription_id: &str) -> Option<EventSubscription>;

	/// Get all subscriptions
	///
	/// Returns a copy of the subscription map to prevent external mutation.
	fn get_all(&self) -> HashMap<String, EventSubscription>;
}

impl SubscriptionRepositoryTrait for SubscriptionRepository {
	fn new(path: Option<&Path>) -> Result<Self, RepositoryError> {
		SubscriptionRepository::new(path)
	}

	fn load_all(path: Option<&Path>) -> Result<HashMap<String, EventSubscription>, RepositoryError> {
		let by_file: HashMap<String, EventSubscription> = EventSubscription::load_all(path)
			.map_err(|e| RepositoryError::load_error(format!("Failed to load subscriptions: {}", e)))?;

		// Re-key by subscription id; the file stem is only a loading detail
		Ok(by_file
			.into_values()
			.map(|sub| (sub.id.clone(), sub))
			.collect())
	}

	fn get(&self, subscription_id: &str) -> Option<EventSubscription> {
		self.subscriptions.get(subscription_id).cloned()
	}

	fn get_all(&self) -> HashMap<String, EventSubscription> {
		self.subscriptions.clone()
	}
}

/// Service layer for subscription repository operations
///
/// Provides a higher-level interface for working with subscription
/// configurations, handling repository initialization and access through a
/// trait-based interface.
#[derive(Clone)]
pub struct SubscriptionService<T: SubscriptionRepositoryTrait> {
	repository: T,
}

impl<T: SubscriptionRepositoryTrait> SubscriptionService<T> {
	/// Create a new subscription service with the default repository implementation
	pub fn new(
		path: Option<&Path>,
	) -> Result<SubscriptionService<SubscriptionRepository>, RepositoryError> {
		let repository = SubscriptionRepository::new(path)?;
		Ok(SubscriptionService { repository })
	}

	/// Create a new subscription service with a custom repository implementation
	pub fn new_with_repository(repository: T) -> Result<Self, RepositoryError> {
		Ok(SubscriptionService { repository })
	}

	/// Get a specific subscription by id
	pub fn get(&self, subscription_id: &str) -> Option<EventSubscription> {
		self.repository.get(subscription_id)
	}

	/// Get all subscriptions
	pub fn get_all(&self) -> HashMap<String, EventSubscription> {
		self.repository.get_all()
	}
}
