//! Subscription configuration loading and validation.
//!
//! Implements the ConfigLoader trait for subscription configurations,
//! allowing subscriptions to be loaded from JSON files.

use std::{fs, path::Path};

use crate::models::{config::error::ConfigError, ConfigLoader, EventSubscription};

impl ConfigLoader for EventSubscription {
	/// Load all subscription configurations from a directory
	///
	/// Reads and parses all JSON files in the specified directory (or the
	/// default config directory) as subscription configurations. Files that
	/// fail to parse or validate are skipped with an error log so one bad
	/// file cannot take down the rest.
	fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>,
	{
		let subscription_dir = path.unwrap_or(Path::new("config/subscriptions"));
		let mut pairs = Vec::new();

		if !subscription_dir.exists() {
			return Err(ConfigError::file_error("subscriptions directory not found"));
		}

		for entry in fs::read_dir(subscription_dir)? {
			let entry = entry?;
			let path = entry.path();

			if !Self::is_json_file(&path) {
				continue;
			}

			let name = path
				.file_stem()
				.and_then(|s| s.to_str())
				.unwrap_or("unknown")
				.to_string();

			match Self::load_from_path(&path) {
				Ok(subscription) => pairs.push((name, subscription)),
				Err(e) => {
					tracing::error!(
						"skipping subscription config {}: {}",
						path.display(),
						e
					);
				}
			}
		}

		Ok(T::from_iter(pairs))
	}

	/// Load a subscription configuration from a specific file
	fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		let file = std::fs::File::open(path)?;
		let config: EventSubscription = serde_json::from_reader(file)?;

		// Validate the config after loading
		ConfigLoader::validate(&config)?;

		Ok(config)
	}

	/// Validate the subscription configuration
	fn validate(&self) -> Result<(), ConfigError> {
		EventSubscription::validate(self).map_err(ConfigError::validation_error)
	}
}
