use std::path::Path;

mod error;
mod relay_config;
mod subscription_config;

pub use error::ConfigError;
pub use relay_config::{
	BreakerSettings, QueueSettings, RelayConfig, RetrySettings, StorageBackend,
};

/// Common interface for loading configuration files
pub trait ConfigLoader: Sized {
	/// Load all configurations of this kind from a directory, keyed by file stem
	fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>;

	/// Load one configuration from a specific file
	fn load_from_path(path: &Path) -> Result<Self, ConfigError>;

	/// Validate the loaded configuration
	fn validate(&self) -> Result<(), ConfigError>;

	fn is_json_file(path: &Path) -> bool {
		path.extension()
			.map(|ext| ext.to_string_lossy().to_lowercase() == "json")
			.unwrap_or(false)
	}
}
