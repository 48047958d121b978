//! Delivery record storage backends.
//!
//! The tracker persists through the [`DeliveryStorage`] seam: an append-only
//! insert plus a per-webhook read. Ships with an in-memory store and a
//! JSON-lines file store.

use async_trait::async_trait;
use std::error::Error;
use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::models::DeliveryRecord;

/// Append-only persistence for delivery records.
#[async_trait]
pub trait DeliveryStorage: Send + Sync {
	/// Persists one record. Records are never overwritten.
	async fn insert(&self, record: DeliveryRecord) -> Result<(), Box<dyn Error + Send + Sync>>;

	/// All records for one webhook, in insertion order.
	async fn get_by_webhook(
		&self,
		webhook_id: &str,
	) -> Result<Vec<DeliveryRecord>, Box<dyn Error + Send + Sync>>;
}

/// Volatile store, primarily for tests and short-lived runs.
#[derive(Default)]
pub struct InMemoryDeliveryStorage {
	records: RwLock<Vec<DeliveryRecord>>,
}

impl InMemoryDeliveryStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl DeliveryStorage for InMemoryDeliveryStorage {
	async fn insert(&self, record: DeliveryRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
		self.records.write().await.push(record);
		Ok(())
	}

	async fn get_by_webhook(
		&self,
		webhook_id: &str,
	) -> Result<Vec<DeliveryRecord>, Box<dyn Error + Send + Sync>> {
		Ok(self
			.records
			.read()
			.await
			.iter()
			.filter(|r| r.webhook_id == webhook_id)
			.cloned()
			.collect())
	}
}

/// JSON-lines file store, one file per webhook id under the storage path.
pub struct FileDeliveryStorage {
	storage_path: PathBuf,
}

impl FileDeliveryStorage {
	pub fn new(storage_path: impl Into<PathBuf>) -> Self {
		Self {
			storage_path: storage_path.into(),
		}
	}

	fn file_for(&self, webhook_id: &str) -> PathBuf {
		// webhook ids come from validated configs, but never trust them as path segments
		let safe: String = webhook_id
			.chars()
			.map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
			.collect();
		self.storage_path.join(format!("{}_deliveries.jsonl", safe))
	}
}

#[async_trait]
impl DeliveryStorage for FileDeliveryStorage {
	async fn insert(&self, record: DeliveryRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
		tokio::fs::create_dir_all(&self.storage_path).await?;

		let mut line = serde_json::to_string(&record)?;
		line.push('\n');

		let mut file = tokio::fs::OpenOptions::new()
			.create(true)
			.append(true)
			.open(self.file_for(&record.webhook_id))
			.await?;
		file.write_all(line.as_bytes()).await?;
		Ok(())
	}

	async fn get_by_webhook(
		&self,
		webhook_id: &str,
	) -> Result<Vec<DeliveryRecord>, Box<dyn Error + Send + Sync>> {
		let path = self.file_for(webhook_id);
		if !path.exists() {
			return Ok(Vec::new());
		}

		let content = tokio::fs::read_to_string(path).await?;
		let mut records = Vec::new();
		for line in content.lines() {
			if line.trim().is_empty() {
				continue;
			}
			match serde_json::from_str::<DeliveryRecord>(line) {
				Ok(record) => records.push(record),
				Err(e) => tracing::warn!("skipping corrupt delivery record: {}", e),
			}
		}
		Ok(records)
	}
}
