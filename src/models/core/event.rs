//! Canonical on-chain event model.
//!
//! Events arrive from the event source already decoded: a contract address,
//! an event name, block coordinates and a map of named arguments. The relay
//! never re-reads the chain; everything downstream works from this shape.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

lazy_static! {
	/// 20-byte hex address with 0x prefix
	static ref CONTRACT_ADDRESS_RE: Regex =
		Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid address regex");
	/// 32-byte hex transaction hash with 0x prefix
	static ref TRANSACTION_HASH_RE: Regex =
		Regex::new(r"^0x[0-9a-fA-F]{64}$").expect("valid hash regex");
}

/// A decoded blockchain event as emitted by the event source.
///
/// Immutable once received. `args` holds the event's named arguments and may
/// be arbitrarily nested (structs decode to objects, arrays to arrays).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockchainEvent {
	/// Emitting contract address (`0x` + 40 hex chars)
	pub contract_address: String,
	/// Decoded event name, e.g. `Transfer`
	pub event_name: String,
	/// Block the event was included in
	pub block_number: u64,
	/// Hash of the including transaction (`0x` + 64 hex chars)
	pub transaction_hash: String,
	/// Position of the log within the transaction
	pub log_index: u64,
	/// Named event arguments, possibly nested
	#[serde(default)]
	pub args: Map<String, Value>,
	/// Time the event was observed
	pub timestamp: DateTime<Utc>,
}

impl BlockchainEvent {
	/// Checks the event's structural invariants.
	///
	/// # Returns
	/// * `Ok(())` if the event is well-formed
	/// * `Err(String)` describing the first violated invariant
	pub fn validate(&self) -> Result<(), String> {
		if !CONTRACT_ADDRESS_RE.is_match(&self.contract_address) {
			return Err(format!(
				"invalid contract address: {}",
				self.contract_address
			));
		}
		if self.event_name.trim().is_empty() {
			return Err("event name is required".to_string());
		}
		if !TRANSACTION_HASH_RE.is_match(&self.transaction_hash) {
			return Err(format!(
				"invalid transaction hash: {}",
				self.transaction_hash
			));
		}
		Ok(())
	}

	/// Normalized (lowercase, 0x-stripped) contract address for comparisons
	pub fn normalized_address(&self) -> String {
		normalize_address(&self.contract_address)
	}
}

/// Normalizes an address string by removing the "0x" prefix and lowercasing.
pub fn normalize_address(address: &str) -> String {
	address
		.strip_prefix("0x")
		.unwrap_or(address)
		.trim()
		.to_lowercase()
}

/// Compares two addresses for equality, ignoring case and "0x" prefixes.
pub fn are_same_address(address1: &str, address2: &str) -> bool {
	normalize_address(address1) == normalize_address(address2)
}
