//! Passthrough payload shape: the canonical event serialized as-is.

use serde_json::Value;

use super::PayloadFormatter;
use crate::models::{BlockchainEvent, PayloadFormat};

/// Serializes the canonical event without reshaping.
pub struct RawFormatter;

impl PayloadFormatter for RawFormatter {
	fn format_payload(&self, event: &BlockchainEvent) -> Value {
		serde_json::to_value(event).unwrap_or(Value::Null)
	}

	fn get_format(&self) -> PayloadFormat {
		PayloadFormat::Raw
	}
}
