//! Nested payload shape: delivery metadata and event data in separate envelopes.

use serde_json::{json, Value};

use super::PayloadFormatter;
use crate::models::{BlockchainEvent, PayloadFormat};

/// Formats events as a `metadata` + `data` envelope.
pub struct NestedFormatter;

impl PayloadFormatter for NestedFormatter {
	fn format_payload(&self, event: &BlockchainEvent) -> Value {
		json!({
			"metadata": {
				"contract_address": event.contract_address,
				"block_number": event.block_number,
				"transaction_hash": event.transaction_hash,
				"log_index": event.log_index,
				"timestamp": event.timestamp.to_rfc3339(),
			},
			"data": {
				"event": event.event_name,
				"args": Value::Object(event.args.clone()),
			},
		})
	}

	fn get_format(&self) -> PayloadFormat {
		PayloadFormat::Nested
	}
}
