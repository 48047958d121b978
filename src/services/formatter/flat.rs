//! Flat payload shape: a single object with `event_`-prefixed fields.

use serde_json::{json, Value};

use super::PayloadFormatter;
use crate::models::{BlockchainEvent, PayloadFormat};

/// Formats events as a flat snake_case object.
pub struct FlatFormatter;

impl PayloadFormatter for FlatFormatter {
	fn format_payload(&self, event: &BlockchainEvent) -> Value {
		json!({
			"event_name": event.event_name,
			"event_contract_address": event.contract_address,
			"event_block_number": event.block_number,
			"event_transaction_hash": event.transaction_hash,
			"event_log_index": event.log_index,
			"event_args": Value::Object(event.args.clone()),
			"event_timestamp": event.timestamp.to_rfc3339(),
		})
	}

	fn get_format(&self) -> PayloadFormat {
		PayloadFormat::Flat
	}
}
