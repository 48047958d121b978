//! camelCase payload shape for consumers with JavaScript-style conventions.

use serde_json::{json, Value};

use super::PayloadFormatter;
use crate::models::{BlockchainEvent, PayloadFormat};

/// Formats events as camelCase fields under an `eventData` envelope.
pub struct CamelCaseFormatter;

impl PayloadFormatter for CamelCaseFormatter {
	fn format_payload(&self, event: &BlockchainEvent) -> Value {
		json!({
			"eventData": {
				"eventName": event.event_name,
				"contractAddress": event.contract_address,
				"blockNumber": event.block_number,
				"transactionHash": event.transaction_hash,
				"logIndex": event.log_index,
				"arguments": Value::Object(event.args.clone()),
				"timestamp": event.timestamp.to_rfc3339(),
			},
		})
	}

	fn get_format(&self) -> PayloadFormat {
		PayloadFormat::CamelCase
	}
}
