//! Proptest strategies for relay models.

use std::collections::HashMap;

use chain_webhook_relay::models::{
	BlockchainEvent, EventSubscription, FilterCondition, WebhookConfig,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Lowercase hex string of exactly `len` characters.
fn hex_string(len: usize) -> impl Strategy<Value = String> {
	proptest::collection::vec(proptest::sample::select("0123456789abcdef".as_bytes().to_vec()), len)
		.prop_map(|bytes| bytes.into_iter().map(|b| b as char).collect())
}

/// A well-formed contract address.
pub fn address_strategy() -> impl Strategy<Value = String> {
	hex_string(40).prop_map(|hex| format!("0x{}", hex))
}

/// A well-formed transaction hash.
pub fn tx_hash_strategy() -> impl Strategy<Value = String> {
	hex_string(64).prop_map(|hex| format!("0x{}", hex))
}

/// Flat argument maps with string/number/bool values.
pub fn args_strategy() -> impl Strategy<Value = Map<String, Value>> {
	proptest::collection::hash_map(
		"[a-z][a-z0-9_]{0,8}",
		prop_oneof![
			any::<u64>().prop_map(|n| Value::String(n.to_string())),
			any::<u64>().prop_map(|n| Value::Number(n.into())),
			any::<bool>().prop_map(Value::Bool),
		],
		0..5,
	)
	.prop_map(|map| map.into_iter().collect())
}

/// Structurally valid events.
pub fn valid_event_strategy() -> impl Strategy<Value = BlockchainEvent> {
	(
		address_strategy(),
		"[A-Z][a-zA-Z]{0,15}",
		any::<u32>(),
		tx_hash_strategy(),
		0u64..1_000,
		args_strategy(),
	)
		.prop_map(
			|(contract_address, event_name, block_number, transaction_hash, log_index, args)| {
				BlockchainEvent {
					contract_address,
					event_name,
					block_number: block_number as u64,
					transaction_hash,
					log_index,
					args,
					timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
				}
			},
		)
}

/// Events violating one structural invariant each.
pub fn invalid_event_strategy() -> impl Strategy<Value = BlockchainEvent> {
	(valid_event_strategy(), 0usize..3, "[g-z]{1,8}").prop_map(|(mut event, which, junk)| {
		match which {
			0 => event.contract_address = format!("0x{}", junk),
			1 => event.transaction_hash = junk,
			_ => event.event_name = "".to_string(),
		}
		event
	})
}

/// A subscription for the event's contract and name with the given filters.
pub fn subscription_for(
	event: &BlockchainEvent,
	filters: HashMap<String, FilterCondition>,
) -> EventSubscription {
	EventSubscription {
		id: "sub-prop".to_string(),
		contract_address: event.contract_address.clone(),
		event_signature: format!("{}(address,address,uint256)", event.event_name),
		filters,
		webhooks: vec![WebhookConfig {
			id: "wh-prop".to_string(),
			url: "https://hooks.example.com/x".to_string(),
			format: "flat".to_string(),
			headers: HashMap::new(),
			timeout_ms: 30_000,
			retry_attempts: 0,
			secret: None,
		}],
	}
}
