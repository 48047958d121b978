//! Subscription model: what to match and where to deliver.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::core::webhook::WebhookConfig;

/// A standing rule matching events from one contract/event signature to a
/// filter expression and a set of webhook destinations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSubscription {
	/// Unique subscription identifier
	pub id: String,
	/// Contract the subscription listens to
	pub contract_address: String,
	/// Event signature, e.g. `Transfer(address,address,uint256)`
	pub event_signature: String,
	/// Per-argument filter conditions; empty means match unconditionally
	#[serde(default)]
	pub filters: HashMap<String, FilterCondition>,
	/// Delivery destinations, each with its own format and retry budget
	pub webhooks: Vec<WebhookConfig>,
}

/// One filter condition keyed by a (possibly dotted) argument path.
///
/// Wire shapes, tried in order: an `{operator, value}` comparison object, an
/// array of accepted literals (set membership), or a bare literal (equality).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterCondition {
	/// Explicit comparison, e.g. `{"operator": "gt", "value": "1000"}`
	Comparison {
		operator: FilterOperator,
		value: Value,
	},
	/// Any-of literal set
	OneOf(Vec<Value>),
	/// Exact equality against a single literal
	Literal(Value),
}

/// Comparison operators for `FilterCondition::Comparison`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
	Gt,
	Lt,
	Gte,
	Lte,
	Eq,
}

impl EventSubscription {
	/// Validates the subscription's required structure.
	///
	/// # Returns
	/// * `Err(String)` naming the first invalid field, `Ok(())` otherwise
	pub fn validate(&self) -> Result<(), String> {
		if self.id.trim().is_empty() {
			return Err("subscription id is required".to_string());
		}
		if self.contract_address.trim().is_empty() {
			return Err("contract address is required".to_string());
		}
		if !self.event_signature.contains('(') || !self.event_signature.contains(')') {
			return Err(format!(
				"invalid event signature format: {}",
				self.event_signature
			));
		}
		if self.webhooks.is_empty() {
			return Err(format!(
				"subscription {} has no webhook destinations",
				self.id
			));
		}
		for webhook in &self.webhooks {
			webhook
				.validate()
				.map_err(|e| format!("webhook {}: {}", webhook.id, e))?;
		}
		Ok(())
	}

	/// Event name portion of the signature (`Transfer(address,...)` -> `Transfer`)
	pub fn event_name(&self) -> &str {
		self.event_signature
			.split('(')
			.next()
			.unwrap_or(&self.event_signature)
			.trim()
	}
}
