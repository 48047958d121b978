//! Filter engine and event matcher.
//!
//! Evaluates a subscription's filter expression against a decoded event.
//! Malformed events, unknown argument paths and malformed conditions are
//! logged and treated as non-matches; evaluation never aborts processing of
//! other subscriptions.

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::models::{
	are_same_address, BlockchainEvent, EventSubscription, FilterCondition, FilterOperator,
};

/// Service evaluating subscriptions against incoming events.
pub struct FilterService;

impl FilterService {
	pub fn new() -> Self {
		FilterService
	}

	/// Decides whether an event matches a subscription.
	///
	/// Validates the event's structural invariants first; an invalid event
	/// never matches regardless of filter content. An empty filter expression
	/// matches every structurally valid event for the subscribed
	/// contract/event pair.
	///
	/// # Arguments
	/// * `subscription` - The subscription whose filters to evaluate
	/// * `event` - The decoded event
	///
	/// # Returns
	/// `true` if the event matches, `false` otherwise
	pub fn matches_subscription(
		&self,
		subscription: &EventSubscription,
		event: &BlockchainEvent,
	) -> bool {
		if let Err(e) = event.validate() {
			tracing::warn!(
				subscription = %subscription.id,
				"dropping malformed event: {}",
				e
			);
			return false;
		}

		if !are_same_address(&subscription.contract_address, &event.contract_address) {
			return false;
		}

		if subscription.event_name() != event.event_name {
			return false;
		}

		subscription
			.filters
			.iter()
			.all(|(path, condition)| self.evaluate_condition(path, condition, &event.args))
	}

	/// Evaluates one filter condition against the argument at `path`.
	fn evaluate_condition(
		&self,
		path: &str,
		condition: &FilterCondition,
		args: &Map<String, Value>,
	) -> bool {
		let Some(actual) = lookup_path(args, path) else {
			tracing::warn!("filter path '{}' not found in event args", path);
			return false;
		};

		match condition {
			FilterCondition::Literal(expected) => literal_matches(actual, expected),
			FilterCondition::OneOf(accepted) => {
				accepted.iter().any(|expected| literal_matches(actual, expected))
			}
			FilterCondition::Comparison { operator, value } => {
				compare(actual, *operator, value)
			}
		}
	}
}

impl Default for FilterService {
	fn default() -> Self {
		Self::new()
	}
}

/// Resolves a dotted path against a nested argument map.
///
/// Path segments traverse object keys; a segment that parses as an index
/// traverses arrays.
fn lookup_path<'a>(args: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
	let mut segments = path.split('.');
	let first = segments.next()?;
	let mut current = args.get(first)?;

	for segment in segments {
		current = match current {
			Value::Object(map) => map.get(segment)?,
			Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
			_ => return None,
		};
	}
	Some(current)
}

/// Exact-equality check with best-effort numeric and hex-string coercion.
fn literal_matches(actual: &Value, expected: &Value) -> bool {
	if actual == expected {
		return true;
	}

	// "1000" (string) vs 1000 (number) and other numeric spellings
	if let (Some(a), Some(b)) = (coerce_decimal(actual), coerce_decimal(expected)) {
		return a == b;
	}

	// addresses and hashes compare case-insensitively
	if let (Value::String(a), Value::String(b)) = (actual, expected) {
		if a.starts_with("0x") || b.starts_with("0x") {
			return are_same_address(a, b);
		}
	}

	false
}

/// Applies an explicit comparison operator.
///
/// Operands go through exact decimal coercion; `eq` falls back to literal
/// equality when either side is non-numeric, the ordering operators do not.
fn compare(actual: &Value, operator: FilterOperator, expected: &Value) -> bool {
	match (coerce_decimal(actual), coerce_decimal(expected)) {
		(Some(a), Some(b)) => match operator {
			FilterOperator::Gt => a > b,
			FilterOperator::Lt => a < b,
			FilterOperator::Gte => a >= b,
			FilterOperator::Lte => a <= b,
			FilterOperator::Eq => a == b,
		},
		_ => match operator {
			FilterOperator::Eq => literal_matches(actual, expected),
			_ => {
				tracing::warn!(
					"non-numeric operand for {:?} comparison: {} vs {}",
					operator,
					actual,
					expected
				);
				false
			}
		},
	}
}

/// Best-effort numeric coercion to an exact decimal.
fn coerce_decimal(value: &Value) -> Option<Decimal> {
	match value {
		Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
		Value::String(s) => Decimal::from_str(s.trim()).ok(),
		_ => None,
	}
}
