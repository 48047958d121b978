//! Filter engine properties.

use std::collections::HashMap;

use chain_webhook_relay::models::{FilterCondition, FilterOperator};
use chain_webhook_relay::services::filter::FilterService;
use proptest::prelude::*;
use serde_json::json;

use super::strategies::{invalid_event_strategy, subscription_for, valid_event_strategy};

proptest! {
	/// Structurally invalid events never match, whatever the filters say.
	#[test]
	fn prop_invalid_events_never_match(
		event in invalid_event_strategy(),
		use_filter in any::<bool>(),
	) {
		let service = FilterService::new();

		let filters = if use_filter {
			HashMap::from([(
				"value".to_string(),
				FilterCondition::Comparison {
					operator: FilterOperator::Gte,
					value: json!("0"),
				},
			)])
		} else {
			HashMap::new()
		};

		let subscription = subscription_for(&event, filters);
		prop_assert!(!service.matches_subscription(&subscription, &event));
	}

	/// An empty filter expression matches every structurally valid event.
	#[test]
	fn prop_empty_filters_match_all_valid_events(event in valid_event_strategy()) {
		let service = FilterService::new();
		let subscription = subscription_for(&event, HashMap::new());
		prop_assert!(service.matches_subscription(&subscription, &event));
	}

	/// Numeric comparisons agree with integer ordering, both as strings and
	/// as JSON numbers.
	#[test]
	fn prop_comparisons_agree_with_integer_ordering(
		event in valid_event_strategy(),
		actual in any::<u64>(),
		bound in any::<u64>(),
		as_string in any::<bool>(),
	) {
		let service = FilterService::new();

		let actual_value = if as_string {
			json!(actual.to_string())
		} else {
			json!(actual)
		};

		let cases = [
			(FilterOperator::Gt, actual > bound),
			(FilterOperator::Gte, actual >= bound),
			(FilterOperator::Lt, actual < bound),
			(FilterOperator::Lte, actual <= bound),
			(FilterOperator::Eq, actual == bound),
		];

		for (operator, expected) in cases {
			let mut event = event.clone();
			event.args.insert("value".to_string(), actual_value.clone());

			let filters = HashMap::from([(
				"value".to_string(),
				FilterCondition::Comparison {
					operator,
					value: json!(bound.to_string()),
				},
			)]);
			let subscription = subscription_for(&event, filters);

			prop_assert_eq!(
				service.matches_subscription(&subscription, &event),
				expected,
				"{:?} with actual {} bound {}",
				operator,
				actual,
				bound
			);
		}
	}

	/// Literal set membership behaves like `contains`.
	#[test]
	fn prop_one_of_is_set_membership(
		event in valid_event_strategy(),
		accepted in proptest::collection::vec(any::<u32>(), 1..5),
		candidate in any::<u32>(),
	) {
		let service = FilterService::new();

		let mut event = event.clone();
		event
			.args
			.insert("kind".to_string(), json!(candidate.to_string()));

		let filters = HashMap::from([(
			"kind".to_string(),
			FilterCondition::OneOf(accepted.iter().map(|v| json!(v.to_string())).collect()),
		)]);
		let subscription = subscription_for(&event, filters);

		prop_assert_eq!(
			service.matches_subscription(&subscription, &event),
			accepted.contains(&candidate)
		);
	}
}
