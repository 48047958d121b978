//! Payload formatting for webhook deliveries.
//!
//! Each supported wire shape implements [`PayloadFormatter`]; the sender
//! selects one by looking up the configured [`PayloadFormat`]. The format set
//! is closed, so dispatch is a match rather than an open registry.

use serde_json::Value;

use crate::models::{BlockchainEvent, PayloadFormat};

mod camel;
mod flat;
mod nested;
mod raw;

pub use camel::CamelCaseFormatter;
pub use flat::FlatFormatter;
pub use nested::NestedFormatter;
pub use raw::RawFormatter;

/// Strategy interface for mapping a canonical event to a wire payload.
///
/// Implementations must be total over arbitrarily nested argument values and
/// must not mutate the source event.
pub trait PayloadFormatter: Send + Sync {
	/// Builds the wire payload for `event`.
	fn format_payload(&self, event: &BlockchainEvent) -> Value;

	/// Whether this formatter is usable; checked before any network attempt.
	fn validate_format(&self) -> bool {
		true
	}

	/// The format this strategy implements.
	fn get_format(&self) -> PayloadFormat;
}

/// Selects the formatter for a configured format.
pub fn formatter_for(format: PayloadFormat) -> Box<dyn PayloadFormatter> {
	match format {
		PayloadFormat::Flat => Box::new(FlatFormatter),
		PayloadFormat::Nested => Box::new(NestedFormatter),
		PayloadFormat::CamelCase => Box::new(CamelCaseFormatter),
		PayloadFormat::Raw => Box::new(RawFormatter),
	}
}
