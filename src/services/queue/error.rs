//! Delivery queue error types.

use log::error;
use std::{error::Error, fmt};

/// Represents possible errors during queue operations
#[derive(Debug)]
pub enum QueueError {
	/// A delivery in a terminal state was offered to the queue
	InvalidDelivery(String),
	/// Internal queue state errors
	InternalError(String),
}

impl QueueError {
	fn format_message(&self) -> String {
		match self {
			Self::InvalidDelivery(msg) => format!("Invalid delivery: {}", msg),
			Self::InternalError(msg) => format!("Internal error: {}", msg),
		}
	}

	/// Creates a new invalid delivery error with logging
	pub fn invalid_delivery(msg: impl Into<String>) -> Self {
		let error = Self::InvalidDelivery(msg.into());
		error!("{}", error.format_message());
		error
	}

	/// Creates a new internal error with logging
	pub fn internal_error(msg: impl Into<String>) -> Self {
		let error = Self::InternalError(msg.into());
		error!("{}", error.format_message());
		error
	}
}

impl fmt::Display for QueueError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl Error for QueueError {}
