//! Event processor error types.

use log::error;
use std::{error::Error, fmt};

/// Represents possible errors during event processor operations
#[derive(Debug)]
pub enum ProcessorError {
	/// A subscription failed validation
	ValidationError(String),
	/// The underlying event source reported a failure
	SourceError(String),
	/// Internal processor state errors
	InternalError(String),
}

impl ProcessorError {
	/// Formats the error message based on the error type
	fn format_message(&self) -> String {
		match self {
			Self::ValidationError(msg) => format!("Validation error: {}", msg),
			Self::SourceError(msg) => format!("Event source error: {}", msg),
			Self::InternalError(msg) => format!("Internal error: {}", msg),
		}
	}

	/// Creates a new validation error with logging
	pub fn validation_error(msg: impl Into<String>) -> Self {
		let error = Self::ValidationError(msg.into());
		error!("{}", error.format_message());
		error
	}

	/// Creates a new source error with logging
	pub fn source_error(msg: impl Into<String>) -> Self {
		let error = Self::SourceError(msg.into());
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

impl fmt::Display for ProcessorError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl Error for ProcessorError {}
