//! Webhook sender error types.
//!
//! Errors here mean a delivery could not even be attempted: the webhook
//! configuration was missing or invalid. Transport failures are not errors
//! at this level; they are unsuccessful [`DeliveryResult`]s.
//!
//! [`DeliveryResult`]: crate::models::DeliveryResult

use log::error;
use std::{error::Error, fmt};

/// Represents possible errors during webhook send operations
#[derive(Debug)]
pub enum SenderError {
	/// No configuration is registered for the webhook id
	NotFound(String),
	/// The webhook configuration failed validation
	ValidationError(String),
	/// Internal errors (e.g. failed to build request headers)
	InternalError(String),
}

impl SenderError {
	/// Formats the error message based on the error type
	fn format_message(&self) -> String {
		match self {
			Self::NotFound(msg) => format!("Webhook not found: {}", msg),
			Self::ValidationError(msg) => format!("Validation error: {}", msg),
			Self::InternalError(msg) => format!("Internal error: {}", msg),
		}
	}

	/// Creates a new not found error with logging
	pub fn not_found(msg: impl Into<String>) -> Self {
		let error = Self::NotFound(msg.into());
		error!("{}", error.format_message());
		error
	}

	/// Creates a new validation error with logging
	pub fn validation_error(msg: impl Into<String>) -> Self {
		let error = Self::ValidationError(msg.into());
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

impl fmt::Display for SenderError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.format_message())
	}
}

impl Error for SenderError {}
