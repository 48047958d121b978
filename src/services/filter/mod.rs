//! Event filtering functionality.
//!
//! Implements the core matching logic of the relay: structural validation of
//! incoming events and evaluation of per-subscription filter expressions
//! against event arguments.

mod matcher;

pub use matcher::FilterService;
