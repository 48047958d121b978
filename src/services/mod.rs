//! Core services implementing the relay pipeline.
//!
//! Contains the service layer of the application:
//!
//! - `breaker`: Per-endpoint circuit breaking
//! - `filter`: Event validation and subscription matching
//! - `formatter`: Wire payload shaping
//! - `processor`: Top-level event orchestration
//! - `queue`: Bounded-concurrency delivery queue and retry scheduling
//! - `sender`: Webhook send orchestration and HTTP transport
//! - `source`: Event source contract and channel implementation
//! - `tracker`: Delivery outcome recording and statistics

pub mod breaker;
pub mod filter;
pub mod formatter;
pub mod processor;
pub mod queue;
pub mod sender;
pub mod source;
pub mod tracker;
