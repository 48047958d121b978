//! On-chain event to webhook relay.
//!
//! Relays decoded blockchain events to external consumers through HTTP
//! webhooks: events are matched against per-subscription filters, fanned out
//! to webhook endpoints, queued with bounded concurrency, retried with
//! exponential backoff, and isolated per endpoint by circuit breakers, while
//! every delivery attempt is tracked for observability.
//!
//! # Architecture
//! - Models: events, subscriptions, webhooks and delivery bookkeeping
//! - Repositories: subscription configuration loading
//! - Services: the pipeline (filter, formatter, breaker, queue, sender,
//!   tracker, source, processor)
//! - Bootstrap: service initialization and wiring

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
