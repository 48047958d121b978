//! Utility modules for common functionality.
//!
//! - `http`: Shared HTTP client construction
//! - `logging`: Logging setup and configuration

pub mod http;
pub mod logging;

pub use http::build_http_client;
pub use logging::setup_logging;
