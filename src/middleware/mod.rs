//! Middleware module
//!
//! Contains HTTP middleware for request logging and rate limiting.

pub mod logging;
pub mod rate_limit;

// Re-export commonly used items
pub use logging::{log_request, TraceId, TRACE_ID_HEADER, REQUEST_ID_HEADER};
pub use rate_limit::{rate_limit, RateLimitError, RateLimitState};
