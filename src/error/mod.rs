//! API error module
//!
//! Defines the error surface returned by HTTP handlers.

pub mod types;

pub use types::ApiError;
