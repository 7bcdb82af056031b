//! API endpoint handlers module
//!
//! Contains all HTTP endpoint handler implementations.

pub mod debug;
pub mod execute;
pub mod health;
pub mod sessions;
pub mod templates;
pub mod ui;
