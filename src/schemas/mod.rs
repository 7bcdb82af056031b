//! Schema module
//!
//! Wire-format models for the outbound Gemini API.

pub mod gemini;
