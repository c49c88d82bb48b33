//! Diagnostics and error handling for the prescription-to-protocol converter
//!
//! This crate provides the error handling infrastructure shared by the parser,
//! translator and protocol-document crates: error codes, diagnostics with
//! severities, and the top-level error type.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for converter operations
pub type Result<T> = std::result::Result<T, ClinProtError>;
