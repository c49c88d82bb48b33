//! Converter error codes following a structured numbering system
//!
//! Error code ranges:
//! - ACP0001-ACP0099: Prescription parse errors (free-text grammars)
//! - ACP0100-ACP0199: Translation errors (fraction arithmetic, constraints)
//! - ACP0200-ACP0299: Protocol document errors (template, structure rules)
//! - ACP0400-ACP0499: System errors (I/O, CSV input)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a prescription parse error (0001-0099)
    pub const fn is_parse_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a translation error (0100-0199)
    pub const fn is_translation_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a protocol document error (0200-0299)
    pub const fn is_document_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ACP{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// Static error info storage
static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

use std::collections::HashMap;
use std::sync::LazyLock;

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Prescription parse errors (0001-0099)
    map.insert(1, ErrorInfo::new("Malformed dose phrase")
        .with_help("A dose phrase must contain a numeric value followed by 'Gy'"));
    map.insert(2, ErrorInfo::new("Malformed prescription field"));
    map.insert(3, ErrorInfo::new("Unrecognized dosimetric parameter")
        .with_help("Supported shapes: Vxx%, Vxxcc, Dxxcc, Dxx%, Dxx Gy, Dxxcc Gy, Dxx% Gy"));
    map.insert(4, ErrorInfo::new("Prescription index out of range"));

    // Translation errors (0100-0199)
    map.insert(100, ErrorInfo::new("Invalid fraction count")
        .with_help("The total dose divided by the fraction dose must truncate to a positive integer"));
    map.insert(101, ErrorInfo::new("Incomplete target volume"));
    map.insert(102, ErrorInfo::new("Ambiguous coverage constraint")
        .with_help("More than one At Least / No More Than clause matched the same volume"));

    // Protocol document errors (0200-0299)
    map.insert(200, ErrorInfo::new("Structure name too long")
        .with_help("Structure names are limited to 16 characters"));
    map.insert(201, ErrorInfo::new("Protocol section not found"));
    map.insert(202, ErrorInfo::new("Document already serialized"));
    map.insert(203, ErrorInfo::new("Malformed protocol XML"));
    map.insert(204, ErrorInfo::new("Structure not found"));

    // System errors (0400-0499)
    map.insert(400, ErrorInfo::new("Internal error"));
    map.insert(401, ErrorInfo::new("I/O error"));
    map.insert(402, ErrorInfo::new("CSV input error"));

    map
});

// Convenient error code constants

// Prescription parse errors
pub const ACP0001: ErrorCode = ErrorCode::new(1);
pub const ACP0002: ErrorCode = ErrorCode::new(2);
pub const ACP0003: ErrorCode = ErrorCode::new(3);
pub const ACP0004: ErrorCode = ErrorCode::new(4);

// Translation errors
pub const ACP0100: ErrorCode = ErrorCode::new(100);
pub const ACP0101: ErrorCode = ErrorCode::new(101);
pub const ACP0102: ErrorCode = ErrorCode::new(102);

// Protocol document errors
pub const ACP0200: ErrorCode = ErrorCode::new(200);
pub const ACP0201: ErrorCode = ErrorCode::new(201);
pub const ACP0202: ErrorCode = ErrorCode::new(202);
pub const ACP0203: ErrorCode = ErrorCode::new(203);
pub const ACP0204: ErrorCode = ErrorCode::new(204);

// System errors
pub const ACP0400: ErrorCode = ErrorCode::new(400);
pub const ACP0401: ErrorCode = ErrorCode::new(401);
pub const ACP0402: ErrorCode = ErrorCode::new(402);
