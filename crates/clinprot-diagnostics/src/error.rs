//! Converter error types

use crate::ErrorCode;
use crate::error_code::{
    ACP0001, ACP0100, ACP0101, ACP0102, ACP0200, ACP0201, ACP0202, ACP0203, ACP0204, ACP0401,
    ACP0402,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - the conversion cannot proceed
    Error,
    /// Warning - potential issue but conversion can continue
    Warning,
    /// Information - informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message with context
///
/// Non-fatal findings (for example dosimetric-parameter strings that match
/// none of the known shapes) are surfaced as warning diagnostics so a record
/// can still be converted while leaving a review trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// The raw prescription text the diagnostic refers to
    pub source_text: Option<String>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            source_text: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            source_text: None,
            help: None,
        }
    }

    /// Attach the raw text the diagnostic refers to
    pub fn with_source_text(mut self, text: impl Into<String>) -> Self {
        self.source_text = Some(text.into());
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

#[cfg(feature = "colored")]
impl Diagnostic {
    /// Render with a colored severity prefix for terminal output
    pub fn render_colored(&self) -> String {
        use colored::Colorize;
        let severity = match self.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".green().bold(),
        };
        let mut rendered = format!("{severity}: {} - {}", self.code, self.message);
        if let Some(text) = &self.source_text {
            rendered.push_str(&format!(" in {text:?}"));
        }
        if let Some(help) = &self.help {
            rendered.push_str(&format!("\n  help: {help}"));
        }
        rendered
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(text) = &self.source_text {
            write!(f, " in {:?}", text)?;
        }
        Ok(())
    }
}

/// Main converter error type
#[derive(Debug, Error)]
pub enum ClinProtError {
    /// A required field could not be extracted from the free text
    #[error("{code}: cannot extract {field} from {text:?}")]
    MalformedInput {
        code: ErrorCode,
        field: String,
        text: String,
    },

    /// The fraction count derived from the first target volume is not usable
    #[error("ACP0100: invalid fraction count: total {total_dose_gy} Gy / fraction {fraction_dose_gy} Gy")]
    InvalidFractionCount {
        total_dose_gy: f64,
        fraction_dose_gy: f64,
    },

    /// A target volume driving dose arithmetic lacks a dose field
    #[error("ACP0101: incomplete target volume prescription for {}", volume.as_deref().unwrap_or("<unnamed>"))]
    IncompleteTargetVolume { volume: Option<String> },

    /// More than one At Least / No More Than clause matched the same volume
    #[error("ACP0102: ambiguous {clause} constraint for volume {volume:?}")]
    AmbiguousConstraint { clause: String, volume: String },

    /// One or more structure names exceed the 16-character limit
    #[error("ACP0200: structure names longer than 16 characters: {}", names.join(", "))]
    StructureNameTooLong { names: Vec<String> },

    /// A fixed section of the protocol template is missing
    #[error("ACP0201: protocol section not found: {section}")]
    MissingSection { section: String },

    /// The document was already serialized; further mutation is not allowed
    #[error("ACP0202: protocol document already serialized")]
    DocumentSealed,

    /// Malformed protocol XML
    #[error("ACP0203: malformed protocol XML: {message}")]
    Xml { message: String },

    /// No structure with the requested ID exists in the source document
    #[error("ACP0204: structure not found: {id}")]
    StructureNotFound { id: String },

    /// Requested prescription row does not exist
    #[error("ACP0004: prescription index {index} out of range ({count} rows)")]
    PrescriptionIndex { index: usize, count: usize },

    /// I/O error
    #[error("ACP0401: I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV input error
    #[error("ACP0402: CSV input error: {0}")]
    Csv(String),
}

impl ClinProtError {
    /// Create a malformed-input error naming the field being parsed
    pub fn malformed(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::MalformedInput {
            code: ACP0001,
            field: field.into(),
            text: text.into(),
        }
    }

    /// Create a malformed-input error with an explicit code
    pub fn malformed_with_code(
        code: ErrorCode,
        field: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::MalformedInput {
            code,
            field: field.into(),
            text: text.into(),
        }
    }

    /// Create an XML error
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml {
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedInput { code, .. } => *code,
            Self::InvalidFractionCount { .. } => ACP0100,
            Self::IncompleteTargetVolume { .. } => ACP0101,
            Self::AmbiguousConstraint { .. } => ACP0102,
            Self::StructureNameTooLong { .. } => ACP0200,
            Self::MissingSection { .. } => ACP0201,
            Self::DocumentSealed => ACP0202,
            Self::Xml { .. } => ACP0203,
            Self::StructureNotFound { .. } => ACP0204,
            Self::PrescriptionIndex { .. } => crate::ACP0004,
            Self::Io(_) => ACP0401,
            Self::Csv(_) => ACP0402,
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code(), self.to_string());
        if let Some(help) = self.code().info().help {
            diag = diag.with_help(help);
        }
        if let Self::MalformedInput { text, .. } = self {
            diag = diag.with_source_text(text.clone());
        }
        diag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ACP0003;

    #[test]
    fn test_malformed_input_reports_field_and_text() {
        let err = ClinProtError::malformed("Dose", "no dose here");
        assert_eq!(err.code(), ACP0001);
        let msg = err.to_string();
        assert!(msg.contains("Dose"));
        assert!(msg.contains("no dose here"));
    }

    #[test]
    fn test_structure_name_error_lists_all_names() {
        let err = ClinProtError::StructureNameTooLong {
            names: vec!["VeryLongStructureA".into(), "VeryLongStructureB".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("VeryLongStructureA"));
        assert!(msg.contains("VeryLongStructureB"));
    }

    #[test]
    fn test_warning_diagnostic_display() {
        let diag = Diagnostic::warning(ACP0003, "unrecognized dosimetric parameter")
            .with_source_text("X13$many");
        let rendered = diag.to_string();
        assert!(rendered.contains("warning"));
        assert!(rendered.contains("ACP0003"));
        assert!(rendered.contains("X13$many"));
    }

    #[test]
    fn test_to_diagnostic_carries_help() {
        let err = ClinProtError::malformed("Dose", "Gy");
        let diag = err.to_diagnostic();
        assert_eq!(diag.severity, Severity::Error);
        assert!(diag.help.is_some());
    }
}
