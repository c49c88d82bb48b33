//! Prescription parsing for the clinical protocol converter
//!
//! This crate decodes the semi-structured free text of a radiotherapy
//! prescription export into structured tables:
//!
//! - micro-parsers for single tokens (dose phrases, dosimetric parameters)
//! - the decomposer splitting a prescription record into target volumes,
//!   coverage constraints and organ-at-risk blocks
//! - the CSV record reader and the structure-name correction helpers
//!
//! The grammars are fixed and order-sensitive; they cover the documented
//! export phrasings only. Text outside those patterns is rejected with a
//! diagnosable error (required fields) or collected for review (dosimetric
//! parameters), never silently misparsed.

mod dose;
mod dosimetric;
pub mod names;
mod prescription;
mod record;

pub use dose::parse_dose_phrase;
pub use names::{
    MAX_STRUCTURE_NAME_LEN, NameChange, NameSuggestion, check_name_lengths, correct_file,
    correct_text, ensure_name_lengths, suggest_corrections,
};
pub use dosimetric::{DosimetricParameter, DosimetricShape, parse_dosimetric_parameter};
pub use prescription::{
    CoverageConstraint, CoveragePoint, CoverageStrictness, DecomposeOptions, OrganAtRisk,
    PrescriptionTables, TargetVolume, decompose,
};
pub use record::{PrescriptionRecord, read_prescriptions, read_prescriptions_from_reader};
