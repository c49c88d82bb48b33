//! Radiotherapy prescription to clinical protocol converter
//!
//! Facade crate tying the pipeline together: free-text prescription parsing,
//! constraint-to-objective translation and protocol document generation.
//!
//! ```
//! use clinprot::{ConvertRequest, PrescriptionRecord, convert};
//!
//! let record = PrescriptionRecord {
//!     prescribed_to: "Volume PTV  60.00 Gy  2.00 Gy/Frac".to_string(),
//!     coverage_constraints: "Volume / Structure : PTV Min Dose: 57.0 Gy Max Dose: 64.2 Gy \
//!                            At Least 95.0 % of PTV at 95.0 % 57.0 Gy No More Than 2.0 % of PTV at 107.0 % 64.2 Gy"
//!         .to_string(),
//!     organs_at_risk: None,
//! };
//! let outcome = convert(&ConvertRequest::new(record, "Example 60", "planner")).unwrap();
//! assert_eq!(outcome.document.phase().fraction_count, Some(30));
//! ```

mod convert;

pub use convert::{ConvertOutcome, ConvertRequest, convert};

pub use clinprot_diagnostics::{ClinProtError, Diagnostic, ErrorCode, Result, Severity};
pub use clinprot_parser::{
    CoverageConstraint, CoveragePoint, CoverageStrictness, DecomposeOptions, DosimetricParameter,
    DosimetricShape, MAX_STRUCTURE_NAME_LEN, NameChange, NameSuggestion, OrganAtRisk,
    PrescriptionRecord, PrescriptionTables, TargetVolume, check_name_lengths, correct_file,
    correct_text, decompose, ensure_name_lengths, parse_dose_phrase, parse_dosimetric_parameter,
    read_prescriptions, read_prescriptions_from_reader, suggest_corrections,
};
pub use clinprot_protocol::{PreviewSettings, ProtocolDocument, StructureSettings};
pub use clinprot_translate::{
    ExpectedCounts, NumberFormat, Translation, expected_counts, translate,
    treatment_dose_prescription,
};

/// The subsystem crates, re-exported for callers that need the full APIs
pub mod parser {
    pub use clinprot_parser::*;
}
pub mod protocol {
    pub use clinprot_protocol::*;
}
pub mod translate_rules {
    pub use clinprot_translate::*;
}
