//! Constraint-to-objective translation
//!
//! The algorithmic core of the converter: deterministic business rules
//! mapping decomposed prescription tables to protocol plan-objective and
//! quality-index entries, with fraction-dose and relative/absolute dose
//! conversions.

mod counts;
mod entries;
mod format;
mod translate;

pub use counts::{ExpectedCounts, expected_counts};
pub use entries::{
    IndexModifier, ObjectiveModifier, PlanObjectiveEntry, QualityIndexEntry, QualityIndexType,
};
pub use format::{NumberFormat, format_number};
pub use translate::{Translation, translate, treatment_dose_prescription};
