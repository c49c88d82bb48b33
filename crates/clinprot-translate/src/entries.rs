//! Protocol entry model
//!
//! Typed plan-objective and quality-index entries together with the numeric
//! codes the planning system stores for them. The full code tables are kept
//! even though the translator only emits a subset, so documents produced by
//! other tooling can be decoded with the same vocabulary.

use serde::{Deserialize, Serialize};

/// Plan-objective modifier, stored as the `Modifier` code of an `Item`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveModifier {
    /// At Least <Parameter> % receives <TotalDose> Gy
    AtLeast,
    /// At Most <Parameter> % receives <TotalDose> Gy
    AtMost,
    /// Minimum dose is <TotalDose> Gy
    MinimumIs,
    /// Maximum dose is <TotalDose> Gy
    MaximumIs,
    /// Mean dose is <TotalDose> Gy
    MeanIs,
    /// Reference point receives <TotalDose> Gy
    ReferencePoint,
    /// Equivalent uniform dose is <TotalDose> Gy
    EquivalentUniformDose,
    /// Mean dose is more than <TotalDose> Gy
    MeanIsMoreThan,
    /// Mean dose is less than <TotalDose> Gy
    MeanIsLessThan,
    /// Minimum dose is more than <TotalDose> Gy
    MinIsMoreThan,
    /// Maximum dose is less than <TotalDose> Gy
    MaxIsLessThan,
}

impl ObjectiveModifier {
    /// The numeric `Modifier` code written into the document
    pub const fn code(self) -> i32 {
        match self {
            Self::AtLeast => 0,
            Self::AtMost => 1,
            Self::MinimumIs => 2,
            Self::MaximumIs => 3,
            Self::MeanIs => 4,
            Self::ReferencePoint => 5,
            Self::EquivalentUniformDose => 6,
            Self::MeanIsMoreThan => 7,
            Self::MeanIsLessThan => 8,
            Self::MinIsMoreThan => 9,
            Self::MaxIsLessThan => 10,
        }
    }

    /// Decode a `Modifier` code read back from a document
    pub const fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::AtLeast,
            1 => Self::AtMost,
            2 => Self::MinimumIs,
            3 => Self::MaximumIs,
            4 => Self::MeanIs,
            5 => Self::ReferencePoint,
            6 => Self::EquivalentUniformDose,
            7 => Self::MeanIsMoreThan,
            8 => Self::MeanIsLessThan,
            9 => Self::MinIsMoreThan,
            10 => Self::MaxIsLessThan,
            _ => return None,
        })
    }
}

/// Quality-index kind, stored as the `Type` code of a `MeasureItem`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityIndexType {
    ConformityIndex,
    GradientMeasure,
    /// Vxx with the dose given as a percentage of prescription
    VolumeAtRelativeDose,
    /// Vxx Gy, dose given in Gy
    VolumeAtAbsoluteDose,
    /// Dxx, volume given as a percentage
    DoseAtRelativeVolume,
    /// Dxx cc, volume given in cc
    DoseAtAbsoluteVolume,
}

impl QualityIndexType {
    pub const fn code(self) -> i32 {
        match self {
            Self::ConformityIndex => 0,
            Self::GradientMeasure => 1,
            Self::VolumeAtRelativeDose => 2,
            Self::VolumeAtAbsoluteDose => 3,
            Self::DoseAtRelativeVolume => 4,
            Self::DoseAtAbsoluteVolume => 5,
        }
    }

    pub const fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::ConformityIndex,
            1 => Self::GradientMeasure,
            2 => Self::VolumeAtRelativeDose,
            3 => Self::VolumeAtAbsoluteDose,
            4 => Self::DoseAtRelativeVolume,
            5 => Self::DoseAtAbsoluteVolume,
            _ => return None,
        })
    }
}

/// Quality-index comparison, stored as the `Modifier` code of a `MeasureItem`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexModifier {
    IsMoreThan,
    IsLessThan,
    Is,
}

impl IndexModifier {
    pub const fn code(self) -> i32 {
        match self {
            Self::IsMoreThan => 0,
            Self::IsLessThan => 1,
            Self::Is => 2,
        }
    }

    pub const fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::IsMoreThan,
            1 => Self::IsLessThan,
            2 => Self::Is,
            _ => return None,
        })
    }
}

/// One plan objective, keyed to a structure by ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanObjectiveEntry {
    /// Structure the objective applies to
    pub structure_id: String,
    pub modifier: ObjectiveModifier,
    /// Volume percentage the modifier quantifies over; 0 for mean/max forms
    pub parameter: f64,
    /// Per-fraction dose in Gy
    pub dose_gy: f64,
    /// Total dose in Gy
    pub total_dose_gy: f64,
    /// Marks the primary prescription objective
    pub primary: bool,
}

/// One quality index, keyed to a structure by ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIndexEntry {
    /// Structure the index applies to
    pub structure_id: String,
    pub index_type: QualityIndexType,
    pub modifier: IndexModifier,
    /// The constrained quantity (a volume for Vxx forms, a dose for Dxx forms)
    pub value: f64,
    /// The specifier the index is evaluated at (a dose for Vxx forms, a
    /// volume for Dxx forms)
    pub type_specifier: f64,
    /// Whether the reported value is in absolute units
    pub absolute_units: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_codes_round_trip() {
        for code in 0..=10 {
            let modifier = ObjectiveModifier::from_code(code).unwrap();
            assert_eq!(modifier.code(), code);
        }
        assert_eq!(ObjectiveModifier::from_code(11), None);
    }

    #[test]
    fn test_emitted_objective_codes() {
        assert_eq!(ObjectiveModifier::AtLeast.code(), 0);
        assert_eq!(ObjectiveModifier::AtMost.code(), 1);
        assert_eq!(ObjectiveModifier::MeanIsLessThan.code(), 8);
        assert_eq!(ObjectiveModifier::MaxIsLessThan.code(), 10);
    }

    #[test]
    fn test_emitted_index_codes() {
        assert_eq!(QualityIndexType::VolumeAtAbsoluteDose.code(), 3);
        assert_eq!(QualityIndexType::DoseAtRelativeVolume.code(), 4);
        assert_eq!(QualityIndexType::DoseAtAbsoluteVolume.code(), 5);
        assert_eq!(IndexModifier::IsMoreThan.code(), 0);
        assert_eq!(IndexModifier::IsLessThan.code(), 1);
    }
}
