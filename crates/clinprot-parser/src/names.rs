//! Structure-name checks and correction
//!
//! The planning system limits structure names to 16 characters, and the names
//! typed into a prescription rarely match the contoured structure set exactly.
//! This module checks the length rule, suggests the closest reference name by
//! Ratcliff/Obershelp similarity, and applies literal name substitutions to
//! raw prescription text so it can be re-parsed.

use clinprot_diagnostics::{ClinProtError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use textdistance::str::ratcliff_obershelp;

/// Maximum structure-name length accepted by the protocol definition
pub const MAX_STRUCTURE_NAME_LEN: usize = 16;

/// Collect the names that exceed [`MAX_STRUCTURE_NAME_LEN`]
pub fn check_name_lengths<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| name.chars().count() > MAX_STRUCTURE_NAME_LEN)
        .map(str::to_string)
        .collect()
}

/// Fail with the full offending list when any name exceeds the limit
pub fn ensure_name_lengths<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let offending = check_name_lengths(names);
    if offending.is_empty() {
        Ok(())
    } else {
        Err(ClinProtError::StructureNameTooLong { names: offending })
    }
}

/// A suggested rename for one structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameSuggestion {
    /// Name as it appears in the prescription or protocol
    pub structure: String,
    /// Closest name from the reference structure set
    pub suggestion: String,
    /// Ratcliff/Obershelp similarity of the pair, in [0, 1]
    pub similarity: f64,
}

/// For each name, pick the reference name with the highest
/// Ratcliff/Obershelp similarity.
///
/// Ties keep the first reference name in list order; an empty reference list
/// yields no suggestions.
pub fn suggest_corrections(names: &[String], reference: &[String]) -> Vec<NameSuggestion> {
    names
        .iter()
        .filter_map(|name| {
            let (best, score) = reference
                .iter()
                .map(|candidate| (candidate, ratcliff_obershelp(name, candidate)))
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))?;
            Some(NameSuggestion {
                structure: name.clone(),
                suggestion: best.clone(),
                similarity: score,
            })
        })
        .collect()
}

/// An old-name to new-name substitution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameChange {
    pub old: String,
    pub new: String,
}

/// Apply literal substring replacements over raw prescription text.
///
/// Replacements are applied in list order; later changes see the output of
/// earlier ones.
pub fn correct_text(text: &str, changes: &[NameChange]) -> String {
    let mut corrected = text.to_string();
    for change in changes {
        corrected = corrected.replace(&change.old, &change.new);
    }
    corrected
}

/// Rewrite a prescription file in place with the given name substitutions
pub fn correct_file(path: impl AsRef<Path>, changes: &[NameChange]) -> Result<()> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let corrected = correct_text(&text, changes);
    std::fs::write(path, corrected)?;
    Ok(())
}
