//! Prescription record input
//!
//! The planning system exports prescriptions as a CSV table with three
//! free-text columns. A file may hold several prescriptions (one row per
//! treatment course); callers select one by row index.

use clinprot_diagnostics::{ClinProtError, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// One row of the prescription export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    /// Target-volume prescriptions, pipe-delimited free text
    #[serde(rename = "PrescribedTo")]
    pub prescribed_to: String,
    /// Coverage constraints, pipe-delimited free text
    #[serde(rename = "CoverageConstraints")]
    pub coverage_constraints: String,
    /// Organ-at-risk blocks, newline-delimited free text; may be absent
    #[serde(rename = "OrgansAtRisk", default)]
    pub organs_at_risk: Option<String>,
}

impl PrescriptionRecord {
    /// Select one record from a slice by row index
    pub fn select(records: &[PrescriptionRecord], index: usize) -> Result<&PrescriptionRecord> {
        records
            .get(index)
            .ok_or(ClinProtError::PrescriptionIndex {
                index,
                count: records.len(),
            })
    }
}

/// Read all prescription rows from a CSV export file
pub fn read_prescriptions(path: impl AsRef<Path>) -> Result<Vec<PrescriptionRecord>> {
    let file = std::fs::File::open(path)?;
    read_prescriptions_from_reader(file)
}

/// Read all prescription rows from any reader carrying CSV data
pub fn read_prescriptions_from_reader<R: Read>(reader: R) -> Result<Vec<PrescriptionRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize()
        .map(|row| row.map_err(|e| ClinProtError::Csv(e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
PrescribedTo,CoverageConstraints,OrgansAtRisk
Volume PTV  60.00 Gy  2.00 Gy/Frac,Volume / Structure : PTV Min Dose: 57.0 Gy Max Dose: 64.2 Gy,\"Organ : SpinalCord Mean : Max Dose : 45.0 Gy
Constraints :
D2%$44Gy\"
";

    #[test]
    fn test_read_single_row() {
        let records = read_prescriptions_from_reader(EXPORT.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].prescribed_to.starts_with("Volume PTV"));
        let oar = records[0].organs_at_risk.as_deref().unwrap();
        assert!(oar.contains('\n'));
        assert!(oar.contains("D2%$44Gy"));
    }

    #[test]
    fn test_select_out_of_range() {
        let records = read_prescriptions_from_reader(EXPORT.as_bytes()).unwrap();
        assert!(PrescriptionRecord::select(&records, 0).is_ok());
        let err = PrescriptionRecord::select(&records, 3).unwrap_err();
        assert!(matches!(
            err,
            ClinProtError::PrescriptionIndex { index: 3, count: 1 }
        ));
    }

    #[test]
    fn test_missing_organs_column_is_none() {
        let data = "PrescribedTo,CoverageConstraints,OrgansAtRisk\nabc,def,\n";
        let records = read_prescriptions_from_reader(data.as_bytes()).unwrap();
        assert_eq!(records[0].organs_at_risk, None);
    }
}
