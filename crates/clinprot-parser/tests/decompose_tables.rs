//! Decomposer tests over a realistic export row, including the JSON view
//! the command-line tool prints

use clinprot_parser::{
    DecomposeOptions, PrescriptionRecord, decompose, read_prescriptions_from_reader,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const EXPORT: &str = "\
PrescribedTo,CoverageConstraints,OrgansAtRisk
Volume PTV_54  54.00 Gy  1.80 Gy/Frac|Volume PTV_44  44.00 Gy  1.47 Gy/Frac,\
\"Volume / Structure : PTV_54 Min Dose: 51.3 Gy Max Dose: 57.8 Gy At Least 95.0 % of PTV_54 at 95.0 % 51.3 Gy No More Than 2.0 % of PTV_54 at 107.0 % 57.8 Gy|\
Volume / Structure : PTV_44 Min Dose: 41.8 Gy Max Dose: 47.1 Gy At Least 95.0 % of PTV_44 at 95.0 % 41.8 Gy No More Than 2.0 % of PTV_44 at 107.0 % 47.1 Gy\",\
\"Organ : SpinalCord Mean : Max Dose : 45.0 Gy
Constraints :
D2%$44Gy
Organ : Parotid_L Mean : 26.0 Gy Max Dose :
Constraints :
V30$50%\"
";

fn tables() -> clinprot_parser::PrescriptionTables {
    let records = read_prescriptions_from_reader(EXPORT.as_bytes()).unwrap();
    let record = PrescriptionRecord::select(&records, 0).unwrap();
    decompose(record, &DecomposeOptions::default()).unwrap()
}

#[test]
fn test_two_target_volumes() {
    let tables = tables();
    assert_eq!(tables.target_volumes.len(), 2);
    assert_eq!(tables.target_volumes[0].volume.as_deref(), Some("PTV_54"));
    assert_eq!(tables.target_volumes[1].volume.as_deref(), Some("PTV_44"));
    assert_eq!(tables.target_volumes[1].total_dose_gy, Some(44.0));
    assert_eq!(tables.target_volumes[1].fraction_dose_gy, Some(1.47));
}

#[rstest]
#[case(0, "PTV_54", 51.3, 57.8)]
#[case(1, "PTV_44", 41.8, 47.1)]
fn test_coverage_rows_keep_their_own_volume(
    #[case] row: usize,
    #[case] volume: &str,
    #[case] min: f64,
    #[case] max: f64,
) {
    let tables = tables();
    let cc = &tables.coverage[row];
    assert_eq!(cc.volume.as_deref(), Some(volume));
    assert_eq!(cc.min_dose_gy, Some(min));
    assert_eq!(cc.max_dose_gy, Some(max));
    assert_eq!(cc.at_least.unwrap().volume_pct, 95.0);
    assert_eq!(cc.no_more.unwrap().dose_pct, 107.0);
}

#[test]
fn test_organ_rows() {
    let tables = tables();
    assert_eq!(tables.organs.len(), 2);
    assert_eq!(tables.organs[0].organ.as_deref(), Some("SpinalCord"));
    assert_eq!(tables.organs[0].max_dose_gy, Some(45.0));
    assert_eq!(tables.organs[1].mean_dose_gy, Some(26.0));
}

#[test]
fn test_json_view_field_names() {
    let tables = tables();
    let json = serde_json::to_value(&tables).unwrap();
    assert_eq!(json["target_volumes"][0]["volume"], "PTV_54");
    assert_eq!(json["coverage"][0]["at_least"]["dose_pct"], 95.0);
    assert_eq!(json["organs"][0]["dosimetric_parameters"][0], "D2%$44Gy");
    // absent fields stay null, not empty strings
    assert!(json["organs"][0]["mean_dose_gy"].is_null());
}
