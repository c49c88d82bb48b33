//! Document-level serialization tests

use chrono::NaiveDate;
use clinprot_protocol::{PreviewSettings, ProtocolDocument, StructureSettings};
use clinprot_translate::{
    IndexModifier, NumberFormat, ObjectiveModifier, PlanObjectiveEntry, QualityIndexEntry,
    QualityIndexType,
};
use pretty_assertions::assert_eq;

fn populated_document() -> ProtocolDocument {
    let mut doc = ProtocolDocument::template();
    let stamp = NaiveDate::from_ymd_opt(2024, 3, 14)
        .unwrap()
        .and_hms_milli_opt(9, 26, 53, 589)
        .unwrap();
    doc.set_preview_at(
        &PreviewSettings::new("Larynx 54", "mvdoc").with_treatment_site("Larynx"),
        stamp,
    )
    .unwrap();
    doc.set_phase("plan", 30).unwrap();
    doc.add_structure(&StructureSettings::new("PTV_54")).unwrap();
    doc.add_structure(&StructureSettings::new("SpinalCord")).unwrap();
    doc.append_plan_objective(
        &PlanObjectiveEntry {
            structure_id: "PTV_54".to_string(),
            modifier: ObjectiveModifier::AtLeast,
            parameter: 95.0,
            dose_gy: 1.71,
            total_dose_gy: 51.3,
            primary: false,
        },
        NumberFormat::General,
    )
    .unwrap();
    doc.append_quality_index(
        &QualityIndexEntry {
            structure_id: "SpinalCord".to_string(),
            index_type: QualityIndexType::DoseAtRelativeVolume,
            modifier: IndexModifier::IsLessThan,
            value: 44.0,
            type_specifier: 2.0,
            absolute_units: true,
        },
        NumberFormat::General,
    )
    .unwrap();
    doc
}

#[test]
fn test_serialization_is_idempotent() {
    let doc = populated_document();
    let first = doc.to_xml();
    let reparsed = ProtocolDocument::from_xml(&first).unwrap();
    let second = reparsed.to_xml();
    assert_eq!(first, second);
}

#[test]
fn test_parse_recovers_model() {
    let doc = populated_document();
    let reparsed = ProtocolDocument::from_xml(&doc.to_xml()).unwrap();
    assert_eq!(reparsed, doc);
    assert_eq!(reparsed.item_count(), 1);
    assert_eq!(reparsed.measure_item_count(), 1);
    assert_eq!(reparsed.phase().fraction_count, Some(30));
    assert_eq!(reparsed.structure_names(), vec!["PTV_54", "SpinalCord"]);
}

#[test]
fn test_escaped_names_survive_roundtrip() {
    let mut doc = populated_document();
    doc.add_structure(&StructureSettings::new("PTV<54&boost>")).unwrap();
    let reparsed = ProtocolDocument::from_xml(&doc.to_xml()).unwrap();
    assert!(
        reparsed
            .structure_names()
            .contains(&"PTV<54&boost>")
    );
}

#[test]
fn test_amend_from_parsed_document() {
    let source = populated_document();
    let reparsed = ProtocolDocument::from_xml(&source.to_xml()).unwrap();

    let mut target = ProtocolDocument::template();
    target.amend(&reparsed, "PTV_54").unwrap();
    assert_eq!(target.structure_names(), vec!["PTV_54"]);
    assert_eq!(target.item_count(), 1);
    assert_eq!(target.measure_item_count(), 0);
    assert_eq!(target.phase().objectives[0].total_dose, "51.3");
}

#[test]
fn test_written_file_parses_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("protocol.xml");
    let mut doc = populated_document();
    doc.write_to_file(&path).unwrap();

    let read_back = ProtocolDocument::from_file(&path).unwrap();
    assert_eq!(read_back.item_count(), 1);
    assert_eq!(read_back.preview().last_modified, " March 14 2024 09:26:53:589");
}
