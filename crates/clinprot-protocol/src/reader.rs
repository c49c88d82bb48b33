//! Protocol XML reader
//!
//! Parses template skeletons and produced documents back into the typed
//! model. Numeric prescription fields are kept as the exact document text so
//! re-serializing reproduces the input bytes.

use crate::model::{
    Identification, MeasureItem, ObjectiveItem, Phase, Preview, ProtocolDocument, Structure,
};
use clinprot_diagnostics::{ClinProtError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

fn xml_err(err: impl std::fmt::Display) -> ClinProtError {
    ClinProtError::xml(err.to_string())
}

fn attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attr in element.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        out.push((key, value));
    }
    Ok(out)
}

fn attr_value(attrs: &[(String, String)], name: &str) -> String {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
        .unwrap_or_default()
}

fn parse_i32(tag: &str, text: &str) -> Result<i32> {
    text.parse()
        .map_err(|_| ClinProtError::xml(format!("invalid integer in <{tag}>: {text:?}")))
}

fn parse_u32(tag: &str, text: &str) -> Result<u32> {
    text.parse()
        .map_err(|_| ClinProtError::xml(format!("invalid count in <{tag}>: {text:?}")))
}

/// Parse a full protocol document from XML text
pub(crate) fn parse_document(xml: &str) -> Result<ProtocolDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut preview = None;
    let mut structures = Vec::new();
    let mut phase = None;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Preview" => preview = Some(read_preview(&e)?),
                b"Structure" => structures.push(read_structure(&mut reader, &e)?),
                b"Phase" => phase = Some(read_phase(&mut reader, &e)?),
                _ => {}
            },
            Event::Empty(e) => {
                if e.name().as_ref() == b"Preview" {
                    preview = Some(read_preview(&e)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ProtocolDocument {
        preview: preview.ok_or_else(|| ClinProtError::MissingSection {
            section: "Preview".to_string(),
        })?,
        structures,
        phase: phase.ok_or_else(|| ClinProtError::MissingSection {
            section: "Phases/Phase".to_string(),
        })?,
        sealed: false,
    })
}

fn read_preview(element: &BytesStart<'_>) -> Result<Preview> {
    let attrs = attributes(element)?;
    Ok(Preview {
        id: attr_value(&attrs, "ID"),
        approval_status: attr_value(&attrs, "ApprovalStatus"),
        treatment_site: attr_value(&attrs, "TreatmentSite"),
        assigned_users: attr_value(&attrs, "AssignedUsers"),
        last_modified: attr_value(&attrs, "LastModified"),
        approval_history: attr_value(&attrs, "ApprovalHistory"),
    })
}

fn read_structure(reader: &mut Reader<&[u8]>, element: &BytesStart<'_>) -> Result<Structure> {
    let attrs = attributes(element)?;
    let mut structure = Structure {
        id: attr_value(&attrs, "ID"),
        name: attr_value(&attrs, "Name"),
        identification: Identification {
            volume_type: String::new(),
            ..Identification::default()
        },
        type_index: 0,
        color_and_style: String::new(),
        search_ct_low: 0,
        search_ct_high: 0,
        dvh_line_style: 0,
        dvh_line_color: 0,
        dvh_line_width: 0,
    };

    let mut current = Vec::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => current = e.name().as_ref().to_vec(),
            Event::Text(t) => {
                let text = t.unescape().map_err(xml_err)?.into_owned();
                match current.as_slice() {
                    b"VolumeID" => structure.identification.volume_id = text,
                    b"VolumeCode" => structure.identification.volume_code = text,
                    b"VolumeType" => structure.identification.volume_type = text,
                    b"VolumeCodeTable" => structure.identification.volume_code_table = text,
                    b"StructureCode" => structure.identification.structure_code = text,
                    b"TypeIndex" => structure.type_index = parse_i32("TypeIndex", &text)?,
                    b"ColorAndStyle" => structure.color_and_style = text,
                    b"SearchCTLow" => structure.search_ct_low = parse_i32("SearchCTLow", &text)?,
                    b"SearchCTHigh" => structure.search_ct_high = parse_i32("SearchCTHigh", &text)?,
                    b"DVHLineStyle" => structure.dvh_line_style = parse_i32("DVHLineStyle", &text)?,
                    b"DVHLineColor" => structure.dvh_line_color = parse_i32("DVHLineColor", &text)?,
                    b"DVHLineWidth" => structure.dvh_line_width = parse_i32("DVHLineWidth", &text)?,
                    _ => {}
                }
            }
            Event::End(e) if e.name().as_ref() == b"Structure" => break,
            Event::End(_) | Event::Empty(_) => current.clear(),
            Event::Eof => {
                return Err(ClinProtError::xml("unexpected end of document in <Structure>"));
            }
            _ => {}
        }
    }
    Ok(structure)
}

fn read_phase(reader: &mut Reader<&[u8]>, element: &BytesStart<'_>) -> Result<Phase> {
    let attrs = attributes(element)?;
    let mut phase = Phase {
        id: attr_value(&attrs, "ID"),
        ..Phase::default()
    };

    let mut in_fraction_count = false;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.name().as_ref() {
                b"FractionCount" => in_fraction_count = true,
                b"Item" => phase.objectives.push(read_objective(reader, &e)?),
                b"MeasureItem" => phase.measures.push(read_measure(reader, &e)?),
                _ => {}
            },
            Event::Text(t) if in_fraction_count => {
                let text = t.unescape().map_err(xml_err)?;
                phase.fraction_count = Some(parse_u32("FractionCount", &text)?);
            }
            Event::End(e) => match e.name().as_ref() {
                b"FractionCount" => in_fraction_count = false,
                b"Phase" => break,
                _ => {}
            },
            Event::Eof => {
                return Err(ClinProtError::xml("unexpected end of document in <Phase>"));
            }
            _ => {}
        }
    }
    Ok(phase)
}

fn read_objective(reader: &mut Reader<&[u8]>, element: &BytesStart<'_>) -> Result<ObjectiveItem> {
    let attrs = attributes(element)?;
    let mut item = ObjectiveItem {
        id: attr_value(&attrs, "ID"),
        primary: attr_value(&attrs, "Primary") == "true",
        item_type: 0,
        modifier: 0,
        parameter: String::new(),
        dose: String::new(),
        total_dose: String::new(),
    };

    let mut current = Vec::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => current = e.name().as_ref().to_vec(),
            Event::Text(t) => {
                let text = t.unescape().map_err(xml_err)?.into_owned();
                match current.as_slice() {
                    b"Type" => item.item_type = parse_i32("Type", &text)?,
                    b"Modifier" => item.modifier = parse_i32("Modifier", &text)?,
                    b"Parameter" => item.parameter = text,
                    b"Dose" => item.dose = text,
                    b"TotalDose" => item.total_dose = text,
                    _ => {}
                }
            }
            Event::End(e) if e.name().as_ref() == b"Item" => break,
            Event::End(_) | Event::Empty(_) => current.clear(),
            Event::Eof => return Err(ClinProtError::xml("unexpected end of document in <Item>")),
            _ => {}
        }
    }
    Ok(item)
}

fn read_measure(reader: &mut Reader<&[u8]>, element: &BytesStart<'_>) -> Result<MeasureItem> {
    let attrs = attributes(element)?;
    let mut item = MeasureItem {
        id: attr_value(&attrs, "ID"),
        item_type: 0,
        modifier: 0,
        value: String::new(),
        type_specifier: String::new(),
        absolute_units: false,
    };

    let mut current = Vec::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => current = e.name().as_ref().to_vec(),
            Event::Text(t) => {
                let text = t.unescape().map_err(xml_err)?.into_owned();
                match current.as_slice() {
                    b"Type" => item.item_type = parse_i32("Type", &text)?,
                    b"Modifier" => item.modifier = parse_i32("Modifier", &text)?,
                    b"Value" => item.value = text,
                    b"TypeSpecifier" => item.type_specifier = text,
                    b"ReportDQPValueInAbsoluteUnits" => item.absolute_units = text == "true",
                    _ => {}
                }
            }
            Event::End(e) if e.name().as_ref() == b"MeasureItem" => break,
            Event::End(_) | Event::Empty(_) => current.clear(),
            Event::Eof => {
                return Err(ClinProtError::xml("unexpected end of document in <MeasureItem>"));
            }
            _ => {}
        }
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_roundtrip() {
        let template = ProtocolDocument::template();
        let parsed = parse_document(&template.to_xml()).unwrap();
        assert_eq!(parsed, template);
    }

    #[test]
    fn test_missing_phase_is_reported() {
        let xml = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<ClinicalProtocol>\n  <Preview ID=\"\" />\n</ClinicalProtocol>\n";
        let err = parse_document(xml).unwrap_err();
        assert!(matches!(err, ClinProtError::MissingSection { .. }));
    }

    #[test]
    fn test_malformed_xml_is_reported() {
        let err = parse_document("<ClinicalProtocol><Preview").unwrap_err();
        assert!(matches!(err, ClinProtError::Xml { .. }));
    }

    #[test]
    fn test_invalid_fraction_count_text() {
        let xml = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<ClinicalProtocol>\n  <Preview ID=\"\" />\n  <Phases>\n    <Phase ID=\"p\">\n      <FractionCount>thirty</FractionCount>\n    </Phase>\n  </Phases>\n</ClinicalProtocol>\n";
        let err = parse_document(xml).unwrap_err();
        assert!(matches!(err, ClinProtError::Xml { .. }));
    }
}
