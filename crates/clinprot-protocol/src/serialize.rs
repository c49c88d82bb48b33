//! Stable pretty-printing XML writer
//!
//! Hand-rolled on purpose: the output must be byte-stable across parse and
//! re-serialize so produced documents can be diffed against historical ones.
//! Two-space indentation, one element per line, self-closing empty elements.

use crate::model::{MeasureItem, ObjectiveItem, ProtocolDocument, Structure};

const INDENT: &str = "  ";

/// Escape XML special characters, quotes included so the result is safe in
/// attribute position as well
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn write_indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

fn open(out: &mut String, level: usize, tag: &str) {
    write_indent(out, level);
    out.push('<');
    out.push_str(tag);
    out.push_str(">\n");
}

fn close(out: &mut String, level: usize, tag: &str) {
    write_indent(out, level);
    out.push_str("</");
    out.push_str(tag);
    out.push_str(">\n");
}

/// `<Tag>text</Tag>`, or `<Tag />` when the text is empty
fn text_element(out: &mut String, level: usize, tag: &str, text: &str) {
    write_indent(out, level);
    if text.is_empty() {
        out.push('<');
        out.push_str(tag);
        out.push_str(" />\n");
    } else {
        out.push('<');
        out.push_str(tag);
        out.push('>');
        out.push_str(&escape_xml(text));
        out.push_str("</");
        out.push_str(tag);
        out.push_str(">\n");
    }
}

/// A nullable numeric field with no value
fn nil_element(out: &mut String, level: usize, tag: &str) {
    write_indent(out, level);
    out.push('<');
    out.push_str(tag);
    out.push_str(" xsi:nil=\"true\" />\n");
}

fn attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_xml(value));
    out.push('"');
}

pub(crate) fn serialize_document(doc: &ProtocolDocument) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<ClinicalProtocol>\n");

    write_indent(&mut out, 1);
    out.push_str("<Preview");
    attr(&mut out, "ID", &doc.preview.id);
    attr(&mut out, "ApprovalStatus", &doc.preview.approval_status);
    attr(&mut out, "TreatmentSite", &doc.preview.treatment_site);
    attr(&mut out, "AssignedUsers", &doc.preview.assigned_users);
    attr(&mut out, "LastModified", &doc.preview.last_modified);
    attr(&mut out, "ApprovalHistory", &doc.preview.approval_history);
    out.push_str(" />\n");

    open(&mut out, 1, "StructureTemplate");
    if doc.structures.is_empty() {
        write_indent(&mut out, 2);
        out.push_str("<Structures />\n");
    } else {
        open(&mut out, 2, "Structures");
        for structure in &doc.structures {
            write_structure(&mut out, 3, structure);
        }
        close(&mut out, 2, "Structures");
    }
    close(&mut out, 1, "StructureTemplate");

    open(&mut out, 1, "Phases");
    write_indent(&mut out, 2);
    out.push_str("<Phase");
    attr(&mut out, "ID", &doc.phase.id);
    out.push_str(">\n");
    match doc.phase.fraction_count {
        Some(count) => text_element(&mut out, 3, "FractionCount", &count.to_string()),
        None => text_element(&mut out, 3, "FractionCount", ""),
    }
    if doc.phase.objectives.is_empty() && doc.phase.measures.is_empty() {
        write_indent(&mut out, 3);
        out.push_str("<Prescription />\n");
    } else {
        open(&mut out, 3, "Prescription");
        for item in &doc.phase.objectives {
            write_objective(&mut out, 4, item);
        }
        for item in &doc.phase.measures {
            write_measure(&mut out, 4, item);
        }
        close(&mut out, 3, "Prescription");
    }
    close(&mut out, 2, "Phase");
    close(&mut out, 1, "Phases");

    out.push_str("</ClinicalProtocol>\n");
    out
}

fn write_structure(out: &mut String, level: usize, structure: &Structure) {
    write_indent(out, level);
    out.push_str("<Structure");
    attr(out, "ID", &structure.id);
    attr(out, "Name", &structure.name);
    out.push_str(">\n");

    open(out, level + 1, "Identification");
    text_element(out, level + 2, "VolumeID", &structure.identification.volume_id);
    text_element(out, level + 2, "VolumeCode", &structure.identification.volume_code);
    text_element(out, level + 2, "VolumeType", &structure.identification.volume_type);
    text_element(
        out,
        level + 2,
        "VolumeCodeTable",
        &structure.identification.volume_code_table,
    );
    text_element(
        out,
        level + 2,
        "StructureCode",
        &structure.identification.structure_code,
    );
    close(out, level + 1, "Identification");

    text_element(out, level + 1, "TypeIndex", &structure.type_index.to_string());
    text_element(out, level + 1, "ColorAndStyle", &structure.color_and_style);
    text_element(out, level + 1, "SearchCTLow", &structure.search_ct_low.to_string());
    text_element(out, level + 1, "SearchCTHigh", &structure.search_ct_high.to_string());
    text_element(out, level + 1, "DVHLineStyle", &structure.dvh_line_style.to_string());
    text_element(out, level + 1, "DVHLineColor", &structure.dvh_line_color.to_string());
    text_element(out, level + 1, "DVHLineWidth", &structure.dvh_line_width.to_string());
    nil_element(out, level + 1, "EUDAlpha");
    nil_element(out, level + 1, "TCPAlpha");
    nil_element(out, level + 1, "TCPBeta");
    nil_element(out, level + 1, "TCPGamma");

    close(out, level, "Structure");
}

fn write_objective(out: &mut String, level: usize, item: &ObjectiveItem) {
    write_indent(out, level);
    out.push_str("<Item");
    attr(out, "ID", &item.id);
    attr(out, "Primary", if item.primary { "true" } else { "false" });
    out.push_str(">\n");
    text_element(out, level + 1, "Type", &item.item_type.to_string());
    text_element(out, level + 1, "Modifier", &item.modifier.to_string());
    text_element(out, level + 1, "Parameter", &item.parameter);
    text_element(out, level + 1, "Dose", &item.dose);
    text_element(out, level + 1, "TotalDose", &item.total_dose);
    close(out, level, "Item");
}

fn write_measure(out: &mut String, level: usize, item: &MeasureItem) {
    write_indent(out, level);
    out.push_str("<MeasureItem");
    attr(out, "ID", &item.id);
    out.push_str(">\n");
    text_element(out, level + 1, "Type", &item.item_type.to_string());
    text_element(out, level + 1, "Modifier", &item.modifier.to_string());
    text_element(out, level + 1, "Value", &item.value);
    text_element(out, level + 1, "TypeSpecifier", &item.type_specifier);
    text_element(
        out,
        level + 1,
        "ReportDQPValueInAbsoluteUnits",
        if item.absolute_units { "true" } else { "false" },
    );
    close(out, level, "MeasureItem");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b < c"), "a &amp; b &lt; c");
        assert_eq!(escape_xml("\"quoted\" 'single'"), "&quot;quoted&quot; &apos;single&apos;");
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_template_serialization_shape() {
        let doc = ProtocolDocument::template();
        let xml = doc.to_xml();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"));
        assert!(xml.contains("<Structures />"));
        assert!(xml.contains("<FractionCount />"));
        assert!(xml.contains("<Prescription />"));
        assert!(xml.ends_with("</ClinicalProtocol>\n"));
    }
}
