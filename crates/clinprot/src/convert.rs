//! The prescription-to-protocol pipeline
//!
//! Wires the subsystem crates together: decompose the record, translate the
//! constraints, gate on the structure-name limit, then populate a protocol
//! document. The document is only touched after every fallible step has
//! succeeded, so a failed conversion never leaves a half-built document.

use chrono::NaiveDateTime;
use clinprot_diagnostics::{Diagnostic, Result};
use clinprot_parser::{
    DecomposeOptions, PrescriptionRecord, PrescriptionTables, decompose, ensure_name_lengths,
};
use clinprot_protocol::{PreviewSettings, ProtocolDocument, StructureSettings};
use clinprot_translate::{NumberFormat, translate};

/// Everything one conversion needs
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub record: PrescriptionRecord,
    /// Protocol identifier, used for the preview header and the phase
    pub protocol_id: String,
    pub treatment_site: String,
    pub assigned_users: String,
    /// Template to populate; the built-in skeleton when absent
    pub template: Option<ProtocolDocument>,
    pub number_format: NumberFormat,
    pub decompose: DecomposeOptions,
    /// Fixed preview timestamp; the current local time when absent
    pub timestamp: Option<NaiveDateTime>,
}

impl ConvertRequest {
    pub fn new(
        record: PrescriptionRecord,
        protocol_id: impl Into<String>,
        assigned_users: impl Into<String>,
    ) -> Self {
        Self {
            record,
            protocol_id: protocol_id.into(),
            treatment_site: String::new(),
            assigned_users: assigned_users.into(),
            template: None,
            number_format: NumberFormat::default(),
            decompose: DecomposeOptions::default(),
            timestamp: None,
        }
    }

    pub fn with_treatment_site(mut self, site: impl Into<String>) -> Self {
        self.treatment_site = site.into();
        self
    }

    pub fn with_template(mut self, template: ProtocolDocument) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_number_format(mut self, format: NumberFormat) -> Self {
        self.number_format = format;
        self
    }
}

/// A finished conversion
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    /// The populated, still unsealed document
    pub document: ProtocolDocument,
    /// The decomposed tables the document was built from
    pub tables: PrescriptionTables,
    pub fraction_count: u32,
    /// Review trail from translation (unrecognized parameters, skipped
    /// organ blocks)
    pub unrecognized: Vec<Diagnostic>,
}

/// Structure names in document order: target volumes first, then organs,
/// rows without a usable name skipped
fn structure_names(tables: &PrescriptionTables) -> Vec<&str> {
    tables
        .target_volumes
        .iter()
        .filter_map(|tv| tv.volume.as_deref())
        .chain(tables.organs.iter().filter_map(|o| o.organ.as_deref()))
        .collect()
}

/// Convert one prescription record into a populated protocol document
pub fn convert(request: &ConvertRequest) -> Result<ConvertOutcome> {
    let tables = decompose(&request.record, &request.decompose)?;
    let translation = translate(&tables)?;

    let names = structure_names(&tables);
    ensure_name_lengths(names.iter().copied())?;

    let mut document = request
        .template
        .clone()
        .unwrap_or_else(ProtocolDocument::template);

    let preview =
        PreviewSettings::new(request.protocol_id.as_str(), request.assigned_users.as_str())
            .with_treatment_site(request.treatment_site.as_str());
    match request.timestamp {
        Some(stamp) => document.set_preview_at(&preview, stamp)?,
        None => document.set_preview(&preview)?,
    }
    document.set_phase(request.protocol_id.as_str(), translation.fraction_count)?;

    for name in names {
        document.add_structure(&StructureSettings::new(name))?;
    }
    for entry in &translation.plan_objectives {
        document.append_plan_objective(entry, request.number_format)?;
    }
    for entry in &translation.quality_indices {
        document.append_quality_index(entry, request.number_format)?;
    }

    Ok(ConvertOutcome {
        document,
        tables,
        fraction_count: translation.fraction_count,
        unrecognized: translation.unrecognized,
    })
}
