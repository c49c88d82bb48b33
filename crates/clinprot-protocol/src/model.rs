//! Typed protocol document model and its structural edit operations

use crate::reader;
use crate::serialize;
use chrono::NaiveDateTime;
use clinprot_diagnostics::{ClinProtError, Result};
use clinprot_translate::{NumberFormat, PlanObjectiveEntry, QualityIndexEntry, format_number};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The `Preview` header element
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preview {
    pub id: String,
    pub approval_status: String,
    pub treatment_site: String,
    pub assigned_users: String,
    pub last_modified: String,
    pub approval_history: String,
}

/// Caller-supplied preview fields; timestamp and approval history are
/// generated when the preview is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSettings {
    pub id: String,
    pub approval_status: String,
    pub treatment_site: String,
    pub assigned_users: String,
}

impl PreviewSettings {
    pub fn new(id: impl Into<String>, assigned_users: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            approval_status: "Unapproved".to_string(),
            treatment_site: String::new(),
            assigned_users: assigned_users.into(),
        }
    }

    pub fn with_treatment_site(mut self, site: impl Into<String>) -> Self {
        self.treatment_site = site.into();
        self
    }

    pub fn with_approval_status(mut self, status: impl Into<String>) -> Self {
        self.approval_status = status.into();
        self
    }
}

/// The `Identification` block of a structure; all fields but the volume type
/// stay empty in generated documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    pub volume_id: String,
    pub volume_code: String,
    pub volume_type: String,
    pub volume_code_table: String,
    pub structure_code: String,
}

impl Default for Identification {
    fn default() -> Self {
        Self {
            volume_id: String::new(),
            volume_code: String::new(),
            volume_type: "Organ".to_string(),
            volume_code_table: String::new(),
            structure_code: String::new(),
        }
    }
}

/// One `Structure` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub id: String,
    pub name: String,
    pub identification: Identification,
    pub type_index: i32,
    pub color_and_style: String,
    pub search_ct_low: i32,
    pub search_ct_high: i32,
    pub dvh_line_style: i32,
    pub dvh_line_color: i32,
    pub dvh_line_width: i32,
}

/// Display and search settings for a new structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureSettings {
    pub name: String,
    pub color_and_style: String,
    pub search_ct: i32,
    pub dvh_line_color: i32,
}

impl StructureSettings {
    /// Settings with the display defaults generated documents have always
    /// used ("Countour" spelling included, the planning system expects it)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color_and_style: "Countour - Brown".to_string(),
            search_ct: 1000,
            dvh_line_color: -16777216,
        }
    }

    pub fn with_color_and_style(mut self, color_and_style: impl Into<String>) -> Self {
        self.color_and_style = color_and_style.into();
        self
    }
}

/// One `Item` node: a plan objective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveItem {
    /// Structure the objective is keyed to
    pub id: String,
    pub primary: bool,
    pub item_type: i32,
    pub modifier: i32,
    /// Numeric fields are kept as document text so a re-serialized document
    /// reproduces the original bytes
    pub parameter: String,
    pub dose: String,
    pub total_dose: String,
}

/// One `MeasureItem` node: a quality index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureItem {
    pub id: String,
    pub item_type: i32,
    pub modifier: i32,
    pub value: String,
    pub type_specifier: String,
    pub absolute_units: bool,
}

/// The single `Phase` element with its prescription entries
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Phase {
    pub id: String,
    pub fraction_count: Option<u32>,
    pub objectives: Vec<ObjectiveItem>,
    pub measures: Vec<MeasureItem>,
}

/// A protocol document
///
/// Starts as an empty template, is populated through the edit methods and
/// becomes immutable once written out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolDocument {
    pub(crate) preview: Preview,
    pub(crate) structures: Vec<Structure>,
    pub(crate) phase: Phase,
    #[serde(skip)]
    pub(crate) sealed: bool,
}

impl ProtocolDocument {
    /// An empty skeleton with the fixed section layout
    pub fn template() -> Self {
        Self {
            preview: Preview::default(),
            structures: Vec::new(),
            phase: Phase::default(),
            sealed: false,
        }
    }

    /// Parse a template or produced document from XML text
    pub fn from_xml(xml: &str) -> Result<Self> {
        reader::parse_document(xml)
    }

    /// Read a document from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_xml(&text)
    }

    fn ensure_unsealed(&self) -> Result<()> {
        if self.sealed {
            Err(ClinProtError::DocumentSealed)
        } else {
            Ok(())
        }
    }

    /// Apply the preview header, stamping the current local time
    pub fn set_preview(&mut self, settings: &PreviewSettings) -> Result<()> {
        self.set_preview_at(settings, chrono::Local::now().naive_local())
    }

    /// Apply the preview header with an explicit timestamp
    pub fn set_preview_at(
        &mut self,
        settings: &PreviewSettings,
        timestamp: NaiveDateTime,
    ) -> Result<()> {
        self.ensure_unsealed()?;
        let stamp = timestamp.format(" %B %d %Y %H:%M:%S:%3f").to_string();
        self.preview = Preview {
            id: settings.id.clone(),
            approval_status: settings.approval_status.clone(),
            treatment_site: settings.treatment_site.clone(),
            assigned_users: settings.assigned_users.clone(),
            last_modified: stamp.clone(),
            approval_history: format!("{} Created [{} ]", settings.assigned_users, stamp),
        };
        Ok(())
    }

    /// Append a structure record with the fixed sub-field schema
    pub fn add_structure(&mut self, settings: &StructureSettings) -> Result<()> {
        self.ensure_unsealed()?;
        self.structures.push(Structure {
            id: settings.name.clone(),
            name: settings.name.clone(),
            identification: Identification::default(),
            type_index: 2,
            color_and_style: settings.color_and_style.clone(),
            search_ct_low: settings.search_ct,
            search_ct_high: settings.search_ct,
            dvh_line_style: 0,
            dvh_line_color: settings.dvh_line_color,
            dvh_line_width: 1,
        });
        Ok(())
    }

    /// Set the phase identifier and fraction count
    pub fn set_phase(&mut self, id: impl Into<String>, fraction_count: u32) -> Result<()> {
        self.ensure_unsealed()?;
        self.phase.id = id.into();
        self.phase.fraction_count = Some(fraction_count);
        Ok(())
    }

    /// Append a plan objective under the phase prescription
    pub fn append_plan_objective(
        &mut self,
        entry: &PlanObjectiveEntry,
        format: NumberFormat,
    ) -> Result<()> {
        self.ensure_unsealed()?;
        self.phase.objectives.push(ObjectiveItem {
            id: entry.structure_id.clone(),
            primary: entry.primary,
            item_type: 0,
            modifier: entry.modifier.code(),
            parameter: format_number(entry.parameter, format),
            dose: format_number(entry.dose_gy, format),
            total_dose: format_number(entry.total_dose_gy, format),
        });
        Ok(())
    }

    /// Append a quality index under the phase prescription
    pub fn append_quality_index(
        &mut self,
        entry: &QualityIndexEntry,
        format: NumberFormat,
    ) -> Result<()> {
        self.ensure_unsealed()?;
        self.phase.measures.push(MeasureItem {
            id: entry.structure_id.clone(),
            item_type: entry.index_type.code(),
            modifier: entry.modifier.code(),
            value: format_number(entry.value, format),
            type_specifier: format_number(entry.type_specifier, format),
            absolute_units: entry.absolute_units,
        });
        Ok(())
    }

    /// Copy one structure and its prescription entries from another document.
    ///
    /// The structure and quality indices are appended at the end of their
    /// sections; objectives land after the existing objective block, keeping
    /// the two entry blocks contiguous.
    pub fn amend(&mut self, source: &ProtocolDocument, structure_id: &str) -> Result<()> {
        self.ensure_unsealed()?;
        let structure = source
            .structures
            .iter()
            .find(|s| s.id == structure_id)
            .ok_or_else(|| ClinProtError::StructureNotFound {
                id: structure_id.to_string(),
            })?;
        self.structures.push(structure.clone());
        self.phase.objectives.extend(
            source
                .phase
                .objectives
                .iter()
                .filter(|item| item.id == structure_id)
                .cloned(),
        );
        self.phase.measures.extend(
            source
                .phase
                .measures
                .iter()
                .filter(|item| item.id == structure_id)
                .cloned(),
        );
        Ok(())
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    pub fn structure_names(&self) -> Vec<&str> {
        self.structures.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Number of plan-objective `Item` nodes
    pub fn item_count(&self) -> usize {
        self.phase.objectives.len()
    }

    /// Number of quality-index `MeasureItem` nodes
    pub fn measure_item_count(&self) -> usize {
        self.phase.measures.len()
    }

    /// Render the document as pretty-printed XML with declaration
    pub fn to_xml(&self) -> String {
        serialize::serialize_document(self)
    }

    /// Write the document out and seal it against further edits
    pub fn write_to_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_unsealed()?;
        std::fs::write(path, self.to_xml())?;
        self.sealed = true;
        Ok(())
    }
}
