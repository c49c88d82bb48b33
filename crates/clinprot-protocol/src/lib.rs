//! Clinical protocol document handling
//!
//! A typed model of the planning system's protocol XML, a reader for template
//! and produced documents, and a stable pretty-printing writer. The document
//! goes through three states: template (empty sections), populated (preview,
//! phase, structures and prescription entries applied) and serialized. The
//! serialized state is terminal; a written document refuses further edits.

mod model;
mod reader;
mod serialize;

pub use model::{
    Identification, MeasureItem, ObjectiveItem, Phase, Preview, PreviewSettings, ProtocolDocument,
    Structure, StructureSettings,
};
