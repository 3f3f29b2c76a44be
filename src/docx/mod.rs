//! Word-processing documents: patching templates and building new ones
//!
//! - `run_writer`: formatting-preserving text replacement
//! - `sdt`: tagged content controls
//! - `cells`: fixed table cells
//! - `drawing`: inline picture embedding
//! - `modern`: template built from scratch
//! - `assembler`: appended sections (planned works, photos, as-built)

pub mod assembler;
pub mod cells;
pub mod drawing;
pub mod modern;
pub mod run_writer;
pub mod sdt;

pub use assembler::{AppendixLayout, DocumentAssembler, Stage};
pub use modern::ModernTemplateBuilder;

use crate::domain::{FieldMap, SurveyRecord};
use crate::ooxml::Element;

/// Outcome of patching one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Controls or cells written
    pub written: usize,
    /// Locations that were not found, one entry each
    pub skipped: Vec<String>,
}

impl PatchReport {
    pub fn merge(&mut self, other: PatchReport) {
        self.written += other.written;
        self.skipped.extend(other.skipped);
    }
}

/// Run both patchers over a template's main document
pub fn patch_template(root: &mut Element, map: &FieldMap, record: &SurveyRecord) -> PatchReport {
    let mut report = sdt::patch_controls(root, map, record);
    report.merge(cells::patch_cells(root, map, record));
    log::info!(
        "Template patched: {} locations written, {} skipped",
        report.written,
        report.skipped.len()
    );
    report
}
