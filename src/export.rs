//! Export operations: one job in, one document buffer and its filename out
//!
//! Jobs are plain data handed over by the caller. The version counter is read
//! from the job and returned incremented after an as-built export; persisting it
//! is the caller's business.

use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::config::ExportConfig;
use crate::docx::{DocumentAssembler, ModernTemplateBuilder};
use crate::domain::{
    Catalog, CatalogEntry, DocumentKind, ExportVersionCounter, FieldId, Phase, PhotoRecord, PlannedWorks,
    QuantityLine, SurveyRecord, export_filename,
};
use crate::error::Result;
use crate::ooxml::Package;
use crate::xlsx::{self, WorkbookIdentity, WorkbookMode};

/// Which survey template a document starts from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateChoice {
    /// Patch the configured legacy template
    #[default]
    Legacy,
    /// Generate the modern form
    Modern,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SurveyJob {
    #[serde(default)]
    pub record: SurveyRecord,
    /// Used for the filename when the record has no site id
    #[serde(default)]
    pub project_site_id: Option<String>,
    #[serde(default)]
    pub photos: Vec<PhotoRecord>,
    #[serde(default)]
    pub planned_works: PlannedWorks,
    #[serde(default)]
    pub deviations: Option<String>,
    #[serde(default)]
    pub template: TemplateChoice,
    #[serde(default)]
    pub as_built: bool,
    #[serde(default)]
    pub version: ExportVersionCounter,
    /// Report date, today when absent
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl SurveyJob {
    fn identifier(&self) -> String {
        let site_id = self.record.text(FieldId::SiteId);
        if !site_id.trim().is_empty() {
            return site_id;
        }
        self.project_site_id.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkbookJob {
    #[serde(default)]
    pub site_id: String,
    #[serde(default)]
    pub site_name: String,
    /// Computed requirements, addressed by product code
    #[serde(default)]
    pub lines: Vec<QuantityLine>,
    /// Anchors recorded by the catalog import
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
    #[serde(default)]
    pub mode: WorkbookMode,
    #[serde(default)]
    pub as_built: bool,
    #[serde(default)]
    pub version: ExportVersionCounter,
}

/// A finished export
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub filename: String,
    /// Counter the caller should persist
    pub version: ExportVersionCounter,
}

fn next_version(as_built: bool, current: ExportVersionCounter) -> ExportVersionCounter {
    if as_built { current.next() } else { current }
}

/// Build the survey report for `job`
pub fn export_survey_document(config: &ExportConfig, job: &SurveyJob) -> Result<ExportOutput> {
    let date = job.date.unwrap_or_else(|| Local::now().date_naive());

    let mut document = match job.template {
        TemplateChoice::Legacy => DocumentAssembler::open_legacy(
            &config.legacy_template,
            &config.field_map,
            &job.record,
            &config.appendix,
            &config.palette,
        )?,
        TemplateChoice::Modern => {
            let package = ModernTemplateBuilder::new(date).with_record(&job.record).build()?;
            DocumentAssembler::from_package(package, &config.appendix, &config.palette)?
        }
    };

    let planning: Vec<PhotoRecord> = job
        .photos
        .iter()
        .filter(|p| p.phase == Phase::Planning)
        .cloned()
        .collect();

    document.planned_works(&job.planned_works)?;
    document.photo_appendix(&planning)?;
    if job.as_built {
        document.as_built(date, job.deviations.as_deref(), &job.photos)?;
    }
    let bytes = document.finish()?;

    let version = next_version(job.as_built, job.version);
    let filename = export_filename(
        &job.identifier(),
        DocumentKind::Tssr,
        job.as_built.then_some(version),
        "docx",
    );
    log::info!("Survey document {filename} exported ({} bytes)", bytes.len());
    Ok(ExportOutput {
        bytes,
        filename,
        version,
    })
}

/// Fill the quantity workbook template for `job`
pub fn export_quantity_workbook(config: &ExportConfig, job: &WorkbookJob) -> Result<ExportOutput> {
    let mut package = Package::open(&config.workbook_template)?;

    let catalog = Catalog::new(job.catalog.clone());
    let anchored = catalog.anchor_lines(&job.lines);
    let identity = WorkbookIdentity {
        site_id: job.site_id.clone(),
        site_name: job.site_name.clone(),
    };
    let report = xlsx::write_quantities(&mut package, &config.sheet_layout, &identity, &anchored)?;
    if report.unknown_sheet > 0 {
        log::warn!("{} quantity lines point outside the data sheets", report.unknown_sheet);
    }

    if job.mode == WorkbookMode::MacroStripped {
        xlsx::strip_macros(&mut package)?;
    }
    let bytes = package.to_bytes()?;

    let version = next_version(job.as_built, job.version);
    let filename = export_filename(
        &job.site_id,
        DocumentKind::Boq,
        job.as_built.then_some(version),
        job.mode.extension(),
    );
    log::info!("Quantity workbook {filename} exported ({} bytes)", bytes.len());
    Ok(ExportOutput {
        bytes,
        filename,
        version,
    })
}
