//! Survey report and quantity workbook export
//!
//! Fills office templates from survey data: tagged controls and fixed table
//! cells in the survey report, anchored quantity cells in the macro workbook,
//! plus planned works, annotated photos and as-built sections appended to
//! the report.

pub mod config;
pub mod docx;
pub mod domain;
pub mod error;
pub mod export;
pub mod ooxml;
pub mod render;
pub mod xlsx;

pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use export::{ExportOutput, SurveyJob, TemplateChoice, WorkbookJob, export_quantity_workbook, export_survey_document};
