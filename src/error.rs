//! Error type for the export core
//!
//! Only fatal conditions surface here. Per-item problems (a missing control,
//! an out-of-range cell, a corrupt photo) are logged and skipped where they occur.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort an export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("template not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("template unreadable: {}", path.display())]
    TemplateUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("package part missing: {part}")]
    MissingPart { part: String },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("xml error in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document sections out of order: {to} cannot follow {from}")]
    StageOrder {
        from: &'static str,
        to: &'static str,
    },
}

impl ExportError {
    pub(crate) fn xml(part: &str, message: impl std::fmt::Display) -> Self {
        ExportError::Xml {
            part: part.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
