//! One-time import of catalog anchors from the product catalog workbook
//!
//! Cells are read through calamine; only the writing path edits package XML.

use std::io::{Read, Seek};

use calamine::{Data, Range, Reader, Xlsx, open_workbook_from_rs};
use serde::{Deserialize, Serialize};

use super::column_index;
use crate::domain::{CatalogAnchor, CatalogEntry, CatalogSection};
use crate::error::Result;

/// Catalog sheet and the section its rows belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSheet {
    pub name: String,
    /// Fixed section, or `None` to classify each row by its ordering source
    #[serde(default)]
    pub section: Option<CatalogSection>,
}

/// Where catalog data sits in the workbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogLayout {
    /// First data row, one-based
    #[serde(default = "default_data_start_row")]
    pub data_start_row: u32,
    #[serde(default = "default_code_column")]
    pub code_column: String,
    #[serde(default = "default_description_column")]
    pub description_column: String,
    /// "Source of ordering" column that separates services from products
    #[serde(default = "default_source_column")]
    pub source_column: String,
    #[serde(default = "default_service_marker")]
    pub service_marker: String,
    /// Codes that are section notes rather than products
    #[serde(default = "default_skip_codes")]
    pub skip_codes: Vec<String>,
    #[serde(default = "default_sheets")]
    pub sheets: Vec<CatalogSheet>,
}

fn default_data_start_row() -> u32 {
    11
}

fn default_code_column() -> String {
    "B".into()
}

fn default_description_column() -> String {
    "C".into()
}

fn default_source_column() -> String {
    "K".into()
}

fn default_service_marker() -> String {
    "TI contractor".into()
}

fn default_skip_codes() -> Vec<String> {
    vec!["MATERIAL PROVIDED BY SUBCO".into()]
}

fn default_sheets() -> Vec<CatalogSheet> {
    vec![
        CatalogSheet {
            name: "BoQ".into(),
            section: None,
        },
        CatalogSheet {
            name: "BoM Griptel".into(),
            section: Some(CatalogSection::Griptel),
        },
        CatalogSheet {
            name: "BoM Solar".into(),
            section: Some(CatalogSection::Solar),
        },
    ]
}

impl Default for CatalogLayout {
    fn default() -> Self {
        Self {
            data_start_row: default_data_start_row(),
            code_column: default_code_column(),
            description_column: default_description_column(),
            source_column: default_source_column(),
            service_marker: default_service_marker(),
            skip_codes: default_skip_codes(),
            sheets: default_sheets(),
        }
    }
}

fn data_text(value: &Data) -> String {
    match value {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Trimmed text at zero-based `(row, column)`, `None` when blank
fn cell_text(range: &Range<Data>, row: u32, column: Option<u32>) -> Option<String> {
    let text = data_text(range.get_value((row, column?))?);
    (!text.is_empty()).then_some(text)
}

/// Read every catalog row of the configured sheets, in sheet then row order
pub fn import_catalog<RS: Read + Seek>(source: RS, layout: &CatalogLayout) -> Result<Vec<CatalogEntry>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(source)?;
    let sheet_names = workbook.sheet_names();
    let code_col = column_index(&layout.code_column);
    let description_col = column_index(&layout.description_column);
    let source_col = column_index(&layout.source_column);

    let mut entries = Vec::new();
    for sheet in &layout.sheets {
        if !sheet_names.contains(&sheet.name) {
            log::info!("Catalog sheet {:?} not in workbook, skipping", sheet.name);
            continue;
        }
        let range = workbook.worksheet_range(&sheet.name)?;
        let (Some(start), Some(end)) = (range.start(), range.end()) else {
            continue;
        };

        let before = entries.len();
        let first_row = start.0.max(layout.data_start_row.saturating_sub(1));
        for row in first_row..=end.0 {
            let Some(code) = cell_text(&range, row, code_col) else {
                continue;
            };
            if layout.skip_codes.iter().any(|s| s.eq_ignore_ascii_case(&code)) {
                continue;
            }

            let section = sheet.section.unwrap_or_else(|| {
                let is_service = cell_text(&range, row, source_col)
                    .is_some_and(|s| s.eq_ignore_ascii_case(&layout.service_marker));
                if is_service {
                    CatalogSection::Service
                } else {
                    CatalogSection::Product
                }
            });
            entries.push(CatalogEntry {
                anchor: CatalogAnchor {
                    sheet_name: sheet.name.clone(),
                    row_index: row + 1,
                    product_code: code,
                },
                description: cell_text(&range, row, description_col).unwrap_or_default(),
                section,
            });
        }
        log::info!("Catalog sheet {}: {} rows imported", sheet.name, entries.len() - before);
    }
    Ok(entries)
}
