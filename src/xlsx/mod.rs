//! Spreadsheet workbooks: quantity export and catalog import
//!
//! Worksheets are edited as XML trees inside the package; every part that is
//! not a worksheet or the workbook itself passes through untouched.

pub mod anchor_writer;
pub mod catalog_import;
pub mod macros;

pub use anchor_writer::{AnchorWriteReport, SheetLayout, WorkbookIdentity, write_quantities};
pub use catalog_import::{CatalogLayout, CatalogSheet, import_catalog};
pub use macros::{WorkbookMode, strip_macros};

use crate::error::{ExportError, Result};
use crate::ooxml::rels::{REL_OFFICE_DOCUMENT, resolve_target};
use crate::ooxml::{Package, Relationships};

pub const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// Main workbook part, from the package relationships
pub fn workbook_part(package: &Package) -> Result<String> {
    let rels = Relationships::load(package, "")?;
    let part = rels
        .targets_of_type(REL_OFFICE_DOCUMENT)
        .next()
        .map(|t| resolve_target("", t))
        .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string());
    if !package.contains(&part) {
        return Err(ExportError::MissingPart { part });
    }
    Ok(part)
}

/// `(sheet name, worksheet part)` in workbook order
pub fn sheet_parts(package: &Package) -> Result<Vec<(String, String)>> {
    let workbook = workbook_part(package)?;
    let doc = package.read_xml(&workbook)?;
    let rels = Relationships::load(package, &workbook)?;

    let Some(sheets) = doc.root.child("sheets") else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for sheet in sheets.children_named("sheet") {
        let (Some(name), Some(id)) = (sheet.attr("name"), sheet.attr("r:id")) else {
            continue;
        };
        match rels.target_of(id) {
            Some(target) => out.push((name.to_string(), resolve_target(&workbook, target))),
            None => log::warn!("Sheet {name:?} has no relationship {id}, skipping"),
        }
    }
    Ok(out)
}

/// Zero-based index of a column given in letters, `A` -> 0, `AA` -> 26
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters
        .chars()
        .try_fold(0u32, |acc, c| {
            let digit = c.to_ascii_uppercase();
            if !digit.is_ascii_uppercase() {
                return None;
            }
            acc.checked_mul(26)?.checked_add(digit as u32 - 'A' as u32 + 1)
        })
        .map(|n| n - 1)
}

/// Split `C4` into `("C", 4)`; rows are one-based
pub fn split_cell_ref(reference: &str) -> Option<(&str, u32)> {
    let digits = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, row) = reference.split_at(digits);
    column_index(letters)?;
    let row = row.parse::<u32>().ok().filter(|&r| r > 0)?;
    Some((letters, row))
}
