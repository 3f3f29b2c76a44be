//! Macro-preserving and macro-stripped workbook output

use serde::{Deserialize, Serialize};

use super::workbook_part;
use crate::error::Result;
use crate::ooxml::rels::{REL_VBA_PROJECT, rels_part_for, resolve_target};
use crate::ooxml::{ContentTypes, Package, Relationships};

const VBA_CONTENT_TYPE: &str = "application/vnd.ms-office.vbaProject";
const WORKBOOK_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const PRINTER_SETTINGS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.printerSettings";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkbookMode {
    /// Keep the template's VBA project verbatim (`.xlsm`)
    #[default]
    MacroPreserving,
    /// Drop macros only; formatting, formulas, names and validation stay (`.xlsx`)
    MacroStripped,
}

impl WorkbookMode {
    pub fn extension(self) -> &'static str {
        match self {
            WorkbookMode::MacroPreserving => "xlsm",
            WorkbookMode::MacroStripped => "xlsx",
        }
    }
}

/// Remove the VBA project and everything that points at it
pub fn strip_macros(package: &mut Package) -> Result<()> {
    let workbook = workbook_part(package)?;
    let mut rels = Relationships::load(package, &workbook)?;
    let mut types = ContentTypes::load(package)?;

    let mut removed_parts = Vec::new();
    for target in rels.remove_type(REL_VBA_PROJECT) {
        let part = resolve_target(&workbook, &target);
        // Signatures hang off the project's own relationships
        let project_rels = Relationships::load(package, &part)?;
        for (_, signature) in project_rels.all() {
            removed_parts.push(resolve_target(&part, signature));
        }
        removed_parts.push(rels_part_for(&part));
        removed_parts.push(part);
    }

    let mut removed = 0;
    for part in &removed_parts {
        if package.remove_part(part) {
            log::debug!("Removed macro part {part}");
            removed += 1;
        }
        types.remove_override(part);
    }

    if types.default_of("bin") == Some(VBA_CONTENT_TYPE) {
        types.remove_default("bin");
        // Remaining binaries (printer settings) lose their default type
        let leftovers: Vec<String> = package
            .part_names()
            .filter(|name| name.ends_with(".bin"))
            .map(str::to_string)
            .collect();
        for part in leftovers {
            if types.override_of(&part).is_none() {
                types.set_override(&part, PRINTER_SETTINGS_CONTENT_TYPE);
            }
        }
    }

    if types
        .override_of(&workbook)
        .is_some_and(|t| t.contains("macroEnabled"))
    {
        types.set_override(&workbook, WORKBOOK_CONTENT_TYPE);
    }

    rels.store(package, &workbook)?;
    types.store(package)?;
    log::info!("Stripped macros: {removed} parts removed");
    Ok(())
}
