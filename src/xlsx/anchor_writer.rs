//! Write quantities into a workbook template at catalog anchors
//!
//! Anchors are addresses recorded at catalog import. This writer only ever
//! fills cells at those addresses and at the identity header cells. Rows are
//! never shifted, and styles of the touched cells are kept.

use serde::{Deserialize, Serialize};

use super::{column_index, sheet_parts, split_cell_ref, workbook_part};
use crate::domain::AnchoredQuantity;
use crate::error::Result;
use crate::ooxml::rels::{REL_CALC_CHAIN, resolve_target};
use crate::ooxml::{ContentTypes, Element, Node, Package, Relationships};

/// Where the writer puts things on each data sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetLayout {
    /// Sheets that receive identity and quantities; all others pass through
    #[serde(default = "default_data_sheets")]
    pub data_sheets: Vec<String>,
    #[serde(default = "default_site_id_cell")]
    pub site_id_cell: String,
    #[serde(default = "default_site_name_cell")]
    pub site_name_cell: String,
    #[serde(default = "default_quantity_column")]
    pub quantity_column: String,
    #[serde(default = "default_actual_quantity_column")]
    pub actual_quantity_column: String,
    #[serde(default = "default_actual_comment_column")]
    pub actual_comment_column: String,
}

fn default_data_sheets() -> Vec<String> {
    ["BoQ", "BoM Griptel", "BoM Solar"].map(String::from).to_vec()
}

fn default_site_id_cell() -> String {
    "C4".into()
}

fn default_site_name_cell() -> String {
    "C5".into()
}

fn default_quantity_column() -> String {
    "D".into()
}

fn default_actual_quantity_column() -> String {
    "F".into()
}

fn default_actual_comment_column() -> String {
    "G".into()
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            data_sheets: default_data_sheets(),
            site_id_cell: default_site_id_cell(),
            site_name_cell: default_site_name_cell(),
            quantity_column: default_quantity_column(),
            actual_quantity_column: default_actual_quantity_column(),
            actual_comment_column: default_actual_comment_column(),
        }
    }
}

/// Project identity written to the header cells of every data sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookIdentity {
    pub site_id: String,
    pub site_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorWriteReport {
    /// Cells written, identity cells included
    pub cells_written: usize,
    /// Lines skipped because their quantity was not positive
    pub not_required: usize,
    /// Lines whose sheet is not a data sheet of the template
    pub unknown_sheet: usize,
    /// Cells whose formula was replaced by a value
    pub formulas_replaced: usize,
}

enum CellValue<'a> {
    Number(f64),
    Text(&'a str),
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn row_number(row: &Element) -> Option<u32> {
    row.attr("r")?.parse().ok()
}

fn cell_column(cell: &Element) -> Option<u32> {
    let (letters, _) = split_cell_ref(cell.attr("r")?)?;
    column_index(letters)
}

/// Insert `child` before the first element child matching `after`, or at the end
fn insert_ordered(parent: &mut Element, child: Element, after: impl Fn(&Element) -> bool) {
    let position = parent
        .children
        .iter()
        .position(|n| matches!(n, Node::Element(e) if after(e)))
        .unwrap_or(parent.children.len());
    parent.insert(position, child);
}

/// Existing or newly inserted `<row r="row">`, keeping rows sorted
fn row_mut(sheet_data: &mut Element, row: u32) -> Option<&mut Element> {
    if !sheet_data.children_named("row").any(|r| row_number(r) == Some(row)) {
        insert_ordered(sheet_data, Element::new("row").with_attr("r", row.to_string()), |e| {
            e.name == "row" && row_number(e).is_some_and(|r| r > row)
        });
    }
    sheet_data
        .children_named_mut("row")
        .find(|r| row_number(r) == Some(row))
}

/// Shared-formula group id when `cell` holds the master of that group
fn shared_master_id(cell: &Element) -> Option<String> {
    let f = cell.child("f")?;
    (f.attr("t") == Some("shared") && f.attr("ref").is_some())
        .then(|| f.attr("si").map(str::to_string))
        .flatten()
}

/// Freeze the cells that borrowed their formula from a removed master; returns how many
fn detach_shared_dependents(sheet_data: &mut Element, si: &str) -> usize {
    let mut frozen = 0;
    for row in sheet_data.children_named_mut("row") {
        for cell in row.children_named_mut("c") {
            let dependent = cell
                .child("f")
                .is_some_and(|f| f.attr("t") == Some("shared") && f.attr("si") == Some(si));
            if dependent {
                cell.retain_elements(|e| e.name != "f");
                frozen += 1;
            }
        }
    }
    if frozen > 0 {
        log::debug!("Shared formula {si} lost its master, {frozen} cells keep their cached values");
    }
    frozen
}

/// Write `value` into `column`/`row`; returns how many cells lost a formula
fn write_cell(sheet_data: &mut Element, column: &str, row: u32, value: CellValue<'_>) -> usize {
    let Some(col) = column_index(column) else {
        log::warn!("Invalid column {column:?}, skipping");
        return 0;
    };
    let reference = format!("{}{row}", column.to_ascii_uppercase());
    let Some(row_el) = row_mut(sheet_data, row) else {
        return 0;
    };
    // Cached spans would no longer cover a new cell
    row_el.remove_attr("spans");

    if !row_el.children_named("c").any(|c| c.attr("r") == Some(reference.as_str())) {
        insert_ordered(row_el, Element::new("c").with_attr("r", reference.as_str()), |e| {
            e.name == "c" && cell_column(e).is_some_and(|c| c > col)
        });
    }
    let Some(cell) = row_el
        .children_named_mut("c")
        .find(|c| c.attr("r") == Some(reference.as_str()))
    else {
        return 0;
    };

    let had_formula = cell.child("f").is_some();
    let master_of = shared_master_id(cell);
    cell.retain_elements(|e| !matches!(e.name.as_str(), "f" | "v" | "is"));
    match value {
        CellValue::Number(n) => {
            cell.remove_attr("t");
            cell.push(Element::new("v").with_text(format_number(n)));
        }
        CellValue::Text(text) => {
            cell.set_attr("t", "inlineStr");
            cell.push(
                Element::new("is").with_child(
                    Element::new("t")
                        .with_attr("xml:space", "preserve")
                        .with_text(text),
                ),
            );
        }
    }

    let dependents = master_of.map_or(0, |si| detach_shared_dependents(sheet_data, &si));
    usize::from(had_formula) + dependents
}

/// Fill identity and quantities into the data sheets of `package`
pub fn write_quantities(
    package: &mut Package,
    layout: &SheetLayout,
    identity: &WorkbookIdentity,
    lines: &[AnchoredQuantity],
) -> Result<AnchorWriteReport> {
    let mut report = AnchorWriteReport::default();
    let sheets: Vec<(String, String)> = sheet_parts(package)?
        .into_iter()
        .filter(|(name, _)| layout.data_sheets.contains(name))
        .collect();

    for line in lines {
        if line.quantity <= 0.0 {
            report.not_required += 1;
        }
        if !sheets.iter().any(|(name, _)| *name == line.anchor.sheet_name) {
            log::info!(
                "Anchor {}!{} for {} is not on a data sheet, skipping",
                line.anchor.sheet_name,
                line.anchor.row_index,
                line.anchor.product_code
            );
            report.unknown_sheet += 1;
        }
    }

    for (name, part) in &sheets {
        let mut doc = package.read_xml(part)?;
        let sheet_data = doc.root.child_or_insert("sheetData", 0);
        let mut replaced = 0;

        for (cell, value) in [
            (&layout.site_id_cell, &identity.site_id),
            (&layout.site_name_cell, &identity.site_name),
        ] {
            if value.is_empty() {
                continue;
            }
            let Some((column, row)) = split_cell_ref(cell) else {
                log::warn!("Invalid identity cell {cell:?}, skipping");
                continue;
            };
            replaced += write_cell(sheet_data, column, row, CellValue::Text(value));
            report.cells_written += 1;
        }

        for line in lines.iter().filter(|l| l.anchor.sheet_name == *name) {
            let row = line.anchor.row_index;
            if row == 0 {
                log::warn!("Anchor for {} has no row, skipping", line.anchor.product_code);
                continue;
            }
            if line.quantity > 0.0 {
                replaced += write_cell(
                    sheet_data,
                    &layout.quantity_column,
                    row,
                    CellValue::Number(line.quantity),
                );
                report.cells_written += 1;
            }
            if let Some(actual) = line.actual_quantity {
                replaced += write_cell(
                    sheet_data,
                    &layout.actual_quantity_column,
                    row,
                    CellValue::Number(actual),
                );
                report.cells_written += 1;
            }
            if let Some(comment) = line.actual_comment.as_deref().filter(|c| !c.is_empty()) {
                replaced += write_cell(
                    sheet_data,
                    &layout.actual_comment_column,
                    row,
                    CellValue::Text(comment),
                );
                report.cells_written += 1;
            }
        }

        log::debug!("Sheet {name}: {replaced} formulas replaced");
        report.formulas_replaced += replaced;
        package.write_xml(part, &doc)?;
    }

    request_recalculation(package, report.formulas_replaced > 0)?;
    log::info!(
        "Workbook filled: {} cells written, {} lines not required",
        report.cells_written,
        report.not_required
    );
    Ok(report)
}

/// Workbook children that must follow `calcPr`
const CALC_PR_SUCCESSORS: &[&str] = &[
    "oleSize",
    "customWorkbookViews",
    "pivotCaches",
    "smartTagPr",
    "smartTagTypes",
    "webPublishing",
    "fileRecoveryPr",
    "webPublishObjects",
    "extLst",
];

/// Flag the workbook for full recalculation; drop the calc chain when cells lost formulas
fn request_recalculation(package: &mut Package, drop_calc_chain: bool) -> Result<()> {
    let workbook = workbook_part(package)?;
    let mut doc = package.read_xml(&workbook)?;
    let index = doc
        .root
        .children
        .iter()
        .position(|n| matches!(n, Node::Element(e) if CALC_PR_SUCCESSORS.contains(&e.name.as_str())))
        .unwrap_or(doc.root.children.len());
    doc.root
        .child_or_insert("calcPr", index)
        .set_attr("fullCalcOnLoad", "1");
    package.write_xml(&workbook, &doc)?;

    if !drop_calc_chain {
        return Ok(());
    }
    let mut rels = Relationships::load(package, &workbook)?;
    let removed = rels.remove_type(REL_CALC_CHAIN);
    if removed.is_empty() {
        return Ok(());
    }
    let mut types = ContentTypes::load(package)?;
    for target in removed {
        let part = resolve_target(&workbook, &target);
        package.remove_part(&part);
        types.remove_override(&part);
        log::debug!("Dropped calculation chain {part}");
    }
    rels.store(package, &workbook)?;
    types.store(package)?;
    Ok(())
}
