//! Patch fixed table cells of templates that carry no controls there

use super::PatchReport;
use super::run_writer::{RunStyle, W_P, W_PPR, W_R, make_run};
use crate::domain::{FieldMap, SurveyRecord, Target};
use crate::ooxml::Element;

pub const W_TBL: &str = "w:tbl";
pub const W_TR: &str = "w:tr";
pub const W_TC: &str = "w:tc";

fn grid_span(tc: &Element) -> usize {
    tc.child("w:tcPr")
        .and_then(|pr| pr.child("w:gridSpan"))
        .and_then(|g| g.attr("w:val"))
        .and_then(|v| v.parse().ok())
        .unwrap_or(1usize)
        .max(1)
}

/// The `w:tc` covering grid column `col` of `row`; merged cells cover every column they span
pub fn cell_at(row: &mut Element, col: usize) -> Option<&mut Element> {
    let mut first_column = 0;
    for tc in row.children_named_mut(W_TC) {
        let span = grid_span(tc);
        if col < first_column + span {
            return Some(tc);
        }
        first_column += span;
    }
    None
}

/// Body-level table cell at `(table, row, col)`, all zero-based
pub fn locate_cell(root: &mut Element, table: usize, row: usize, col: usize) -> Option<&mut Element> {
    let body = root.child_mut("w:body")?;
    let tbl = body.children_named_mut(W_TBL).nth(table)?;
    let tr = tbl.children_named_mut(W_TR).nth(row)?;
    cell_at(tr, col)
}

/// Replace a cell's content with `text`, keeping the first run's formatting
pub fn set_cell_text(cell: &mut Element, text: &str) {
    let style = cell
        .child(W_P)
        .and_then(|p| p.child(W_R))
        .map(RunStyle::of_run)
        .unwrap_or_default();

    for paragraph in cell.children_named_mut(W_P) {
        paragraph.retain_elements(|e| e.name == W_PPR);
    }
    if cell.position_of(W_P).is_none() {
        cell.push(Element::new(W_P));
    }
    if let Some(first) = cell.child_mut(W_P) {
        first.push(make_run(text, &style));
    }
}

/// Write every positional entry of `map` into the document rooted at `root`
pub fn patch_cells(root: &mut Element, map: &FieldMap, record: &SurveyRecord) -> PatchReport {
    let mut report = PatchReport::default();
    for entry in map.entries() {
        let Target::PositionalCell { table, row, col } = entry.target else {
            continue;
        };
        let Some(cell) = locate_cell(root, table, row, col) else {
            log::debug!("Cell ({table}, {row}, {col}) for {} outside template tables, skipping", entry.source);
            report.skipped.push(format!("cell ({table}, {row}, {col})"));
            continue;
        };
        set_cell_text(cell, &entry.resolve(record));
        report.written += 1;
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::run_writer::visible_text;
    use crate::domain::{FieldId, FieldMapEntry};
    use crate::ooxml::XmlDocument;
    use crate::ooxml::fixtures::W_NS;

    fn row(cells: &[&str]) -> String {
        let tcs: String = cells.iter().map(|c| format!("<w:tc>{c}</w:tc>")).collect();
        format!("<w:tr>{tcs}</w:tr>")
    }

    fn document(tables: &[Vec<String>]) -> Element {
        let body: String = tables
            .iter()
            .map(|rows| format!("<w:tbl>{}</w:tbl>", rows.concat()))
            .collect();
        let xml = format!(r#"<w:document {W_NS}><w:body>{body}</w:body></w:document>"#);
        XmlDocument::parse("word/document.xml", xml.as_bytes()).unwrap().root
    }

    #[test]
    fn test_cell_keeps_first_run_style() {
        let styled = r#"<w:p><w:pPr><w:jc w:val="left"/></w:pPr><w:r><w:rPr><w:b/><w:sz w:val="18"/></w:rPr><w:t>Site Owner:</w:t></w:r><w:r><w:t> old</w:t></w:r></w:p><w:p><w:r><w:t>more</w:t></w:r></w:p>"#;
        let mut root = document(&[vec![row(&["<w:p/>"]), row(&[styled])]]);
        let map = FieldMap::new(vec![
            FieldMapEntry::cell(FieldId::SiteOwner, 0, 1, 0).with_prefix("Site Owner: "),
        ]);
        let record = SurveyRecord::new().with(FieldId::SiteOwner, "Norkring");

        let report = patch_cells(&mut root, &map, &record);
        assert_eq!(report.written, 1);

        let cell = locate_cell(&mut root, 0, 1, 0).unwrap();
        assert_eq!(visible_text(cell).trim_end(), "Site Owner: Norkring");
        let first = cell.child(W_P).unwrap();
        assert!(first.child(W_PPR).is_some());
        assert_eq!(first.children_named(W_R).count(), 1);
        let style = RunStyle::of_run(first.child(W_R).unwrap());
        assert_eq!(style.bold, Some(true));
        assert_eq!(style.size, Some(18));
    }

    #[test]
    fn test_out_of_range_is_skipped() {
        let mut root = document(&[vec![row(&["<w:p/>", "<w:p/>"])]]);
        let before = root.clone();
        let map = FieldMap::new(vec![
            FieldMapEntry::cell(FieldId::Customer, 0, 3, 1),
            FieldMapEntry::cell(FieldId::Customer, 0, 0, 2),
            FieldMapEntry::cell(FieldId::Customer, 4, 0, 0),
        ]);
        let record = SurveyRecord::new().with(FieldId::Customer, "ICE");
        let report = patch_cells(&mut root, &map, &record);
        assert_eq!(report.written, 0);
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(root, before);
    }

    #[test]
    fn test_merged_cell_covers_spanned_columns() {
        let merged = r#"<w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p/>"#;
        let mut root = document(&[vec![row(&[merged, "<w:p/>"])]]);
        let map = FieldMap::new(vec![FieldMapEntry::cell(FieldId::Customer, 0, 0, 2)]);
        let record = SurveyRecord::new().with(FieldId::Customer, "Telia");
        patch_cells(&mut root, &map, &record);
        let tr = root.find(W_TR).unwrap();
        let last = tr.children_named(W_TC).nth(1).unwrap();
        assert_eq!(visible_text(last), "Telia");
    }

    #[test]
    fn test_gated_cell_is_blank() {
        let rows: Vec<String> = (0..12)
            .map(|_| row(&["<w:p/>", "<w:p><w:r><w:t>old</w:t></w:r></w:p>"]))
            .collect();
        let mut root = document(&[rows]);
        let map = FieldMap::legacy();
        let record = SurveyRecord::new().with(FieldId::IloqDetails, "X");
        patch_cells(&mut root, &map, &record);
        let cell = locate_cell(&mut root, 0, 11, 1).unwrap();
        assert_eq!(visible_text(cell), "");
    }
}
