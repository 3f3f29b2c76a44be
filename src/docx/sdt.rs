//! Patch tagged structured document controls (`w:sdt`)

use std::collections::BTreeMap;

use super::PatchReport;
use super::run_writer::write_text;
use crate::domain::{FieldMap, SurveyRecord, Target};
use crate::ooxml::{Element, NodePath};

pub const W_SDT: &str = "w:sdt";
pub const W_SDT_PR: &str = "w:sdtPr";
pub const W_SDT_CONTENT: &str = "w:sdtContent";

/// Tag of a control, from `w:sdtPr/w:tag/@w:val`
pub fn control_tag(sdt: &Element) -> Option<&str> {
    sdt.child(W_SDT_PR)?
        .child("w:tag")?
        .attr("w:val")
        .filter(|t| !t.is_empty())
}

/// Every tagged control of one document, keyed by tag
///
/// Derived from the tree it was built on; build a new one per document.
#[derive(Debug, Default)]
pub struct ControlIndex {
    by_tag: BTreeMap<String, Vec<NodePath>>,
}

impl ControlIndex {
    pub fn build(root: &Element) -> Self {
        let mut by_tag: BTreeMap<String, Vec<NodePath>> = BTreeMap::new();
        for path in root.paths_of(W_SDT) {
            if let Some(tag) = root.at_path(&path).and_then(control_tag) {
                by_tag.entry(tag.to_string()).or_default().push(path);
            }
        }
        Self { by_tag }
    }

    pub fn paths(&self, tag: &str) -> &[NodePath] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }
}

/// Set the visible text of one control
///
/// Dropdown and combo-box controls are written the same way: the shown text
/// changes, the list of choices does not.
pub fn set_control_text(sdt: &mut Element, value: &str) {
    if let Some(content) = sdt.child_mut(W_SDT_CONTENT) {
        write_text(content, value);
    }
    if !value.is_empty()
        && let Some(pr) = sdt.child_mut(W_SDT_PR)
    {
        pr.retain_elements(|e| e.name != "w:showingPlcHdr");
    }
}

/// Write every tagged entry of `map` into the document rooted at `root`
pub fn patch_controls(root: &mut Element, map: &FieldMap, record: &SurveyRecord) -> PatchReport {
    let index = ControlIndex::build(root);
    let mut report = PatchReport::default();

    for entry in map.entries() {
        let Target::Tag { tag } = &entry.target else {
            continue;
        };
        let paths = index.paths(tag);
        if paths.is_empty() {
            log::debug!("Control tag {tag:?} not present in template, skipping");
            report.skipped.push(format!("tag {tag}"));
            continue;
        }

        let value = entry.resolve(record);
        for path in paths {
            match root.at_path_mut(path) {
                Some(sdt) if sdt.name == W_SDT && control_tag(&*sdt) == Some(tag.as_str()) => {
                    set_control_text(sdt, &value);
                    report.written += 1;
                }
                _ => {
                    log::warn!("Control {tag:?} moved while patching an enclosing control, skipping");
                    report.skipped.push(format!("tag {tag}"));
                }
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::run_writer::{RunStyle, visible_text};
    use crate::domain::{FieldId, FieldMapEntry};
    use crate::ooxml::XmlDocument;
    use crate::ooxml::fixtures::W_NS;

    fn document(body: &str) -> Element {
        let xml = format!(r#"<w:document {W_NS}><w:body>{body}</w:body></w:document>"#);
        XmlDocument::parse("word/document.xml", xml.as_bytes()).unwrap().root
    }

    fn sdt(tag: &str, inner: &str) -> String {
        format!(
            r#"<w:sdt><w:sdtPr><w:tag w:val="{tag}"/><w:showingPlcHdr/></w:sdtPr><w:sdtContent>{inner}</w:sdtContent></w:sdt>"#
        )
    }

    fn control_text(root: &Element, tag: &str) -> String {
        let index = ControlIndex::build(root);
        let sdt = root.at_path(&index.paths(tag)[0]).unwrap();
        visible_text(sdt.child(W_SDT_CONTENT).unwrap())
    }

    #[test]
    fn test_patch_roundtrip_keeps_run_style() {
        let styled = r#"<w:p><w:r><w:rPr><w:b/><w:i/><w:color w:val="1E40AF"/><w:sz w:val="22"/></w:rPr><w:t>Click here</w:t></w:r></w:p>"#;
        let mut root = document(&sdt("SiteName", styled));
        let map = FieldMap::new(vec![FieldMapEntry::tag(FieldId::SiteName, "SiteName")]);
        let record = SurveyRecord::new().with(FieldId::SiteName, "Tower A");

        let report = patch_controls(&mut root, &map, &record);
        assert_eq!(report.written, 1);
        assert_eq!(control_text(&root, "SiteName"), "Tower A");

        let run = root.find("w:r").unwrap();
        let style = RunStyle::of_run(run);
        assert_eq!(style.bold, Some(true));
        assert_eq!(style.italic, Some(true));
        assert_eq!(style.color.as_deref(), Some("1E40AF"));
        assert_eq!(style.size, Some(22));
        assert!(root.find("w:showingPlcHdr").is_none());
    }

    #[test]
    fn test_patch_is_idempotent() {
        let mut root = document(&sdt("SiteID", "<w:r><w:t>a</w:t></w:r><w:r><w:t>b</w:t></w:r>"));
        let map = FieldMap::new(vec![FieldMapEntry::tag(FieldId::SiteId, "SiteID")]);
        let record = SurveyRecord::new().with(FieldId::SiteId, "OSL-1234");
        patch_controls(&mut root, &map, &record);
        let once = root.clone();
        patch_controls(&mut root, &map, &record);
        assert_eq!(root, once);
    }

    #[test]
    fn test_every_control_with_tag_is_written() {
        let body = format!(
            "<w:p>{}</w:p><w:p>{}</w:p>",
            sdt("SiteName", "<w:r><w:t>x</w:t></w:r>"),
            sdt("SiteName", "<w:r><w:t>y</w:t></w:r>")
        );
        let mut root = document(&body);
        let map = FieldMap::new(vec![FieldMapEntry::tag(FieldId::SiteName, "SiteName")]);
        let record = SurveyRecord::new().with(FieldId::SiteName, "Tower A");
        let report = patch_controls(&mut root, &map, &record);
        assert_eq!(report.written, 2);
        let index = ControlIndex::build(&root);
        for path in index.paths("SiteName") {
            let sdt = root.at_path(path).unwrap();
            assert_eq!(visible_text(sdt.child(W_SDT_CONTENT).unwrap()), "Tower A");
        }
    }

    #[test]
    fn test_missing_tag_is_skipped() {
        let mut root = document(&sdt("SiteName", "<w:r><w:t>x</w:t></w:r>"));
        let map = FieldMap::legacy();
        let record = SurveyRecord::new().with(FieldId::SiteName, "Tower A");
        let report = patch_controls(&mut root, &map, &record);
        assert_eq!(report.written, 1);
        assert!(report.skipped.iter().any(|s| s == "tag SiteID"));
    }

    #[test]
    fn test_condition_gated_control_is_emptied() {
        let mut root = document(&sdt("iLOQDetails", "<w:p><w:r><w:t>placeholder</w:t></w:r></w:p>"));
        let map = FieldMap::legacy();
        let record = SurveyRecord::new()
            .with(FieldId::SiteName, "Tower A")
            .with(FieldId::IloqRequired, false)
            .with(FieldId::IloqDetails, "X");
        patch_controls(&mut root, &map, &record);
        assert_eq!(control_text(&root, "iLOQDetails"), "");
        // Placeholder marker stays while the control is empty
        assert!(root.find("w:showingPlcHdr").is_some());
    }

    #[test]
    fn test_dropdown_options_untouched() {
        let inner = r#"<w:r><w:t>Choose an item.</w:t></w:r>"#;
        let body = format!(
            r#"<w:sdt><w:sdtPr><w:tag w:val="TSSRAligned"/><w:dropDownList><w:listItem w:displayText="Yes" w:value="Yes"/><w:listItem w:displayText="No" w:value="No"/></w:dropDownList></w:sdtPr><w:sdtContent>{inner}</w:sdtContent></w:sdt>"#
        );
        let mut root = document(&body);
        let map = FieldMap::legacy();
        let record = SurveyRecord::new().with(FieldId::TssrAlignment, "No");
        patch_controls(&mut root, &map, &record);
        assert_eq!(control_text(&root, "TSSRAligned"), "No");
        assert_eq!(root.find("w:dropDownList").unwrap().children_named("w:listItem").count(), 2);
    }
}
