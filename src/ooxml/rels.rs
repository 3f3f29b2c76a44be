//! Relationship and content-type bookkeeping

use super::xml::{Element, XmlDocument};
use super::package::Package;
use crate::error::Result;

pub const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub const REL_FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const REL_CALC_CHAIN: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain";
pub const REL_VBA_PROJECT: &str = "http://schemas.microsoft.com/office/2006/relationships/vbaProject";

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// `word/document.xml` -> `word/_rels/document.xml.rels`
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the directory of its source part
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// The relationships of one source part
#[derive(Clone, Debug)]
pub struct Relationships {
    doc: XmlDocument,
}

impl Relationships {
    pub fn empty() -> Self {
        Self {
            doc: XmlDocument::new(Element::new("Relationships").with_attr("xmlns", NS_RELATIONSHIPS)),
        }
    }

    /// Load the relationships of `source_part`, or an empty set when it has none
    pub fn load(package: &Package, source_part: &str) -> Result<Self> {
        let name = rels_part_for(source_part);
        if !package.contains(&name) {
            return Ok(Self::empty());
        }
        Ok(Self {
            doc: package.read_xml(&name)?,
        })
    }

    pub fn store(&self, package: &mut Package, source_part: &str) -> Result<()> {
        package.write_xml(&rels_part_for(source_part), &self.doc)
    }

    pub fn target_of(&self, id: &str) -> Option<&str> {
        self.doc
            .root
            .children_named("Relationship")
            .find(|r| r.attr("Id") == Some(id))
            .and_then(|r| r.attr("Target"))
    }

    pub fn targets_of_type<'a>(&'a self, rel_type: &'a str) -> impl Iterator<Item = &'a str> {
        self.doc
            .root
            .children_named("Relationship")
            .filter(move |r| r.attr("Type") == Some(rel_type))
            .filter_map(|r| r.attr("Target"))
    }

    /// `(type, target)` of every relationship
    pub fn all(&self) -> impl Iterator<Item = (&str, &str)> {
        self.doc
            .root
            .children_named("Relationship")
            .filter_map(|r| Some((r.attr("Type")?, r.attr("Target")?)))
    }

    /// Append a relationship and return its fresh `rIdN`
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let taken: Vec<&str> = self
            .doc
            .root
            .children_named("Relationship")
            .filter_map(|r| r.attr("Id"))
            .collect();
        let id = (1..)
            .map(|i| format!("rId{i}"))
            .find(|candidate| !taken.contains(&candidate.as_str()))
            .unwrap_or_else(|| "rId0".to_string());
        self.doc.root.push(
            Element::new("Relationship")
                .with_attr("Id", id.as_str())
                .with_attr("Type", rel_type)
                .with_attr("Target", target),
        );
        id
    }

    /// Drop every relationship of the given type, returning the removed targets
    pub fn remove_type(&mut self, rel_type: &str) -> Vec<String> {
        let removed: Vec<String> = self.targets_of_type(rel_type).map(str::to_string).collect();
        self.doc
            .root
            .retain_elements(|r| r.name != "Relationship" || r.attr("Type") != Some(rel_type));
        removed
    }
}

/// `[Content_Types].xml`
#[derive(Clone, Debug)]
pub struct ContentTypes {
    doc: XmlDocument,
}

impl ContentTypes {
    pub fn empty() -> Self {
        Self {
            doc: XmlDocument::new(Element::new("Types").with_attr("xmlns", NS_CONTENT_TYPES)),
        }
    }

    pub fn load(package: &Package) -> Result<Self> {
        Ok(Self {
            doc: package.read_xml(CONTENT_TYPES_PART)?,
        })
    }

    pub fn store(&self, package: &mut Package) -> Result<()> {
        package.write_xml(CONTENT_TYPES_PART, &self.doc)
    }

    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        let exists = self.doc.root.children_named("Default").any(|d| {
            d.attr("Extension")
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        });
        if !exists {
            // Defaults conventionally precede overrides
            let index = self.doc.root.position_of("Override").unwrap_or(self.doc.root.children.len());
            self.doc.root.insert(
                index,
                Element::new("Default")
                    .with_attr("Extension", extension)
                    .with_attr("ContentType", content_type),
            );
        }
    }

    pub fn default_of(&self, extension: &str) -> Option<&str> {
        self.doc
            .root
            .children_named("Default")
            .find(|d| {
                d.attr("Extension")
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension))
            })
            .and_then(|d| d.attr("ContentType"))
    }

    /// `part` is a package part name without the leading slash
    pub fn override_of(&self, part: &str) -> Option<&str> {
        let part_name = format!("/{part}");
        self.doc
            .root
            .children_named("Override")
            .find(|o| o.attr("PartName") == Some(part_name.as_str()))
            .and_then(|o| o.attr("ContentType"))
    }

    pub fn set_override(&mut self, part: &str, content_type: &str) {
        let part_name = format!("/{part}");
        if let Some(existing) = self
            .doc
            .root
            .children_named_mut("Override")
            .find(|o| o.attr("PartName") == Some(part_name.as_str()))
        {
            existing.set_attr("ContentType", content_type);
            return;
        }
        self.doc.root.push(
            Element::new("Override")
                .with_attr("PartName", part_name.as_str())
                .with_attr("ContentType", content_type),
        );
    }

    pub fn remove_override(&mut self, part: &str) {
        let part_name = format!("/{part}");
        self.doc
            .root
            .retain_elements(|o| o.name != "Override" || o.attr("PartName") != Some(part_name.as_str()));
    }

    pub fn remove_default(&mut self, extension: &str) {
        self.doc.root.retain_elements(|d| {
            d.name != "Default"
                || !d
                    .attr("Extension")
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_part_for() {
        assert_eq!(rels_part_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_part_for("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("xl/workbook.xml", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("xl/workbook.xml", "/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
        assert_eq!(resolve_target("word/document.xml", "../customXml/item1.xml"), "customXml/item1.xml");
    }

    #[test]
    fn test_add_relationship_picks_free_id() {
        let mut rels = Relationships::empty();
        assert_eq!(rels.add(REL_STYLES, "styles.xml"), "rId1");
        assert_eq!(rels.add(REL_IMAGE, "media/image1.png"), "rId2");
        assert_eq!(rels.target_of("rId2"), Some("media/image1.png"));
        assert_eq!(rels.remove_type(REL_IMAGE), vec!["media/image1.png".to_string()]);
        assert_eq!(rels.target_of("rId2"), None);
        assert_eq!(rels.add(REL_IMAGE, "media/image2.png"), "rId2");
    }

    #[test]
    fn test_content_type_defaults_and_overrides() {
        let mut ct = ContentTypes::empty();
        ct.set_override("xl/workbook.xml", "a");
        ct.ensure_default("jpeg", "image/jpeg");
        ct.ensure_default("JPEG", "image/jpeg");
        assert_eq!(ct.doc.root.children_named("Default").count(), 1);
        assert_eq!(ct.doc.root.position_of("Default"), Some(0));
        ct.set_override("xl/workbook.xml", "b");
        assert_eq!(ct.override_of("xl/workbook.xml"), Some("b"));
        ct.remove_override("xl/workbook.xml");
        assert_eq!(ct.override_of("xl/workbook.xml"), None);
    }
}
