//! Appending generated sections to a survey document
//!
//! Sections are added in a fixed order: planned works, then the photo
//! appendix, then the as-built addendum. Each starts on a new page. A bad
//! photo only costs that photo; the document is always completed.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PatchReport;
use super::drawing::{ImageBlob, add_media, max_drawing_id, picture_paragraph};
use super::run_writer::{RunStyle, W_BR, W_P, W_PPR, W_R, make_run};
use crate::config::Palette;
use crate::domain::{FieldMap, Phase, PhotoRecord, PlannedWorks, SurveyRecord};
use crate::error::{ExportError, Result};
use crate::ooxml::rels::{REL_OFFICE_DOCUMENT, resolve_target};
use crate::ooxml::{ContentTypes, Element, Package, Relationships, XmlDocument};
use crate::render;

const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";

/// Progress of one document through its optional sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Base,
    PlannedWorks,
    PhotoAppendix,
    AsBuilt,
    Done,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Base => "base",
            Stage::PlannedWorks => "planned works",
            Stage::PhotoAppendix => "photo appendix",
            Stage::AsBuilt => "as-built",
            Stage::Done => "done",
        }
    }
}

/// Section order and headings of the photo appendix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppendixLayout {
    #[serde(default = "default_section_order")]
    pub section_order: Vec<String>,
    #[serde(default = "default_section_labels")]
    pub section_labels: BTreeMap<String, String>,
    #[serde(default = "default_image_width_cm")]
    pub image_width_cm: f32,
}

const SECTIONS: &[(&str, &str)] = &[
    ("site_overview", "§1 — Site Overview"),
    ("delivery_access", "§1.1 — Delivery & Access"),
    ("hse_illustration", "§1.2 — HSE Illustration"),
    ("cable_route", "§3.5 — Cable Route"),
    ("power_diagram", "§3.6 — Power Diagram"),
    ("radio_plan_screenshot", "§4.3 — Radio Plan Screenshot"),
    ("effekt_screenshot", "§4.3 — Effekt Screenshot"),
    ("antenna_azimuth", "§5.1 — Antenna Azimuth"),
    ("antenna_placement", "§5.2 — Antenna Placement"),
    ("equipment_room", "§5.3 — Equipment Room"),
    ("site_plan", "§5.4 — Site Plan"),
    ("structural_calc", "§5.5 — Structural Calculation"),
    ("building_photos", "Appendix — Building Photos"),
    ("detail_photos", "Appendix — Detail Photos"),
    ("other", "Other Photos"),
];

fn default_section_order() -> Vec<String> {
    SECTIONS.iter().map(|(key, _)| key.to_string()).collect()
}

fn default_section_labels() -> BTreeMap<String, String> {
    SECTIONS
        .iter()
        .map(|(key, label)| (key.to_string(), label.to_string()))
        .collect()
}

fn default_image_width_cm() -> f32 {
    16.0
}

impl Default for AppendixLayout {
    fn default() -> Self {
        Self {
            section_order: default_section_order(),
            section_labels: default_section_labels(),
            image_width_cm: default_image_width_cm(),
        }
    }
}

impl AppendixLayout {
    pub fn label_of<'a>(&'a self, section: &'a str) -> &'a str {
        self.section_labels
            .get(section)
            .map(String::as_str)
            .unwrap_or(section)
    }
}

fn page_break() -> Element {
    Element::new(W_P).with_child(
        Element::new(W_R).with_child(Element::new(W_BR).with_attr("w:type", "page")),
    )
}

fn heading(level: u8, text: &str) -> Element {
    let points = if level == 1 { 16.0 } else { 13.0 };
    Element::new(W_P)
        .with_child(
            Element::new(W_PPR)
                .with_child(Element::new("w:pStyle").with_attr("w:val", format!("Heading{level}"))),
        )
        .with_child(make_run(text, &RunStyle::default().bold().points(points)))
}

fn paragraph(runs: Vec<Element>) -> Element {
    let mut p = Element::new(W_P);
    for run in runs {
        p.push(run);
    }
    p
}

/// Survey document being assembled from a template package
pub struct DocumentAssembler<'a> {
    package: Package,
    document_part: String,
    document: XmlDocument,
    rels: Relationships,
    types: ContentTypes,
    stage: Stage,
    layout: &'a AppendixLayout,
    palette: &'a Palette,
    next_drawing_id: u32,
    report: PatchReport,
}

impl<'a> DocumentAssembler<'a> {
    /// Open the legacy template and patch `record` into it; a missing template is fatal
    pub fn open_legacy(
        path: &Path,
        map: &FieldMap,
        record: &SurveyRecord,
        layout: &'a AppendixLayout,
        palette: &'a Palette,
    ) -> Result<Self> {
        let mut assembler = Self::from_package(Package::open(path)?, layout, palette)?;
        assembler.report = super::patch_template(&mut assembler.document.root, map, record);
        Ok(assembler)
    }

    pub fn from_package(package: Package, layout: &'a AppendixLayout, palette: &'a Palette) -> Result<Self> {
        let root_rels = Relationships::load(&package, "")?;
        let document_part = root_rels
            .targets_of_type(REL_OFFICE_DOCUMENT)
            .next()
            .map(|t| resolve_target("", t))
            .unwrap_or_else(|| DEFAULT_DOCUMENT_PART.to_string());
        if !package.contains(&document_part) {
            return Err(ExportError::MissingPart { part: document_part });
        }

        let document = package.read_xml(&document_part)?;
        if document.root.child("w:body").is_none() {
            return Err(ExportError::xml(&document_part, "document has no body"));
        }
        let rels = Relationships::load(&package, &document_part)?;
        let types = ContentTypes::load(&package)?;
        let next_drawing_id = max_drawing_id(&document.root) + 1;

        Ok(Self {
            package,
            document_part,
            document,
            rels,
            types,
            stage: Stage::Base,
            layout,
            palette,
            next_drawing_id,
            report: PatchReport::default(),
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Outcome of patching the template fields
    pub fn patch_report(&self) -> &PatchReport {
        &self.report
    }

    pub fn document(&self) -> &Element {
        &self.document.root
    }

    fn advance(&mut self, to: Stage) -> Result<()> {
        if to <= self.stage {
            return Err(ExportError::StageOrder {
                from: self.stage.name(),
                to: to.name(),
            });
        }
        self.stage = to;
        Ok(())
    }

    /// Append before the final section properties so page setup stays last
    fn append(&mut self, block: Element) {
        let Some(body) = self.document.root.child_mut("w:body") else {
            return;
        };
        match body.position_of("w:sectPr") {
            Some(index) => body.insert(index, block),
            None => body.push(block),
        }
    }

    pub fn planned_works(&mut self, works: &PlannedWorks) -> Result<()> {
        self.advance(Stage::PlannedWorks)?;
        if works.is_empty() {
            log::debug!("No planned works to add");
            return Ok(());
        }

        self.append(page_break());
        self.append(heading(1, "Description of Planned Works"));
        for section in works.sections.iter().filter(|s| s.is_renderable()) {
            self.append(heading(2, &section.title));
            for item in &section.items {
                let Some(text) = item.display_text() else {
                    continue;
                };
                let mut runs = vec![make_run(&format!("\u{2022} {text}"), &RunStyle::default().points(10.0))];
                if let Some(derivation) = item.derivation.as_deref().filter(|d| !d.is_empty()) {
                    runs.push(make_run(
                        &format!("  [{derivation}]"),
                        &RunStyle::default().italic().points(8.0).color("808080"),
                    ));
                }
                self.append(paragraph(runs));
            }
        }
        Ok(())
    }

    pub fn photo_appendix(&mut self, photos: &[PhotoRecord]) -> Result<()> {
        self.advance(Stage::PhotoAppendix)?;
        let groups = self.group_photos(photos.iter());
        if groups.is_empty() {
            log::debug!("No exportable photos for the appendix");
            return Ok(());
        }
        self.append(page_break());
        self.append(heading(1, "Photo Documentation"));
        self.photo_pass(groups);
        Ok(())
    }

    pub fn as_built(&mut self, date: NaiveDate, deviations: Option<&str>, photos: &[PhotoRecord]) -> Result<()> {
        self.advance(Stage::AsBuilt)?;
        self.append(page_break());
        self.append(heading(1, "AS-BUILT DOCUMENTATION"));
        self.append(paragraph(vec![make_run(
            &format!("As-Built Date: {}", date.format("%d.%m.%Y")),
            &RunStyle::default().points(10.0),
        )]));

        if let Some(notes) = deviations.map(str::trim).filter(|n| !n.is_empty()) {
            self.append(heading(2, "Deviation Notes"));
            self.append(paragraph(vec![make_run(notes, &RunStyle::default().points(10.0))]));
        }

        let groups = self.group_photos(photos.iter().filter(|p| p.phase == Phase::AsBuilt));
        if !groups.is_empty() {
            self.append(heading(2, "As-Built Photo Documentation"));
            self.photo_pass(groups);
        }
        Ok(())
    }

    /// Photos per known section in appendix order, each sorted by its sort key
    fn group_photos<'p>(&self, photos: impl Iterator<Item = &'p PhotoRecord>) -> Vec<(String, Vec<&'p PhotoRecord>)> {
        let mut by_section: BTreeMap<&str, Vec<&'p PhotoRecord>> = BTreeMap::new();
        for photo in photos {
            if self.layout.section_order.iter().any(|s| *s == photo.section) {
                by_section.entry(photo.section.as_str()).or_default().push(photo);
            } else {
                log::info!("Photo {} in section {:?} is not exported, skipping", photo.id, photo.section);
            }
        }

        let mut groups = Vec::new();
        for section in &self.layout.section_order {
            if let Some(mut members) = by_section.remove(section.as_str()) {
                members.sort_by_key(|p| p.sort_order);
                groups.push((section.clone(), members));
            }
        }
        groups
    }

    fn photo_pass(&mut self, groups: Vec<(String, Vec<&PhotoRecord>)>) {
        for (section, photos) in groups {
            let label = self.layout.label_of(&section).to_string();
            self.append(heading(2, &label));
            for photo in photos {
                self.embed_photo(photo);
            }
        }
    }

    /// Bytes to embed: annotated when possible, otherwise the original file
    fn photo_blob(&self, photo: &PhotoRecord) -> Option<ImageBlob> {
        if !photo.annotations.is_empty() {
            let annotated = render::annotate_photo(&photo.file_path, &photo.annotations, self.palette)
                .and_then(ImageBlob::from_bytes);
            match annotated {
                Ok(blob) => return Some(blob),
                Err(err) => log::warn!("Photo {}: annotation failed, embedding original: {err}", photo.id),
            }
        }
        let original = std::fs::read(&photo.file_path).map_err(ExportError::from).and_then(ImageBlob::from_bytes);
        match original {
            Ok(blob) => Some(blob),
            Err(err) => {
                log::warn!("Photo {}: unreadable image, skipping: {err}", photo.id);
                None
            }
        }
    }

    fn embed_photo(&mut self, photo: &PhotoRecord) -> bool {
        if !photo.file_path.is_file() {
            log::warn!("Photo {} not found at {}, skipping", photo.id, photo.file_path.display());
            return false;
        }
        let Some(blob) = self.photo_blob(photo) else {
            return false;
        };

        let (cx, cy) = blob.extent(self.layout.image_width_cm);
        let rel_id = add_media(&mut self.package, &mut self.rels, &mut self.types, &self.document_part, blob);
        let drawing_id = self.next_drawing_id;
        self.next_drawing_id += 1;
        let name = photo
            .auto_filename
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&photo.original_filename)
            .to_string();
        self.append(picture_paragraph(&rel_id, drawing_id, &name, cx, cy));

        let caption = Element::new(W_P)
            .with_child(
                Element::new(W_PPR).with_child(Element::new("w:spacing").with_attr("w:after", "240")),
            )
            .with_child(make_run(&photo.caption_text(), &RunStyle::default().italic().points(9.0)));
        self.append(caption);
        true
    }

    /// Serialize the finished document
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.stage = Stage::Done;
        self.package.write_xml(&self.document_part, &self.document)?;
        self.rels.store(&mut self.package, &self.document_part)?;
        self.types.store(&mut self.package)?;
        self.package.to_bytes()
    }
}
