//! Survey template built from nothing
//!
//! Produces a complete package: an A4 page with a branded header table, a
//! borderless two-column form of labels and structured controls grouped under
//! shaded divider rows, and a footer stamp. Controls are assembled node by
//! node: tag, alias, option list and the placeholder-styled run.

use chrono::NaiveDate;

use super::run_writer::{RunStyle, make_run};
use crate::domain::{FieldId, SurveyRecord};
use crate::error::Result;
use crate::ooxml::rels::{REL_FOOTER, REL_OFFICE_DOCUMENT, REL_STYLES};
use crate::ooxml::{ContentTypes, Element, Package, Relationships, XmlDocument};

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const FOOTER_PART: &str = "word/footer1.xml";

const FONT: &str = "Segoe UI";
const BLUE_PRIMARY: &str = "1E40AF";
const BLUE_PALE: &str = "BFDBFE";
const GRAY_700: &str = "374151";
const GRAY_500: &str = "6B7280";
const GRAY_400: &str = "9CA3AF";
const GRAY_200: &str = "E5E7EB";
const GRAY_50: &str = "F9FAFB";
const RED_600: &str = "DC2626";
const WHITE: &str = "FFFFFF";

/// Label and value column widths in twips
const GRID: [u32; 2] = [3600, 6200];
const BRAND: &str = "SiteForge v1.0";

const VERSION_OPTIONS: &[&str] = &[
    "No", "NA", "v01", "v02", "v03", "v04", "v05", "v06", "v07", "v08", "v09", "v10",
];
const YES_NO: &[&str] = &["Yes", "No"];

/// One row of the generated form
enum FormRow {
    Divider(&'static str),
    Separator,
    Field(FieldDef),
    Toggle {
        field: FieldDef,
        detail: Option<FieldDef>,
    },
}

struct FieldDef {
    label: &'static str,
    tag: &'static str,
    alias: &'static str,
    placeholder: &'static str,
    source: FieldId,
    /// `None` for free text
    options: Option<&'static [&'static str]>,
    required: bool,
    /// Minimum row height in twips for multi-line values
    min_height: Option<u32>,
    /// Field that must be truthy before the default is shown
    condition: Option<FieldId>,
}

const fn text(label: &'static str, tag: &'static str, alias: &'static str, placeholder: &'static str, source: FieldId) -> FieldDef {
    FieldDef {
        label,
        tag,
        alias,
        placeholder,
        source,
        options: None,
        required: false,
        min_height: None,
        condition: None,
    }
}

const fn dropdown(
    label: &'static str,
    tag: &'static str,
    alias: &'static str,
    placeholder: &'static str,
    source: FieldId,
    options: &'static [&'static str],
) -> FieldDef {
    FieldDef {
        label,
        tag,
        alias,
        placeholder,
        source,
        options: Some(options),
        required: false,
        min_height: None,
        condition: None,
    }
}

impl FieldDef {
    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Multi-line row, 320 twips per line
    const fn lines(mut self, lines: u32) -> Self {
        self.min_height = Some(lines * 320);
        self
    }

    const fn height(mut self, twips: u32) -> Self {
        self.min_height = Some(twips);
        self
    }

    const fn when(mut self, condition: FieldId) -> Self {
        self.condition = Some(condition);
        self
    }
}

fn form() -> Vec<FormRow> {
    use FieldId::*;
    vec![
        FormRow::Divider("SITE IDENTITY"),
        FormRow::Field(text("Site Name", "SiteName", "Site Name", "e.g., Oslo Sentrum Tower", SiteName).required()),
        FormRow::Field(text("Site ID", "SiteID", "Site ID", "e.g., OSL-1234", SiteId).required()),
        FormRow::Field(dropdown(
            "Building Type",
            "BuildingType",
            "Building Type",
            "Select building type...",
            SiteModel,
            &["Silo", "Barn", "Private House", "Factory", "Other Rooftop"],
        )),
        FormRow::Field(dropdown(
            "Contractual Model",
            "ContractualModel",
            "Contractual Model",
            "Select model...",
            SiteType,
            &["Not Applicable", "Private Site", "Coloc", "Greenfield"],
        )),
        FormRow::Field(
            dropdown("Customer", "Customer", "Customer", "Select customer...", Customer, &["ICE", "Telenor", "Telia"])
                .required(),
        ),
        FormRow::Field(dropdown(
            "Site Owner",
            "SiteOwner",
            "Site Owner",
            "Select owner...",
            SiteOwner,
            &[
                "Telia Infra",
                "Telenor Infra",
                "Norkring",
                "Haugaland Kraft",
                "Lyse Fiber",
                "Broadnet",
                "Private",
                "Other",
            ],
        )),
        FormRow::Field(dropdown(
            "Site Category",
            "SiteCategory",
            "Site Category",
            "Select category...",
            SiteCategory,
            &["Rooftop", "Greenfield", "Barn", "Indoor", "Tower"],
        )),
        FormRow::Separator,
        FormRow::Divider("SUPPORTING DOCUMENTS"),
        FormRow::Field(dropdown(
            "Site Owner Offer",
            "SiteOwnerOfferVersion",
            "Site Owner Offer Version",
            "Select version...",
            SiteOwnerOffer,
            VERSION_OPTIONS,
        )),
        FormRow::Field(dropdown(
            "Montasjeunderlag",
            "MontasjeunderlagVersion",
            "Montasjeunderlag Version",
            "Select version...",
            Montasjeunderlag,
            VERSION_OPTIONS,
        )),
        FormRow::Field(dropdown("SART", "SARTVersion", "SART Version", "Select version...", Sart, VERSION_OPTIONS)),
        FormRow::Field(dropdown("Veiviser", "VeiviserAvailable", "Veiviser Available", "Select...", Veiviser, YES_NO)),
        FormRow::Field(dropdown("RFSR / RNP", "RFSRVersion", "RFSR Version", "Select version...", RfsrRnp, VERSION_OPTIONS)),
        FormRow::Field(text(
            "Other Documents",
            "OtherSupportingDocuments",
            "Other Supporting Documents",
            "Guideline version, additional references...",
            GuidelineVersion,
        )),
        FormRow::Separator,
        FormRow::Divider("ACCESS & LOGISTICS"),
        FormRow::Field(
            text(
                "Veiviser Comments",
                "VeiviserComments",
                "Veiviser Comments",
                "Access directions, key codes, contact person, parking...",
                VeiviserComments,
            )
            .lines(3),
        ),
        FormRow::Toggle {
            field: dropdown("iLOQ Required", "iLOQRequired", "iLOQ Required", "Select...", IloqRequired, YES_NO),
            detail: Some(
                text("iLOQ Required Details", "iLOQDetails", "iLOQ Details", "Location, lock ID, access level...", IloqDetails)
                    .height(640)
                    .when(IloqRequired),
            ),
        },
        FormRow::Field(
            text(
                "Access Instructions",
                "AccessInstructions",
                "Access Instructions",
                "Detailed access instructions for site visit...",
                AccessInstructions,
            )
            .lines(3),
        ),
        FormRow::Toggle {
            field: dropdown("Crane Needed", "CraneNeeded", "Crane Needed", "Select...", CraneNeeded, YES_NO),
            detail: None,
        },
        FormRow::Separator,
        FormRow::Divider("TSSR ALIGNMENT"),
        FormRow::Field(dropdown("TSSR Aligned", "TSSRAligned", "TSSR Aligned", "Select...", TssrAlignment, YES_NO)),
        FormRow::Field(
            text(
                "Alignment Comments",
                "TSSRAlignmentComments",
                "TSSR Alignment Comments",
                "Deviations, scope changes, alignment notes...",
                TssrAlignmentComments,
            )
            .lines(3),
        ),
    ]
}

/// Builds the modern survey template, blank or pre-filled from a record
pub struct ModernTemplateBuilder<'a> {
    date: NaiveDate,
    record: Option<&'a SurveyRecord>,
}

impl<'a> ModernTemplateBuilder<'a> {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, record: None }
    }

    pub fn with_record(mut self, record: &'a SurveyRecord) -> Self {
        self.record = Some(record);
        self
    }

    pub fn build(&self) -> Result<Package> {
        let mut package = Package::new();

        let mut types = ContentTypes::empty();
        types.ensure_default("rels", "application/vnd.openxmlformats-package.relationships+xml");
        types.ensure_default("xml", "application/xml");
        types.set_override(
            DOCUMENT_PART,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        );
        types.set_override(
            STYLES_PART,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
        );
        types.set_override(
            FOOTER_PART,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml",
        );
        types.store(&mut package)?;

        let mut root_rels = Relationships::empty();
        root_rels.add(REL_OFFICE_DOCUMENT, DOCUMENT_PART);
        root_rels.store(&mut package, "")?;

        let mut doc_rels = Relationships::empty();
        doc_rels.add(REL_STYLES, "styles.xml");
        let footer_id = doc_rels.add(REL_FOOTER, "footer1.xml");

        package.write_xml(DOCUMENT_PART, &XmlDocument::new(self.document(&footer_id)))?;
        doc_rels.store(&mut package, DOCUMENT_PART)?;
        package.set_part(STYLES_PART, STYLES_XML.as_bytes().to_vec());
        package.write_xml(FOOTER_PART, &XmlDocument::new(self.footer()))?;
        Ok(package)
    }

    fn default_for(&self, spec: &FieldDef) -> String {
        let Some(record) = self.record else {
            return String::new();
        };
        if spec.condition.is_some_and(|c| !record.is_truthy(c)) {
            return String::new();
        }
        record.text(spec.source)
    }

    fn document(&self, footer_id: &str) -> Element {
        let mut body = Element::new("w:body");
        body.push(self.header_table());
        body.push(spacing_paragraph(80, 80));

        let mut title = spacing_paragraph(40, 160);
        title.push(make_run(
            "Site Identity & Access",
            &RunStyle::default().family(FONT).points(14.0).bold().color(BLUE_PRIMARY),
        ));
        body.push(title);

        body.push(self.form_table());

        let mut end = spacing_paragraph(120, 0);
        if let Some(ppr) = end.child_mut("w:pPr") {
            ppr.insert(
                0,
                Element::new("w:pBdr").with_child(
                    Element::new("w:bottom")
                        .with_attr("w:val", "single")
                        .with_attr("w:sz", "12")
                        .with_attr("w:space", "1")
                        .with_attr("w:color", BLUE_PRIMARY),
                ),
            );
        }
        body.push(end);
        body.push(section_properties(footer_id));

        Element::new("w:document")
            .with_attr("xmlns:w", NS_W)
            .with_attr("xmlns:r", NS_R)
            .with_child(body)
    }

    fn header_table(&self) -> Element {
        let widths = [6804, 3062];
        let mut left = cell(widths[0], Some(BLUE_PRIMARY), (100, 160, 100, 160));
        let mut title = spacing_paragraph(0, 0);
        title.push(make_run(
            "TECHNICAL SITE SURVEY REPORT",
            &RunStyle::default().family(FONT).points(16.0).bold().color(WHITE),
        ));
        left.push(title);

        let mut right = cell(widths[1], Some(BLUE_PRIMARY), (100, 160, 100, 160));
        let mut stamp = spacing_paragraph(0, 0);
        if let Some(ppr) = stamp.child_mut("w:pPr") {
            ppr.push(Element::new("w:jc").with_attr("w:val", "right"));
        }
        stamp.push(make_run(
            &format!("{BRAND}\n{}", self.date.format("%d %b %Y")),
            &RunStyle::default().family(FONT).points(9.0).color(BLUE_PALE),
        ));
        right.push(stamp);

        table(&widths).with_child(Element::new("w:tr").with_child(left).with_child(right))
    }

    fn form_table(&self) -> Element {
        let mut tbl = table(&GRID);
        for row in form() {
            match row {
                FormRow::Divider(title) => tbl.push(divider_row(title)),
                FormRow::Separator => tbl.push(separator_row()),
                FormRow::Field(spec) => tbl.push(self.field_row(&spec, spec.label)),
                FormRow::Toggle { field, detail } => {
                    let toggle_default = if self.record.is_some_and(|r| r.is_truthy(field.source)) {
                        "Yes".to_string()
                    } else {
                        String::new()
                    };
                    tbl.push(field_row(&field, field.label, &toggle_default));
                    if let Some(detail) = detail {
                        let label = format!("  {} Details", field.label);
                        tbl.push(self.field_row(&detail, &label));
                    }
                }
            }
        }
        tbl
    }

    fn field_row(&self, spec: &FieldDef, label: &str) -> Element {
        field_row(spec, label, &self.default_for(spec))
    }

    fn footer(&self) -> Element {
        let mut p = spacing_paragraph(80, 0);
        if let Some(ppr) = p.child_mut("w:pPr") {
            ppr.push(Element::new("w:jc").with_attr("w:val", "center"));
        }
        p.push(make_run(
            &format!("TSSR generated by SiteForge  |  {}  |  v1.0", self.date.format("%Y-%m-%d")),
            &RunStyle::default().family(FONT).points(8.0).color(GRAY_500),
        ));
        Element::new("w:ftr")
            .with_attr("xmlns:w", NS_W)
            .with_attr("xmlns:r", NS_R)
            .with_child(p)
    }
}

fn section_properties(footer_id: &str) -> Element {
    Element::new("w:sectPr")
        .with_child(
            Element::new("w:footerReference")
                .with_attr("w:type", "default")
                .with_attr("r:id", footer_id),
        )
        .with_child(Element::new("w:pgSz").with_attr("w:w", "11906").with_attr("w:h", "16838"))
        .with_child(
            Element::new("w:pgMar")
                .with_attr("w:top", "850")
                .with_attr("w:right", "1020")
                .with_attr("w:bottom", "850")
                .with_attr("w:left", "1020")
                .with_attr("w:header", "708")
                .with_attr("w:footer", "708")
                .with_attr("w:gutter", "0"),
        )
}

fn spacing_paragraph(before: u32, after: u32) -> Element {
    Element::new("w:p").with_child(
        Element::new("w:pPr").with_child(
            Element::new("w:spacing")
                .with_attr("w:before", before.to_string())
                .with_attr("w:after", after.to_string()),
        ),
    )
}

/// Centered, borderless table with a fixed grid
fn table(grid: &[u32]) -> Element {
    let mut borders = Element::new("w:tblBorders");
    for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        borders.push(
            Element::new(edge)
                .with_attr("w:val", "none")
                .with_attr("w:sz", "0")
                .with_attr("w:space", "0")
                .with_attr("w:color", "auto"),
        );
    }
    let total: u32 = grid.iter().sum();
    let props = Element::new("w:tblPr")
        .with_child(
            Element::new("w:tblW")
                .with_attr("w:w", total.to_string())
                .with_attr("w:type", "dxa"),
        )
        .with_child(Element::new("w:jc").with_attr("w:val", "center"))
        .with_child(borders)
        .with_child(Element::new("w:tblLayout").with_attr("w:type", "fixed"));

    let mut cols = Element::new("w:tblGrid");
    for w in grid {
        cols.push(Element::new("w:gridCol").with_attr("w:w", w.to_string()));
    }
    Element::new("w:tbl").with_child(props).with_child(cols)
}

/// Empty cell with width, optional shading and `(top, start, bottom, end)` margins
fn cell(width: u32, fill: Option<&str>, margins: (u32, u32, u32, u32)) -> Element {
    let mut pr = Element::new("w:tcPr").with_child(
        Element::new("w:tcW")
            .with_attr("w:w", width.to_string())
            .with_attr("w:type", "dxa"),
    );
    if let Some(fill) = fill {
        pr.push(shading(fill));
    }
    pr.push(cell_margins(margins));
    Element::new("w:tc").with_child(pr)
}

fn shading(fill: &str) -> Element {
    Element::new("w:shd")
        .with_attr("w:val", "clear")
        .with_attr("w:color", "auto")
        .with_attr("w:fill", fill)
}

fn cell_margins((top, start, bottom, end): (u32, u32, u32, u32)) -> Element {
    let side = |name: &str, w: u32| {
        Element::new(name)
            .with_attr("w:w", w.to_string())
            .with_attr("w:type", "dxa")
    };
    Element::new("w:tcMar")
        .with_child(side("w:top", top))
        .with_child(side("w:start", start))
        .with_child(side("w:bottom", bottom))
        .with_child(side("w:end", end))
}

fn row_height(twips: u32, rule: &str) -> Element {
    Element::new("w:trPr").with_child(
        Element::new("w:trHeight")
            .with_attr("w:val", twips.to_string())
            .with_attr("w:hRule", rule),
    )
}

/// Full-width cell spanning both grid columns
fn spanning_cell(fill: &str, margins: Option<(u32, u32, u32, u32)>) -> Element {
    let mut pr = Element::new("w:tcPr")
        .with_child(
            Element::new("w:tcW")
                .with_attr("w:w", GRID.iter().sum::<u32>().to_string())
                .with_attr("w:type", "dxa"),
        )
        .with_child(Element::new("w:gridSpan").with_attr("w:val", "2"))
        .with_child(shading(fill));
    if let Some(margins) = margins {
        pr.push(cell_margins(margins));
    }
    Element::new("w:tc").with_child(pr)
}

fn divider_row(title: &str) -> Element {
    let mut tc = spanning_cell(BLUE_PRIMARY, Some((60, 140, 60, 140)));
    let mut p = spacing_paragraph(0, 0);
    p.push(make_run(title, &RunStyle::default().family(FONT).points(9.5).bold().color(WHITE)));
    tc.push(p);
    Element::new("w:tr").with_child(tc)
}

fn separator_row() -> Element {
    let mut tc = spanning_cell(GRAY_200, None);
    tc.push(Element::new("w:p"));
    Element::new("w:tr")
        .with_child(row_height(30, "exact"))
        .with_child(tc)
}

fn label_cell(label: &str, required: bool) -> Element {
    let mut tc = cell(GRID[0], Some(GRAY_50), (80, 140, 80, 80));
    if let Some(pr) = tc.child_mut("w:tcPr") {
        // Borders sit between tcW and shd
        pr.insert(
            1,
            Element::new("w:tcBorders").with_child(
                Element::new("w:end")
                    .with_attr("w:val", "single")
                    .with_attr("w:sz", "4")
                    .with_attr("w:space", "0")
                    .with_attr("w:color", GRAY_200),
            ),
        );
    }
    let style = RunStyle::default().family(FONT).points(10.5).bold().color(GRAY_700);
    let mut p = spacing_paragraph(40, 40);
    p.push(make_run(label, &style));
    if required {
        p.push(make_run(" *", &style.clone().color(RED_600)));
    }
    tc.push(p);
    tc
}

fn field_row(spec: &FieldDef, label: &str, default: &str) -> Element {
    let mut value = cell(GRID[1], None, (80, 140, 80, 140));
    value.push(control(spec, default));

    let mut tr = Element::new("w:tr");
    if let Some(height) = spec.min_height {
        tr.push(row_height(height, "atLeast"));
    }
    tr.with_child(label_cell(label, spec.required)).with_child(value)
}

/// Block-level structured control with its content paragraph
fn control(spec: &FieldDef, default: &str) -> Element {
    let mut pr = Element::new("w:sdtPr")
        .with_child(Element::new("w:alias").with_attr("w:val", spec.alias))
        .with_child(Element::new("w:tag").with_attr("w:val", spec.tag));
    if default.is_empty() {
        pr.push(Element::new("w:showingPlcHdr"));
    }
    match spec.options {
        Some(options) => {
            let mut combo = Element::new("w:comboBox");
            for option in options {
                combo.push(
                    Element::new("w:listItem")
                        .with_attr("w:displayText", *option)
                        .with_attr("w:value", *option),
                );
            }
            pr.push(combo);
        }
        None => pr.push(Element::new("w:text").with_attr("w:multiLine", "1")),
    }

    let mut style = RunStyle::default().family(FONT).points(11.0);
    let shown = if default.is_empty() {
        style = style.italic().color(GRAY_400);
        spec.placeholder
    } else {
        default
    };
    let mut p = spacing_paragraph(40, 40);
    p.push(make_run(shown, &style));

    Element::new("w:sdt")
        .with_child(pr)
        .with_child(Element::new("w:sdtContent").with_child(p))
}

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Segoe UI" w:hAnsi="Segoe UI" w:cs="Segoe UI"/><w:color w:val="111827"/><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="1E40AF"/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:color w:val="1E40AF"/><w:sz w:val="26"/></w:rPr></w:style><w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/><w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar><w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style></w:styles>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::run_writer::visible_text;
    use crate::docx::sdt::{ControlIndex, W_SDT_CONTENT};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn document_of(package: &Package) -> Element {
        package.read_xml(DOCUMENT_PART).unwrap().root
    }

    fn control_text(root: &Element, tag: &str) -> String {
        let index = ControlIndex::build(root);
        let sdt = root.at_path(&index.paths(tag)[0]).unwrap();
        visible_text(sdt.child(W_SDT_CONTENT).unwrap())
    }

    #[test]
    fn test_blank_template_shows_placeholders() {
        let package = ModernTemplateBuilder::new(date()).build().unwrap();
        for part in ["[Content_Types].xml", "_rels/.rels", DOCUMENT_PART, STYLES_PART, FOOTER_PART, "word/_rels/document.xml.rels"] {
            assert!(package.contains(part), "missing {part}");
        }
        let root = document_of(&package);
        assert_eq!(control_text(&root, "SiteName"), "e.g., Oslo Sentrum Tower");

        let index = ControlIndex::build(&root);
        let sdt = root.at_path(&index.paths("SiteName")[0]).unwrap();
        let run = sdt.find("w:r").unwrap();
        let style = RunStyle::of_run(run);
        assert_eq!(style.italic, Some(true));
        assert_eq!(style.color.as_deref(), Some(GRAY_400));
        assert!(sdt.find("w:showingPlcHdr").is_some());
    }

    #[test]
    fn test_dropdown_carries_option_list() {
        let package = ModernTemplateBuilder::new(date()).build().unwrap();
        let root = document_of(&package);
        let index = ControlIndex::build(&root);
        let sdt = root.at_path(&index.paths("SARTVersion")[0]).unwrap();
        let combo = sdt.find("w:comboBox").unwrap();
        let values: Vec<_> = combo.children_named("w:listItem").filter_map(|li| li.attr("w:value")).collect();
        assert_eq!(values, VERSION_OPTIONS);
    }

    #[test]
    fn test_record_defaults_and_gated_detail() {
        let record = SurveyRecord::new()
            .with(FieldId::SiteName, "Kringsjaa Tower")
            .with(FieldId::CraneNeeded, true)
            .with(FieldId::IloqRequired, false)
            .with(FieldId::IloqDetails, "Cylinder EQ-4521");
        let package = ModernTemplateBuilder::new(date()).with_record(&record).build().unwrap();
        let root = document_of(&package);

        assert_eq!(control_text(&root, "SiteName"), "Kringsjaa Tower");
        assert_eq!(control_text(&root, "CraneNeeded"), "Yes");
        assert_eq!(control_text(&root, "iLOQRequired"), "Select...");
        assert_eq!(control_text(&root, "iLOQDetails"), "Location, lock ID, access level...");

        let index = ControlIndex::build(&root);
        let sdt = root.at_path(&index.paths("SiteName")[0]).unwrap();
        assert_eq!(RunStyle::of_run(sdt.find("w:r").unwrap()).italic, None);
    }

    #[test]
    fn test_dividers_header_and_footer() {
        let package = ModernTemplateBuilder::new(date()).build().unwrap();
        let root = document_of(&package);
        let body = root.child("w:body").unwrap();
        let tables: Vec<_> = body.children_named("w:tbl").collect();
        assert_eq!(tables.len(), 2);
        assert!(visible_text(tables[0]).contains("TECHNICAL SITE SURVEY REPORT"));
        assert!(visible_text(tables[0]).contains("14 Mar 2026"));

        let dividers: Vec<String> = tables[1]
            .children_named("w:tr")
            .filter(|tr| tr.find("w:gridSpan").is_some() && tr.find("w:trPr").is_none())
            .map(visible_text)
            .collect();
        assert_eq!(
            dividers,
            vec!["SITE IDENTITY", "SUPPORTING DOCUMENTS", "ACCESS & LOGISTICS", "TSSR ALIGNMENT"]
        );
        assert_eq!(body.elements().last().map(|e| e.name.as_str()), Some("w:sectPr"));

        let footer = package.read_xml(FOOTER_PART).unwrap().root;
        assert_eq!(visible_text(&footer), "TSSR generated by SiteForge  |  2026-03-14  |  v1.0");
    }
}
