//! Office Open XML plumbing shared by the word-processing and spreadsheet writers
//!
//! - `xml`: owned, mutable element tree (quick-xml underneath)
//! - `package`: zip container of named parts
//! - `rels`: relationship and content-type bookkeeping

pub mod package;
pub mod rels;
pub mod xml;

pub use package::Package;
pub use rels::{ContentTypes, Relationships};
pub use xml::{Element, Node, NodePath, XmlDocument};

/// In-memory templates for unit tests
#[cfg(test)]
pub(crate) mod fixtures {
    use super::Package;

    pub const W_NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

    /// A word-processing package whose body is `body_xml`
    pub fn docx_with_body(body_xml: &str) -> Package {
        let mut pkg = Package::new();
        pkg.set_part(
            "[Content_Types].xml",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#
                .to_vec(),
        );
        pkg.set_part(
            "_rels/.rels",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#
                .to_vec(),
        );
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document {W_NS}><w:body>{body_xml}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
        );
        pkg.set_part("word/document.xml", document.into_bytes());
        pkg
    }

    /// Write a package to a temp dir and return the file path
    pub fn write_temp(dir: &std::path::Path, name: &str, pkg: &Package) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, pkg.to_bytes().unwrap()).unwrap();
        path
    }

    /// A macro-enabled workbook with one worksheet per `(name, sheet_data_xml)`
    pub fn xlsm_with_sheets(sheets: &[(&str, &str)]) -> Package {
        let mut pkg = Package::new();
        let mut overrides = String::new();
        let mut sheet_entries = String::new();
        let mut rels = String::new();
        for (i, (name, data)) in sheets.iter().enumerate() {
            let n = i + 1;
            overrides.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            ));
            sheet_entries.push_str(&format!(r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
            ));
            pkg.set_part(
                &format!("xl/worksheets/sheet{n}.xml"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheetData>{data}</sheetData><dataValidations count="1"><dataValidation type="whole" sqref="D11:D500"/></dataValidations></worksheet>"#
                )
                .into_bytes(),
            );
        }
        let vba_rel_id = sheets.len() + 1;
        rels.push_str(&format!(
            r#"<Relationship Id="rId{vba_rel_id}" Type="http://schemas.microsoft.com/office/2006/relationships/vbaProject" Target="vbaProject.bin"/>"#
        ));

        pkg.set_part(
            "[Content_Types].xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="bin" ContentType="application/vnd.ms-office.vbaProject"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.ms-excel.sheet.macroEnabled.main+xml"/>{overrides}</Types>"#
            )
            .into_bytes(),
        );
        pkg.set_part(
            "xl/workbook.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_entries}</sheets><definedNames><definedName name="Qty">BoQ!$D$11:$D$500</definedName></definedNames><calcPr calcId="191029"/></workbook>"#
            )
            .into_bytes(),
        );
        pkg.set_part(
            "xl/_rels/workbook.xml.rels",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            )
            .into_bytes(),
        );
        pkg.set_part("xl/vbaProject.bin", b"\xd0\xcf\x11\xe0fake-vba".to_vec());
        pkg
    }
}
