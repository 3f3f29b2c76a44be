//! Zip container holding the parts of an Office document

use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::xml::XmlDocument;
use crate::error::{ExportError, Result};

/// All parts of a package, in their original archive order
///
/// Parts that the export never touches (macros, themes, data validation,
/// printer settings) pass through byte for byte.
#[derive(Clone, Debug, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a template from disk; a missing or unreadable file is fatal
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ExportError::TemplateNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path).map_err(|source| ExportError::TemplateUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Opened template {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push((name, data));
        }
        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// Replace a part in place, or append it when new
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        if let Some((_, existing)) = self.parts.iter_mut().find(|(n, _)| n == name) {
            *existing = data;
            return;
        }
        self.parts.push((name.to_string(), data));
    }

    pub fn remove_part(&mut self, name: &str) -> bool {
        let before = self.parts.len();
        self.parts.retain(|(n, _)| n != name);
        before != self.parts.len()
    }

    pub fn read_xml(&self, name: &str) -> Result<XmlDocument> {
        let bytes = self.part(name).ok_or_else(|| ExportError::MissingPart {
            part: name.to_string(),
        })?;
        XmlDocument::parse(name, bytes)
    }

    pub fn write_xml(&mut self, name: &str, doc: &XmlDocument) -> Result<()> {
        let bytes = doc.to_bytes(name)?;
        self.set_part(name, bytes);
        Ok(())
    }

    /// First part name under `prefix` that is not taken, e.g. `word/media/image3.jpeg`
    pub fn unused_part_name(&self, prefix: &str, extension: &str) -> String {
        (1..)
            .map(|i| format!("{prefix}{i}.{extension}"))
            .find(|name| !self.contains(name))
            .unwrap_or_else(|| format!("{prefix}.{extension}"))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_keeps_part_order_and_bytes() {
        let mut pkg = Package::new();
        pkg.set_part("[Content_Types].xml", b"<Types/>".to_vec());
        pkg.set_part("xl/vbaProject.bin", vec![0, 1, 2, 3]);
        let bytes = pkg.to_bytes().unwrap();

        let reopened = Package::from_bytes(&bytes).unwrap();
        let names: Vec<_> = reopened.part_names().collect();
        assert_eq!(names, vec!["[Content_Types].xml", "xl/vbaProject.bin"]);
        assert_eq!(reopened.part("xl/vbaProject.bin"), Some(&[0u8, 1, 2, 3][..]));
    }

    #[test]
    fn test_open_missing_template_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.docx");
        match Package::open(&path) {
            Err(ExportError::TemplateNotFound { path: p }) => assert_eq!(p, path),
            other => panic!("expected TemplateNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_unused_part_name_skips_taken_names() {
        let mut pkg = Package::new();
        pkg.set_part("word/media/image1.png", Vec::new());
        assert_eq!(
            pkg.unused_part_name("word/media/image", "jpeg"),
            "word/media/image1.jpeg"
        );
        assert_eq!(
            pkg.unused_part_name("word/media/image", "png"),
            "word/media/image2.png"
        );
    }
}
