//! Photos attached to a project, as handed over by photo storage

use std::path::PathBuf;

use serde::Deserialize;

use super::annotation::AnnotationPrimitive;

/// Section of photos stored without one
pub const DEFAULT_SECTION: &str = "other";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Planning,
    AsBuilt,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    pub id: String,
    /// Resolved absolute path of the stored file
    pub file_path: PathBuf,
    #[serde(default)]
    pub original_filename: String,
    #[serde(default)]
    pub auto_filename: Option<String>,
    #[serde(default = "default_section")]
    pub section: String,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub annotations: Vec<AnnotationPrimitive>,
}

fn default_section() -> String {
    DEFAULT_SECTION.to_string()
}

impl PhotoRecord {
    pub fn new(id: &str, file_path: impl Into<PathBuf>, section: &str) -> Self {
        let file_path = file_path.into();
        let original_filename = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            id: id.to_string(),
            file_path,
            original_filename,
            auto_filename: None,
            section: section.to_string(),
            phase: Phase::Planning,
            sort_order: 0,
            caption: None,
            annotations: Vec::new(),
        }
    }

    /// Caption line printed under the embedded image
    pub fn caption_text(&self) -> String {
        let base = self
            .auto_filename
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.original_filename);
        match self.caption.as_deref().filter(|c| !c.is_empty()) {
            Some(caption) => format!("{base} \u{2014} {caption}"),
            None => base.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_prefers_auto_filename() {
        let mut photo = PhotoRecord::new("p1", "/data/IMG_0001.jpg", "site_overview");
        assert_eq!(photo.caption_text(), "IMG_0001.jpg");
        photo.auto_filename = Some("OSL-1234_overview_01.jpg".into());
        photo.caption = Some("North face".into());
        assert_eq!(photo.caption_text(), "OSL-1234_overview_01.jpg \u{2014} North face");
    }

    #[test]
    fn test_deserialize_storage_json() {
        let json = r#"{
            "id": "a1", "filePath": "/srv/p/a1.jpg", "originalFilename": "a1.jpg",
            "section": "cable_route", "phase": "as_built", "sortOrder": 2,
            "annotations": [{"type": "line", "points": [{"x": 0, "y": 0}, {"x": 4, "y": 4}]}]
        }"#;
        let photo: PhotoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(photo.phase, Phase::AsBuilt);
        assert_eq!(photo.sort_order, 2);
        assert_eq!(photo.annotations.len(), 1);
    }

    #[test]
    fn test_missing_section_files_under_other() {
        let photo: PhotoRecord = serde_json::from_str(r#"{"id": "b", "filePath": "/srv/p/b.jpg"}"#).unwrap();
        assert_eq!(photo.section, DEFAULT_SECTION);
    }
}
