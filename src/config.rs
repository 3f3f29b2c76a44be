//! Export configuration: templates, layouts, palette and the field map

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::docx::AppendixLayout;
use crate::domain::FieldMap;
use crate::xlsx::{CatalogLayout, SheetLayout};

const CONFIG_DIR: &str = "siteforge";
const CONFIG_FILE: &str = "export.json";

/// Serializable color representation for config storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for ShapeColor {
    fn default() -> Self {
        Self::from_rgb8(255, 0, 0)
    }
}

impl ShapeColor {
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
        }
    }

    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            255,
        ]
    }
}

/// Named annotation colors with a fallback for unknown names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    #[serde(default = "default_palette_colors")]
    pub colors: BTreeMap<String, ShapeColor>,
    #[serde(default)]
    pub fallback: ShapeColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: default_palette_colors(),
            fallback: ShapeColor::default(),
        }
    }
}

impl Palette {
    /// Color for `name`, or the fallback when the name is unknown
    pub fn resolve(&self, name: &str) -> ShapeColor {
        match self.colors.get(&name.to_ascii_lowercase()) {
            Some(color) => *color,
            None => {
                log::warn!("Unknown annotation color {name:?}, using fallback");
                self.fallback
            }
        }
    }
}

fn default_palette_colors() -> BTreeMap<String, ShapeColor> {
    [
        ("red", ShapeColor::from_rgb8(255, 0, 0)),
        ("yellow", ShapeColor::from_rgb8(255, 255, 0)),
        ("blue", ShapeColor::from_rgb8(0, 100, 255)),
        ("white", ShapeColor::from_rgb8(255, 255, 255)),
        ("black", ShapeColor::from_rgb8(0, 0, 0)),
    ]
    .into_iter()
    .map(|(name, color)| (name.to_string(), color))
    .collect()
}

/// Everything an export needs besides the per-project data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Survey template patched by legacy exports
    #[serde(default = "default_legacy_template")]
    pub legacy_template: PathBuf,

    /// Macro-enabled quantity workbook template
    #[serde(default = "default_workbook_template")]
    pub workbook_template: PathBuf,

    #[serde(default)]
    pub appendix: AppendixLayout,

    #[serde(default)]
    pub palette: Palette,

    #[serde(default)]
    pub sheet_layout: SheetLayout,

    #[serde(default)]
    pub catalog_layout: CatalogLayout,

    #[serde(default)]
    pub field_map: FieldMap,
}

fn default_legacy_template() -> PathBuf {
    PathBuf::from("templates/tssr_template.docx")
}

fn default_workbook_template() -> PathBuf {
    PathBuf::from("templates/boq_template.xlsm")
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            legacy_template: default_legacy_template(),
            workbook_template: default_workbook_template(),
            appendix: AppendixLayout::default(),
            palette: Palette::default(),
            sheet_layout: SheetLayout::default(),
            catalog_layout: CatalogLayout::default(),
            field_map: FieldMap::default(),
        }
    }
}

impl ExportConfig {
    /// Default location, `<config dir>/siteforge/export.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults on any failure
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            log::warn!("No config directory available, using default export config");
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No export config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading export config, using defaults: {err:?}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }
}
