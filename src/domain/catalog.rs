//! Product catalog and its spreadsheet anchors

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Physical address of a catalog row, recorded once at import
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogAnchor {
    pub sheet_name: String,
    /// One-based worksheet row
    pub row_index: u32,
    pub product_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSection {
    Product,
    Service,
    Griptel,
    Solar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub anchor: CatalogAnchor,
    pub description: String,
    pub section: CatalogSection,
}

/// A computed requirement: `quantity` of `code`, with how it was derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityLine {
    pub code: String,
    pub quantity: f64,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub actual_quantity: Option<f64>,
    #[serde(default)]
    pub actual_comment: Option<String>,
}

impl QuantityLine {
    pub fn new(code: &str, quantity: f64, explanation: &str) -> Self {
        Self {
            code: code.to_string(),
            quantity,
            explanation: explanation.to_string(),
            actual_quantity: None,
            actual_comment: None,
        }
    }
}

/// A quantity line translated to its workbook address
#[derive(Debug, Clone, PartialEq)]
pub struct AnchoredQuantity {
    pub anchor: CatalogAnchor,
    pub quantity: f64,
    pub actual_quantity: Option<f64>,
    pub actual_comment: Option<String>,
}

/// Read-only address book from product code to anchor
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_code: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let mut by_code = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let code = entry.anchor.product_code.clone();
            if by_code.contains_key(&code) {
                log::debug!(
                    "Duplicate catalog code {} at {}!{}, keeping first",
                    code,
                    entry.anchor.sheet_name,
                    entry.anchor.row_index
                );
                continue;
            }
            by_code.insert(code, i);
        }
        Self { entries, by_code }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn anchor_of(&self, code: &str) -> Option<&CatalogAnchor> {
        self.by_code.get(code).map(|&i| &self.entries[i].anchor)
    }

    /// Attach anchors to computed lines; unknown codes are dropped
    pub fn anchor_lines(&self, lines: &[QuantityLine]) -> Vec<AnchoredQuantity> {
        lines
            .iter()
            .filter_map(|line| {
                let Some(anchor) = self.anchor_of(&line.code) else {
                    log::info!("Product code {} not in catalog, skipping", line.code);
                    return None;
                };
                Some(AnchoredQuantity {
                    anchor: anchor.clone(),
                    quantity: line.quantity,
                    actual_quantity: line.actual_quantity,
                    actual_comment: line.actual_comment.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sheet: &str, row: u32, code: &str) -> CatalogEntry {
        CatalogEntry {
            anchor: CatalogAnchor {
                sheet_name: sheet.into(),
                row_index: row,
                product_code: code.into(),
            },
            description: String::new(),
            section: CatalogSection::Product,
        }
    }

    #[test]
    fn test_anchor_lines_drops_unknown_codes() {
        let catalog = Catalog::new(vec![entry("BoQ", 12, "KRE-101"), entry("BoM Solar", 11, "SOL-1")]);
        let lines = vec![
            QuantityLine::new("KRE-101", 3.0, "3 sectors"),
            QuantityLine::new("NOPE", 1.0, ""),
            QuantityLine::new("SOL-1", 0.0, ""),
        ];
        let anchored = catalog.anchor_lines(&lines);
        assert_eq!(anchored.len(), 2);
        assert_eq!(anchored[0].anchor.row_index, 12);
        assert_eq!(anchored[1].anchor.sheet_name, "BoM Solar");
    }

    #[test]
    fn test_duplicate_codes_keep_first_anchor() {
        let catalog = Catalog::new(vec![entry("BoQ", 12, "A"), entry("BoQ", 40, "A")]);
        assert_eq!(catalog.anchor_of("A").map(|a| a.row_index), Some(12));
        assert_eq!(catalog.entries().len(), 2);
    }
}
