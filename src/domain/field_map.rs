//! Declarative mapping from survey fields to template locations
//!
//! A template revision ships with exactly one `FieldMap`. Tagged entries address
//! structured controls by their tag; positional entries address a fixed
//! `(table, row, col)` in templates that carry no control there. Both go through
//! the same value resolution so swapping a template only means swapping the map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::fields::{FieldId, SurveyRecord};

/// First entry of every legacy dropdown; never a real choice
pub const DROPDOWN_PLACEHOLDER: &str = "Choose an item.";

/// How a field reaches the template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Tag,
    PositionalCell,
}

/// Where a field is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    /// Every structured control whose tag equals `tag`
    Tag { tag: String },
    /// A body-level table cell, all indices zero-based
    PositionalCell { table: usize, row: usize, col: usize },
}

/// What to emit when a prefixed field resolves to nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPrefix {
    /// Keep the label, e.g. `"Site Owner:"`
    #[default]
    LabelOnly,
    /// Write nothing at all
    Suppress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapEntry {
    pub source: FieldId,
    pub target: Target,
    /// Field that must be truthy for `source` to be written
    #[serde(default)]
    pub condition: Option<FieldId>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub empty_prefix: EmptyPrefix,
    /// Selectable options of a dropdown control, including any placeholder entry
    #[serde(default)]
    pub options: Vec<String>,
}

impl FieldMapEntry {
    pub fn tag(source: FieldId, tag: &str) -> Self {
        Self {
            source,
            target: Target::Tag {
                tag: tag.to_string(),
            },
            condition: None,
            prefix: None,
            empty_prefix: EmptyPrefix::default(),
            options: Vec::new(),
        }
    }

    pub fn cell(source: FieldId, table: usize, row: usize, col: usize) -> Self {
        Self {
            source,
            target: Target::PositionalCell { table, row, col },
            condition: None,
            prefix: None,
            empty_prefix: EmptyPrefix::default(),
            options: Vec::new(),
        }
    }

    pub fn when(mut self, condition: FieldId) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn with_empty_prefix(mut self, policy: EmptyPrefix) -> Self {
        self.empty_prefix = policy;
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn kind(&self) -> ControlKind {
        match self.target {
            Target::Tag { .. } => ControlKind::Tag,
            Target::PositionalCell { .. } => ControlKind::PositionalCell,
        }
    }

    /// Text to write for this entry given the current record
    pub fn resolve(&self, record: &SurveyRecord) -> String {
        let gated = self.condition.is_some_and(|c| !record.is_truthy(c));
        let value = if gated {
            String::new()
        } else {
            record.text(self.source)
        };

        match (&self.prefix, value.is_empty()) {
            (None, _) => value,
            (Some(prefix), false) => format!("{prefix}{value}"),
            (Some(prefix), true) => match self.empty_prefix {
                EmptyPrefix::LabelOnly if !prefix.is_empty() => {
                    format!("{}:", prefix.trim_end_matches([':', ' ']))
                }
                _ => String::new(),
            },
        }
    }
}

/// The full field table of one template revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    entries: Vec<FieldMapEntry>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self::legacy()
    }
}

impl FieldMap {
    pub fn new(entries: Vec<FieldMapEntry>) -> Self {
        Self { entries }
    }

    /// Map for the legacy OneCo survey template
    pub fn legacy() -> Self {
        const VERSIONS: &[&str] = &[
            DROPDOWN_PLACEHOLDER,
            "No",
            "NA",
            "v01",
            "v02",
            "v03",
            "v04",
            "v05",
            "v06",
            "v07",
            "v08",
            "v09",
            "v10",
        ];
        const YES_NO: &[&str] = &[DROPDOWN_PLACEHOLDER, "Yes", "No"];

        Self::new(vec![
            // Table 0: site identity
            FieldMapEntry::tag(FieldId::SiteName, "SiteName"),
            FieldMapEntry::tag(FieldId::SiteId, "SiteID"),
            FieldMapEntry::tag(FieldId::SiteType, "ContractualModel").with_options(&[
                DROPDOWN_PLACEHOLDER,
                "Not Applicable",
                "Private Site",
                "Coloc",
                "Greenfield",
            ]),
            FieldMapEntry::tag(FieldId::SiteOwnerOffer, "SiteOwnerOfferVersion").with_options(VERSIONS),
            // sic, the template misspells this tag
            FieldMapEntry::tag(FieldId::Montasjeunderlag, "MontasjeunderlagVesrion").with_options(VERSIONS),
            FieldMapEntry::tag(FieldId::Sart, "SART Version").with_options(VERSIONS),
            FieldMapEntry::tag(FieldId::Veiviser, "VeiviserAvailable").with_options(YES_NO),
            FieldMapEntry::tag(FieldId::RfsrRnp, "RFSRVersion").with_options(VERSIONS),
            FieldMapEntry::tag(FieldId::GuidelineVersion, "OtherSupportingDocuments"),
            FieldMapEntry::tag(FieldId::IloqDetails, "iLOQDetails").when(FieldId::IloqRequired),
            // Table 0: cells without controls
            FieldMapEntry::cell(FieldId::Customer, 0, 3, 1),
            FieldMapEntry::cell(FieldId::SiteOwner, 0, 4, 0).with_prefix("Site Owner: "),
            FieldMapEntry::cell(FieldId::VeiviserComments, 0, 10, 1),
            FieldMapEntry::cell(FieldId::IloqDetails, 0, 11, 1).when(FieldId::IloqRequired),
            // Table 1: alignment
            FieldMapEntry::tag(FieldId::TssrAlignment, "TSSRAligned").with_options(YES_NO),
            FieldMapEntry::cell(FieldId::TssrAlignmentComments, 1, 3, 0),
        ])
    }

    pub fn entries(&self) -> &[FieldMapEntry] {
        &self.entries
    }

    pub fn of_kind(&self, kind: ControlKind) -> impl Iterator<Item = &FieldMapEntry> {
        self.entries.iter().filter(move |e| e.kind() == kind)
    }

    /// Selectable values per dropdown field, placeholder excluded
    pub fn dropdown_options(&self) -> BTreeMap<FieldId, Vec<String>> {
        self.entries
            .iter()
            .filter(|e| !e.options.is_empty())
            .map(|e| {
                let options = e
                    .options
                    .iter()
                    .filter(|o| o.as_str() != DROPDOWN_PLACEHOLDER)
                    .cloned()
                    .collect();
                (e.source, options)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_forces_empty() {
        let entry = FieldMapEntry::tag(FieldId::IloqDetails, "iLOQDetails").when(FieldId::IloqRequired);
        let record = SurveyRecord::new()
            .with(FieldId::IloqDetails, "Cylinder EQ-4521")
            .with(FieldId::IloqRequired, false);
        assert_eq!(entry.resolve(&record), "");

        let record = record.with(FieldId::IloqRequired, true);
        assert_eq!(entry.resolve(&record), "Cylinder EQ-4521");

        // Absent condition field is falsy too
        let record = SurveyRecord::new().with(FieldId::IloqDetails, "X");
        assert_eq!(entry.resolve(&record), "");
    }

    #[test]
    fn test_prefix_applies_only_to_values() {
        let entry = FieldMapEntry::cell(FieldId::SiteOwner, 0, 4, 0).with_prefix("Site Owner: ");
        let record = SurveyRecord::new().with(FieldId::SiteOwner, "Telia Infra");
        assert_eq!(entry.resolve(&record), "Site Owner: Telia Infra");
        assert_eq!(entry.resolve(&SurveyRecord::new()), "Site Owner:");

        let suppressed = entry.with_empty_prefix(EmptyPrefix::Suppress);
        assert_eq!(suppressed.resolve(&SurveyRecord::new()), "");
    }

    #[test]
    fn test_dropdown_options_exclude_placeholder() {
        let options = FieldMap::legacy().dropdown_options();
        assert_eq!(options[&FieldId::Veiviser], vec!["Yes", "No"]);
        assert_eq!(options[&FieldId::Sart].len(), 12);
        assert!(!options.contains_key(&FieldId::SiteName));
    }

    #[test]
    fn test_map_roundtrips_through_json() {
        let map = FieldMap::legacy();
        let json = serde_json::to_string(&map).unwrap();
        let back: FieldMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
        assert_eq!(map.of_kind(ControlKind::PositionalCell).count(), 5);
    }
}
