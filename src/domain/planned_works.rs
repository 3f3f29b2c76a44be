//! Free-text description of planned works

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannedWorks {
    #[serde(default)]
    pub sections: Vec<PlannedSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannedSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<PlannedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedItem {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub manual_fields: Vec<ManualField>,
    /// How the item was derived, shown as a muted trailing note
    #[serde(default)]
    pub derivation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualField {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: String,
}

impl PlannedWorks {
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| !s.is_renderable())
    }
}

impl PlannedSection {
    pub fn is_renderable(&self) -> bool {
        !self.title.is_empty() && !self.items.is_empty()
    }
}

impl PlannedItem {
    /// Item text, or its non-empty manual fields joined as `label: value; ...`
    pub fn display_text(&self) -> Option<String> {
        let text = self.text.trim();
        if !text.is_empty() {
            return Some(text.to_string());
        }
        let parts: Vec<String> = self
            .manual_fields
            .iter()
            .filter_map(|f| {
                let value = f.value.trim();
                if value.is_empty() {
                    None
                } else if f.label.is_empty() {
                    Some(value.to_string())
                } else {
                    Some(format!("{}: {}", f.label, value))
                }
            })
            .collect();
        (!parts.is_empty()).then(|| parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text_from_manual_fields() {
        let item = PlannedItem {
            text: "  ".into(),
            manual_fields: vec![
                ManualField {
                    label: "Cable".into(),
                    value: "RG-214".into(),
                },
                ManualField {
                    label: "Length".into(),
                    value: "".into(),
                },
                ManualField {
                    label: "".into(),
                    value: "outdoor".into(),
                },
            ],
            derivation: None,
        };
        assert_eq!(item.display_text().as_deref(), Some("Cable: RG-214; outdoor"));
        assert_eq!(PlannedItem::default().display_text(), None);
    }

    #[test]
    fn test_sections_without_title_or_items_are_empty() {
        let works = PlannedWorks {
            sections: vec![PlannedSection {
                title: "Power".into(),
                items: vec![],
            }],
        };
        assert!(works.is_empty());
    }
}
