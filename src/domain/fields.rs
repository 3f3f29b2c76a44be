//! Survey record fields
//!
//! Records arrive as flat JSON objects. Keys are a closed set: an unknown key
//! fails deserialization instead of silently resolving to nothing at export time.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Every field a survey record may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    #[serde(alias = "siteName")]
    SiteName,
    #[serde(alias = "siteId")]
    SiteId,
    #[serde(alias = "siteModel")]
    SiteModel,
    #[serde(alias = "siteType")]
    SiteType,
    Customer,
    #[serde(alias = "siteOwner")]
    SiteOwner,
    #[serde(alias = "siteCategory")]
    SiteCategory,
    #[serde(alias = "siteOwnerOffer")]
    SiteOwnerOffer,
    Montasjeunderlag,
    Sart,
    Veiviser,
    #[serde(alias = "rfsrRnp")]
    RfsrRnp,
    #[serde(alias = "guidelineVersion")]
    GuidelineVersion,
    #[serde(alias = "veiviserComments")]
    VeiviserComments,
    #[serde(alias = "iloqRequired")]
    IloqRequired,
    #[serde(alias = "iloqDetails")]
    IloqDetails,
    #[serde(alias = "accessInstructions")]
    AccessInstructions,
    #[serde(alias = "craneNeeded")]
    CraneNeeded,
    #[serde(alias = "tssrAlignment")]
    TssrAlignment,
    #[serde(alias = "tssrAlignmentComments")]
    TssrAlignmentComments,
}

impl FieldId {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldId::SiteName => "site_name",
            FieldId::SiteId => "site_id",
            FieldId::SiteModel => "site_model",
            FieldId::SiteType => "site_type",
            FieldId::Customer => "customer",
            FieldId::SiteOwner => "site_owner",
            FieldId::SiteCategory => "site_category",
            FieldId::SiteOwnerOffer => "site_owner_offer",
            FieldId::Montasjeunderlag => "montasjeunderlag",
            FieldId::Sart => "sart",
            FieldId::Veiviser => "veiviser",
            FieldId::RfsrRnp => "rfsr_rnp",
            FieldId::GuidelineVersion => "guideline_version",
            FieldId::VeiviserComments => "veiviser_comments",
            FieldId::IloqRequired => "iloq_required",
            FieldId::IloqDetails => "iloq_details",
            FieldId::AccessInstructions => "access_instructions",
            FieldId::CraneNeeded => "crane_needed",
            FieldId::TssrAlignment => "tssr_alignment",
            FieldId::TssrAlignmentComments => "tssr_alignment_comments",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value as stored by the survey form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// `false`, zero and empty text are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Number(n) => *n != 0.0,
            FieldValue::Text(s) => !s.is_empty(),
        }
    }

    /// Text as it should appear in a document; falsy values render empty
    pub fn display(&self) -> String {
        if !self.is_truthy() {
            return String::new();
        }
        match self {
            FieldValue::Flag(_) => "Yes".to_string(),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

/// Current state of a project's survey form
///
/// JSON `null` values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<FieldId, Option<FieldValue>>",
    into = "BTreeMap<FieldId, FieldValue>"
)]
pub struct SurveyRecord {
    values: BTreeMap<FieldId, FieldValue>,
}

impl From<BTreeMap<FieldId, Option<FieldValue>>> for SurveyRecord {
    fn from(raw: BTreeMap<FieldId, Option<FieldValue>>) -> Self {
        Self {
            values: raw.into_iter().filter_map(|(k, v)| Some((k, v?))).collect(),
        }
    }
}

impl From<SurveyRecord> for BTreeMap<FieldId, FieldValue> {
    fn from(record: SurveyRecord) -> Self {
        record.values
    }
}

impl SurveyRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: FieldId, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: FieldId, value: impl Into<FieldValue>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: FieldId) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    pub fn is_truthy(&self, field: FieldId) -> bool {
        self.get(field).is_some_and(FieldValue::is_truthy)
    }

    /// Display text of a field, empty when absent or falsy
    pub fn text(&self, field: FieldId) -> String {
        self.get(field).map(FieldValue::display).unwrap_or_default()
    }
}
