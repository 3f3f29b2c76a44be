//! As-built version counters and export filenames

use serde::{Deserialize, Serialize};

/// Identifier used when a project has none
pub const FALLBACK_IDENTIFIER: &str = "export";

/// Per-project, per-document-kind as-built counter, owned by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportVersionCounter(pub u32);

impl ExportVersionCounter {
    /// Counter after one more as-built export
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Technical site survey report
    Tssr,
    /// Bill of quantities
    Boq,
}

impl DocumentKind {
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Tssr => "TSSR",
            DocumentKind::Boq => "BOQ",
        }
    }
}

/// `<identifier>_<KIND>[_AsBuilt_vNN].<extension>`
///
/// Path separators and other characters a file name cannot hold become `_`.
pub fn export_filename(
    identifier: &str,
    kind: DocumentKind,
    as_built: Option<ExportVersionCounter>,
    extension: &str,
) -> String {
    let identifier: String = match identifier.trim() {
        "" => FALLBACK_IDENTIFIER.to_string(),
        id => id
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect(),
    };
    match as_built {
        Some(ExportVersionCounter(v)) => {
            format!("{identifier}_{}_AsBuilt_v{v:02}.{extension}", kind.label())
        }
        None => format!("{identifier}_{}.{extension}", kind.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filenames() {
        assert_eq!(export_filename("OSL-1234", DocumentKind::Tssr, None, "docx"), "OSL-1234_TSSR.docx");
        assert_eq!(
            export_filename("OSL-1234", DocumentKind::Boq, Some(ExportVersionCounter(3)), "xlsm"),
            "OSL-1234_BOQ_AsBuilt_v03.xlsm"
        );
        assert_eq!(
            export_filename(" ", DocumentKind::Tssr, Some(ExportVersionCounter(12)), "docx"),
            "export_TSSR_AsBuilt_v12.docx"
        );
    }

    #[test]
    fn test_filename_stays_in_its_directory() {
        assert_eq!(
            export_filename("../../etc/OSL:1", DocumentKind::Tssr, None, "docx"),
            ".._.._etc_OSL_1_TSSR.docx"
        );
        assert_eq!(export_filename("a\\b", DocumentKind::Boq, None, "xlsx"), "a_b_BOQ.xlsx");
    }

    #[test]
    fn test_counter_next() {
        assert_eq!(ExportVersionCounter(0).next(), ExportVersionCounter(1));
        assert_eq!(ExportVersionCounter(u32::MAX).next(), ExportVersionCounter(u32::MAX));
    }
}
