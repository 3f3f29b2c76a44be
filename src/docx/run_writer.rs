//! Replace the text of a run container while keeping its formatting
//!
//! Two layouts occur in practice: runs sitting directly in the container
//! (inline content controls, common inside table cells) and runs wrapped in a
//! paragraph. Both collapse to a single run that keeps the first run's `w:rPr`.

use crate::ooxml::{Element, Node};

pub const W_P: &str = "w:p";
pub const W_R: &str = "w:r";
pub const W_T: &str = "w:t";
pub const W_BR: &str = "w:br";
pub const W_RPR: &str = "w:rPr";
pub const W_PPR: &str = "w:pPr";

/// Character formatting carried from one run to another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Half-points, as stored in `w:sz`
    pub size: Option<u32>,
    pub family: Option<String>,
    /// Hex RGB without `#`
    pub color: Option<String>,
}

impl RunStyle {
    /// Snapshot the formatting of `run`
    pub fn of_run(run: &Element) -> Self {
        let Some(rpr) = run.child(W_RPR) else {
            return Self::default();
        };
        Self {
            bold: rpr.child("w:b").map(toggle_value),
            italic: rpr.child("w:i").map(toggle_value),
            size: rpr
                .child("w:sz")
                .and_then(|sz| sz.attr("w:val"))
                .and_then(|v| v.parse().ok()),
            family: rpr
                .child("w:rFonts")
                .and_then(|f| f.attr("w:ascii").or_else(|| f.attr("w:hAnsi")))
                .map(str::to_string),
            color: rpr
                .child("w:color")
                .and_then(|c| c.attr("w:val"))
                .filter(|v| *v != "auto")
                .map(str::to_string),
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = Some(true);
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = Some(true);
        self
    }

    /// Size in points; stored as half-points
    pub fn points(mut self, points: f32) -> Self {
        self.size = Some((points * 2.0).round() as u32);
        self
    }

    pub fn family(mut self, family: &str) -> Self {
        self.family = Some(family.to_string());
        self
    }

    pub fn color(mut self, hex: &str) -> Self {
        self.color = Some(hex.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `w:rPr` in schema order, or `None` when nothing is set
    pub fn to_rpr(&self) -> Option<Element> {
        if self.is_empty() {
            return None;
        }
        let mut rpr = Element::new(W_RPR);
        if let Some(family) = &self.family {
            rpr.push(
                Element::new("w:rFonts")
                    .with_attr("w:ascii", family.as_str())
                    .with_attr("w:hAnsi", family.as_str())
                    .with_attr("w:cs", family.as_str()),
            );
        }
        if let Some(bold) = self.bold {
            rpr.push(toggle("w:b", bold));
        }
        if let Some(italic) = self.italic {
            rpr.push(toggle("w:i", italic));
        }
        if let Some(color) = &self.color {
            rpr.push(Element::new("w:color").with_attr("w:val", color.as_str()));
        }
        if let Some(size) = self.size {
            rpr.push(Element::new("w:sz").with_attr("w:val", size.to_string()));
            rpr.push(Element::new("w:szCs").with_attr("w:val", size.to_string()));
        }
        Some(rpr)
    }
}

fn toggle_value(el: &Element) -> bool {
    !matches!(el.attr("w:val"), Some("0" | "false" | "off"))
}

fn toggle(name: &str, on: bool) -> Element {
    if on {
        Element::new(name)
    } else {
        Element::new(name).with_attr("w:val", "0")
    }
}

/// A run carrying `text` with `style`
pub fn make_run(text: &str, style: &RunStyle) -> Element {
    let mut run = Element::new(W_R);
    if let Some(rpr) = style.to_rpr() {
        run.push(rpr);
    }
    set_run_text(&mut run, text);
    run
}

/// Replace everything but `w:rPr` in a run with `text`; newlines become `w:br`
pub fn set_run_text(run: &mut Element, text: &str) {
    run.retain_elements(|e| e.name == W_RPR);
    run.children.retain(|n| matches!(n, Node::Element(_)));
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run.push(Element::new(W_BR));
        }
        run.push(
            Element::new(W_T)
                .with_attr("xml:space", "preserve")
                .with_text(line),
        );
    }
}

/// Collapse the runs of `container` into one run holding `text`
///
/// The surviving run is the first existing one, so its formatting is kept.
/// A paragraph without runs gets a fresh unstyled run. A container holding
/// neither runs nor paragraphs is left untouched.
pub fn write_text(container: &mut Element, text: &str) {
    if container.position_of(W_R).is_some() {
        collapse_runs(container, text);
        return;
    }
    if container.position_of(W_P).is_some() {
        let mut seen_first = false;
        container.retain_elements(|e| {
            if e.name != W_P {
                return true;
            }
            let keep = !seen_first;
            seen_first = true;
            keep
        });
        if let Some(paragraph) = container.child_mut(W_P) {
            if paragraph.position_of(W_R).is_some() {
                collapse_runs(paragraph, text);
            } else {
                paragraph.push(make_run(text, &RunStyle::default()));
            }
        }
    }
}

fn collapse_runs(parent: &mut Element, text: &str) {
    let mut seen_first = false;
    parent.retain_elements(|e| {
        if e.name != W_R {
            return true;
        }
        let keep = !seen_first;
        seen_first = true;
        keep
    });
    if let Some(run) = parent.child_mut(W_R) {
        set_run_text(run, text);
    }
}

/// Text a reader would see, with `w:br` as newline and paragraphs joined by newline
pub fn visible_text(container: &Element) -> String {
    let mut out = String::new();
    collect_visible(container, &mut out);
    out
}

fn collect_visible(el: &Element, out: &mut String) {
    let mut paragraphs = 0;
    for child in el.elements() {
        match child.name.as_str() {
            W_T => out.push_str(&child.text()),
            W_BR | "w:cr" => out.push('\n'),
            "w:tab" => out.push('\t'),
            W_RPR | W_PPR | "w:sdtPr" => {}
            W_P => {
                if paragraphs > 0 {
                    out.push('\n');
                }
                paragraphs += 1;
                collect_visible(child, out);
            }
            _ => collect_visible(child, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::XmlDocument;

    fn parse(xml: &str) -> Element {
        XmlDocument::parse("t.xml", xml.as_bytes()).unwrap().root
    }

    #[test]
    fn test_direct_runs_collapse_to_first() {
        let mut content = parse(
            r#"<w:sdtContent><w:r><w:rPr><w:b/><w:sz w:val="20"/></w:rPr><w:t>Choose</w:t></w:r><w:r><w:t> an item.</w:t></w:r></w:sdtContent>"#,
        );
        write_text(&mut content, "Coloc");
        assert_eq!(content.children_named(W_R).count(), 1);
        assert_eq!(visible_text(&content), "Coloc");
        let run = content.child(W_R).unwrap();
        let style = RunStyle::of_run(run);
        assert_eq!(style.bold, Some(true));
        assert_eq!(style.size, Some(20));
    }

    #[test]
    fn test_paragraph_layout_keeps_style_and_drops_extra_paragraphs() {
        let mut content = parse(
            r#"<w:sdtContent><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:i/><w:color w:val="FF0000"/></w:rPr><w:t>old</w:t></w:r><w:r><w:t>er</w:t></w:r></w:p><w:p><w:r><w:t>second</w:t></w:r></w:p></w:sdtContent>"#,
        );
        write_text(&mut content, "line one\nline two");
        assert_eq!(content.children_named(W_P).count(), 1);
        let p = content.child(W_P).unwrap();
        assert!(p.child(W_PPR).is_some());
        assert_eq!(visible_text(&content), "line one\nline two");
        let style = RunStyle::of_run(p.child(W_R).unwrap());
        assert_eq!(style.italic, Some(true));
        assert_eq!(style.color.as_deref(), Some("FF0000"));
    }

    #[test]
    fn test_paragraph_without_runs_gets_unstyled_run() {
        let mut content = parse("<w:sdtContent><w:p/></w:sdtContent>");
        write_text(&mut content, "x");
        let run = content.child(W_P).unwrap().child(W_R).unwrap();
        assert!(run.child(W_RPR).is_none());
        assert_eq!(visible_text(&content), "x");
    }

    #[test]
    fn test_empty_container_is_noop() {
        let mut content = parse("<w:sdtContent/>");
        let before = content.clone();
        write_text(&mut content, "ignored");
        assert_eq!(content, before);
    }

    #[test]
    fn test_style_roundtrip_through_rpr() {
        let style = RunStyle::default().bold().points(10.5).family("Segoe UI").color("374151");
        let run = make_run("Label", &style);
        assert_eq!(RunStyle::of_run(&run), style);
        assert_eq!(style.size, Some(21));
    }
}
