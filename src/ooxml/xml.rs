//! Mutable XML tree built on quick-xml
//!
//! Office parts are small enough to hold in memory, and patching them needs
//! random access (find a control, swap its runs, append paragraphs), so parts
//! are parsed into a plain owned tree and serialized back after editing.
//! Qualified names are kept verbatim (`w:sdt`, `a:blip`); Office writers use
//! fixed prefixes so matching on the prefixed name is enough.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{ExportError, Result};

/// Child index path from a root element to one of its descendants
pub type NodePath = Vec<usize>;

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    /// Builder-style text append
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some((_, v)) = self.attrs.iter_mut().find(|(k, _)| k == name) {
            *v = value;
            return;
        }
        self.attrs.push((name.to_string(), value));
    }

    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|(k, _)| k != name);
        before != self.attrs.len()
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn insert(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, Node::Element(child));
    }

    /// Direct element children
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> {
        self.elements_mut().filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// Return the named child, inserting an empty one at `index` when absent
    pub fn child_or_insert(&mut self, name: &str, index: usize) -> &mut Element {
        let position = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.name == name));
        let position = match position {
            Some(p) => p,
            None => {
                let index = index.min(self.children.len());
                self.children.insert(index, Node::Element(Element::new(name)));
                index
            }
        };
        match &mut self.children[position] {
            Node::Element(e) => e,
            _ => unreachable!("position points at an element"),
        }
    }

    /// Index of the first element child with the given name
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.name == name))
    }

    /// Keep only the element children accepted by `keep`; text and comments stay
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&Element) -> bool) {
        self.children.retain(|n| match n {
            Node::Element(e) => keep(e),
            _ => true,
        });
    }

    /// Depth-first search for the first descendant with the given name
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated character data of all descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
                Node::Comment(_) => {}
            }
        }
    }

    /// Paths to every descendant with the given name, in document order
    pub fn paths_of(&self, name: &str) -> Vec<NodePath> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.collect_paths(name, &mut path, &mut out);
        out
    }

    fn collect_paths(&self, name: &str, path: &mut NodePath, out: &mut Vec<NodePath>) {
        for (i, child) in self.children.iter().enumerate() {
            if let Node::Element(e) = child {
                path.push(i);
                if e.name == name {
                    out.push(path.clone());
                }
                e.collect_paths(name, path, out);
                path.pop();
            }
        }
    }

    pub fn at_path(&self, path: &[usize]) -> Option<&Element> {
        let mut current = self;
        for &i in path {
            current = match current.children.get(i)? {
                Node::Element(e) => e,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = self;
        for &i in path {
            current = match current.children.get_mut(i)? {
                Node::Element(e) => e,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// A parsed XML part
#[derive(Clone, Debug, PartialEq)]
pub struct XmlDocument {
    pub root: Element,
}

impl XmlDocument {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse a part; `part` names the source in error messages
    pub fn parse(part: &str, bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| ExportError::xml(part, e))?;
            match event {
                Event::Start(ref e) => stack.push(element_from_start(part, e)?),
                Event::Empty(ref e) => {
                    let element = element_from_start(part, e)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ExportError::xml(part, "unbalanced end tag"))?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(ref e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e.unescape().map_err(|err| ExportError::xml(part, err))?;
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
                Event::CData(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        parent.children.push(Node::Text(text));
                    }
                }
                Event::Comment(ref e) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::Comment(String::from_utf8_lossy(e).into_owned()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(ExportError::xml(part, "unexpected end of document"));
        }
        root.map(Self::new)
            .ok_or_else(|| ExportError::xml(part, "no root element"))
    }

    /// Serialize with a standalone UTF-8 declaration, as Office writes parts
    pub fn to_bytes(&self, part: &str) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(|e| ExportError::xml(part, e))?;
        write_element(&mut writer, &self.root, part)?;
        Ok(writer.into_inner())
    }
}

fn element_from_start(part: &str, start: &BytesStart) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ExportError::xml(part, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| ExportError::xml(part, e))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None => *root = Some(element),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element, part: &str) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| ExportError::xml(part, e));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| ExportError::xml(part, e))?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e, part)?,
            Node::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(|e| ExportError::xml(part, e))?,
            Node::Comment(c) => writer
                .write_event(Event::Comment(BytesText::from_escaped(c.as_str())))
                .map_err(|e| ExportError::xml(part, e))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| ExportError::xml(part, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize_preserves_structure() {
        let src = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t xml:space="preserve"> a &amp; b </w:t></w:r></w:p><!-- note --></w:body></w:document>"#;
        let doc = XmlDocument::parse("test.xml", src).unwrap();
        assert_eq!(doc.root.name, "w:document");
        assert_eq!(doc.root.attr("xmlns:w"), Some("urn:w"));
        let t = doc.root.find("w:t").unwrap();
        assert_eq!(t.text(), " a & b ");
        assert_eq!(t.attr("xml:space"), Some("preserve"));

        let bytes = doc.to_bytes("test.xml").unwrap();
        let reparsed = XmlDocument::parse("test.xml", &bytes).unwrap();
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn test_paths_resolve_to_named_elements() {
        let src = b"<a><b/><c><b/></c></a>";
        let doc = XmlDocument::parse("t", src).unwrap();
        let paths = doc.root.paths_of("b");
        assert_eq!(paths, vec![vec![0], vec![1, 0]]);
        let mut root = doc.root.clone();
        root.at_path_mut(&paths[1]).unwrap().set_attr("x", "1");
        assert_eq!(root.find("c").unwrap().child("b").unwrap().attr("x"), Some("1"));
    }

    #[test]
    fn test_child_or_insert_reuses_existing() {
        let mut el = Element::new("w:r").with_child(Element::new("w:rPr"));
        el.child_or_insert("w:rPr", 0).push(Element::new("w:b"));
        assert_eq!(el.children.len(), 1);
        el.child_or_insert("w:t", 5);
        assert_eq!(el.position_of("w:t"), Some(1));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(XmlDocument::parse("bad.xml", b"<a><b></a>").is_err());
        assert!(XmlDocument::parse("empty.xml", b"").is_err());
    }
}
