//! Owned, mutable XML element tree.
//!
//! `roxmltree` gives a read-only view of a document; screens are built by
//! copying, editing and appending widget sub-trees, so parsed documents are
//! converted into [`Element`] values that can be cloned and serialized back.

#![allow(missing_docs)]

use std::fmt::Write as _;

use crate::error::BuildError;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Child node of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
    Comment(String),
}

/// XML element with attributes and ordered children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// Parsed document; only the root element is retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn parse(text: &str) -> Result<Self, BuildError> {
        Ok(Self {
            root: parse_element(text)?,
        })
    }

    /// Serialize with a leading XML declaration.
    #[must_use]
    pub fn to_xml_string(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        self.root.write_xml(&mut out);
        out.push('\n');
        out
    }
}

/// Parse `text` and return its root element.
pub fn parse_element(text: &str) -> Result<Element, BuildError> {
    let document = roxmltree::Document::parse(text)?;
    Ok(convert(document.root_element()))
}

fn convert(node: roxmltree::Node<'_, '_>) -> Element {
    let attributes = node
        .attributes()
        .map(|attribute| (attribute.name().to_string(), attribute.value().to_string()))
        .collect();
    let children = node
        .children()
        .filter_map(|child| {
            if child.is_element() {
                Some(XmlNode::Element(convert(child)))
            } else if child.is_text() {
                child.text().map(|text| XmlNode::Text(text.to_string()))
            } else if child.is_comment() {
                child.text().map(|text| XmlNode::Comment(text.to_string()))
            } else {
                None
            }
        })
        .collect();
    Element {
        name: node.tag_name().name().to_string(),
        attributes,
        children,
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Element holding a single text child.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.children.push(XmlNode::Text(text.into()));
        element
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// First direct child element named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|element| element.name == name)
    }

    /// Direct child elements named `name`, in document order.
    pub fn child_elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |element| element.name == name)
    }

    /// Concatenated text of the element's direct text children.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Text of the first child named `name`, if that child exists.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(Element::text)
    }

    /// Replace the text of the first child named `name`.
    ///
    /// Returns `false` when no such child exists.
    pub fn set_child_text(&mut self, name: &str, text: impl Into<String>) -> bool {
        match self.child_mut(name) {
            Some(child) => {
                child.set_text(text);
                true
            }
            None => false,
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.retain(|child| !matches!(child, XmlNode::Text(_)));
        self.children.insert(0, XmlNode::Text(text.into()));
    }

    pub fn push_element(&mut self, element: Element) {
        self.children.push(XmlNode::Element(element));
    }

    /// Remove the direct child elements matching `predicate` and return them
    /// in document order.
    ///
    /// Whitespace-only text directly after a removed element goes with it so
    /// the remaining document keeps its indentation.
    pub fn remove_elements(&mut self, mut predicate: impl FnMut(&Element) -> bool) -> Vec<Element> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.children.len());
        let mut dropping_tail = false;
        for child in std::mem::take(&mut self.children) {
            match child {
                XmlNode::Element(element) if predicate(&element) => {
                    removed.push(element);
                    dropping_tail = true;
                }
                XmlNode::Text(text) if dropping_tail && text.trim().is_empty() => {
                    dropping_tail = false;
                }
                other => {
                    dropping_tail = false;
                    kept.push(other);
                }
            }
        }
        self.children = kept;
        removed
    }

    /// Serialize the element (without XML declaration).
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {key}=\"{}\"", escape_attr(value));
        }
        if self.children.is_empty() {
            out.push_str(" />");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.write_xml(out),
                XmlNode::Text(text) => out.push_str(&escape_text(text)),
                XmlNode::Comment(text) => {
                    let _ = write!(out, "<!--{text}-->");
                }
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

pub(crate) fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_structure_and_text() {
        let root = parse_element(
            r#"<display typeId="org.csstudio.opibuilder.Display">
  <!-- header -->
  <widget typeId="label"><name>title_group</name><height>20</height></widget>
</display>"#,
        )
        .expect("parse");
        assert_eq!(root.name, "display");
        assert_eq!(
            root.attribute("typeId"),
            Some("org.csstudio.opibuilder.Display")
        );
        let widget = root.child("widget").expect("widget");
        assert_eq!(widget.child_text("name").as_deref(), Some("title_group"));
        assert_eq!(widget.child_text("height").as_deref(), Some("20"));
        assert!(root
            .children
            .iter()
            .any(|child| matches!(child, XmlNode::Comment(text) if text.trim() == "header")));
    }

    #[test]
    fn serialization_escapes_and_reparses() {
        let mut root = Element::new("display");
        root.attributes
            .push(("note".to_string(), "a \"quoted\" <value>".to_string()));
        root.push_element(Element::with_text("text", "R&D <ok>"));
        root.push_element(Element::new("empty"));
        let xml = root.to_xml();
        assert_eq!(
            xml,
            "<display note=\"a &quot;quoted&quot; &lt;value&gt;\"><text>R&amp;D &lt;ok&gt;</text><empty /></display>"
        );
        assert_eq!(parse_element(&xml).expect("reparse"), root);
    }

    #[test]
    fn remove_elements_drops_trailing_whitespace() {
        let mut root =
            parse_element("<display>\n  <widget>a</widget>\n  <macros/>\n</display>").expect("parse");
        let removed = root.remove_elements(|element| element.name == "widget");
        assert_eq!(removed.len(), 1);
        assert_eq!(root.to_xml(), "<display>\n  <macros />\n</display>");
    }

    #[test]
    fn set_child_text_reports_missing_child() {
        let mut widget = parse_element("<widget><x>1</x></widget>").expect("parse");
        assert!(widget.set_child_text("x", "7"));
        assert!(!widget.set_child_text("y", "7"));
        assert_eq!(widget.child_text("x").as_deref(), Some("7"));
    }

    #[test]
    fn document_adds_declaration() {
        let document = Document::parse("<display/>").expect("parse");
        assert_eq!(
            document.to_xml_string(),
            format!("{XML_DECLARATION}\n<display />\n")
        );
    }

    #[test]
    fn malformed_source_is_a_parse_error() {
        let err = parse_element("<display><widget>").expect_err("must fail");
        assert!(matches!(err, BuildError::TemplateParse(_)));
    }
}
