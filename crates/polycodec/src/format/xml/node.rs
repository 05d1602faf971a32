// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Owned XML element tree.
//!
//! Parsing goes through `roxmltree`; writing is a small escaping writer.
//! Documents are written without indentation so text content survives a
//! round trip byte for byte.

use crate::error::{Error, Result};
use std::fmt::Write as _;

/// One XML element: name, attributes, child elements and text content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlElement>,
    text: String,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    /// Remove an attribute and return its value.
    pub fn take_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    pub fn take_children(&mut self) -> Vec<XmlElement> {
        std::mem::take(&mut self.children)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn take_text(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| Error::malformed(format!("invalid XML: {}", e)))?;
        Ok(Self::from_node(doc.root_element()))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let mut element = Self::new(node.tag_name().name());
        for attr in node.attributes() {
            element
                .attrs
                .push((attr.name().to_string(), attr.value().to_string()));
        }
        for child in node.children() {
            if child.is_element() {
                element.children.push(Self::from_node(child));
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    element.text.push_str(text);
                }
            }
        }
        // Mixed content is not produced by the writer; indentation between
        // child elements is dropped.
        if !element.children.is_empty() && element.text.trim().is_empty() {
            element.text.clear();
        }
        element
    }

    /// Serialize to a document string.
    ///
    /// Fails on characters XML 1.0 cannot carry, even escaped (control
    /// characters other than tab, newline and carriage return, U+FFFE, U+FFFF).
    pub fn to_xml_string(&self) -> Result<String> {
        let mut out = String::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    fn write_to(&self, out: &mut String) -> Result<()> {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            let _ = write!(out, " {}=\"", k);
            escape_into(out, v, true)?;
            out.push('"');
        }
        if self.children.is_empty() && self.text.is_empty() {
            out.push_str("/>");
            return Ok(());
        }
        out.push('>');
        escape_into(out, &self.text, false)?;
        for child in &self.children {
            child.write_to(out)?;
        }
        let _ = write!(out, "</{}>", self.name);
        Ok(())
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn escape_into(out: &mut String, text: &str, attribute: bool) -> Result<()> {
    for c in text.chars() {
        if !is_xml_char(c) {
            return Err(Error::unsupported(
                "xml",
                format!("character U+{:04X} cannot be represented in XML 1.0", u32::from(c)),
            ));
        }
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\r' => out.push_str("&#xD;"),
            '\n' if attribute => out.push_str("&#xA;"),
            '\t' if attribute => out.push_str("&#x9;"),
            other => out.push(other),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_parse() {
        let mut root = XmlElement::new("value");
        root.set_attr("type", "a<b>\"c\"");
        let mut child = XmlElement::new("name");
        child.set_text("  x & y\r\n ");
        root.push(child);
        root.push(XmlElement::new("empty"));

        let text = root.to_xml_string().unwrap();
        let parsed = XmlElement::parse(&text).unwrap();
        assert_eq!(parsed, root);
        assert_eq!(parsed.children()[0].text(), "  x & y\r\n ");
    }

    #[test]
    fn test_unrepresentable_characters_rejected() {
        let mut root = XmlElement::new("value");
        root.set_text("bell\u{7}");
        assert!(matches!(
            root.to_xml_string(),
            Err(Error::UnsupportedShape { format: "xml", .. })
        ));

        let mut root = XmlElement::new("value");
        root.set_attr("key", "\u{FFFF}");
        assert!(root.to_xml_string().is_err());

        let mut root = XmlElement::new("value");
        root.set_text("tab\tok \u{10348}");
        assert!(root.to_xml_string().is_ok());
    }

    #[test]
    fn test_indentation_dropped() {
        let parsed = XmlElement::parse("<value>\n  <a>1</a>\n  <b>2</b>\n</value>").unwrap();
        assert_eq!(parsed.text(), "");
        assert_eq!(parsed.children().len(), 2);
        assert_eq!(parsed.children()[1].text(), "2");
    }

    #[test]
    fn test_attr_replace_and_take() {
        let mut e = XmlElement::new("v");
        e.set_attr("k", "1");
        e.set_attr("k", "2");
        assert_eq!(e.attr("k"), Some("2"));
        assert_eq!(e.take_attr("k").as_deref(), Some("2"));
        assert_eq!(e.attr("k"), None);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            XmlElement::parse("<value>"),
            Err(Error::MalformedRepresentation(_))
        ));
    }
}
