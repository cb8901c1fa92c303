//! # Rendered markup
//!
//! Minimal owned element tree for the fragments returned by the renderer.
//! Fragments are expected to be well-formed (XHTML-style: void elements
//! self-closed, no HTML-only named entities).

use crate::error::{TreeError, TreeResult};
use serde::{Deserialize, Serialize};

const FRAGMENT_ROOT: &str = "npb-fragment";
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta", "source"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MarkupNode {
    Element(Element),
    Text { content: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    /// Attributes in source order
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(MarkupNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(MarkupNode::Text {
            content: text.into(),
        });
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            MarkupNode::Element(e) => Some(e),
            MarkupNode::Text { .. } => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|c| match c {
            MarkupNode::Element(e) => Some(e),
            MarkupNode::Text { .. } => None,
        })
    }

    /// First element (self included) matching the predicate, depth first
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find(pred))
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.find(&|e| e.id() == Some(id))
    }

    /// Direct or nested children matching `pred`, without descending into
    /// matched elements
    pub fn outermost(&self, pred: &dyn Fn(&Element) -> bool) -> Vec<&Element> {
        let mut found = Vec::new();
        for child in self.child_elements() {
            if pred(child) {
                found.push(child);
            } else {
                found.extend(child.outermost(pred));
            }
        }
        found
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    if element.children.is_empty() && VOID_ELEMENTS.contains(&element.tag.as_str()) {
        out.push_str(" />");
        return;
    }
    out.push('>');
    for child in &element.children {
        match child {
            MarkupNode::Element(e) => write_element(e, out),
            MarkupNode::Text { content } => out.push_str(&html_escape::encode_text(content)),
        }
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

/// Parse a fragment that may hold several top-level nodes
pub fn parse_fragment(source: &str) -> TreeResult<Vec<MarkupNode>> {
    let wrapped = format!("<{root}>{source}</{root}>", root = FRAGMENT_ROOT);
    let doc = roxmltree::Document::parse(&wrapped).map_err(|e| TreeError::Markup(e.to_string()))?;
    Ok(convert_children(doc.root_element()))
}

/// Parse markup holding exactly one top-level element
pub fn parse_element(source: &str) -> TreeResult<Element> {
    let mut elements = parse_fragment(source)?
        .into_iter()
        .filter_map(|n| match n {
            MarkupNode::Element(e) => Some(e),
            MarkupNode::Text { .. } => None,
        });

    match (elements.next(), elements.next()) {
        (Some(element), None) => Ok(element),
        (None, _) => Err(TreeError::Markup("fragment holds no element".to_string())),
        (Some(_), Some(_)) => Err(TreeError::Markup(
            "fragment holds more than one top-level element".to_string(),
        )),
    }
}

fn convert_children(node: roxmltree::Node) -> Vec<MarkupNode> {
    node.children()
        .filter_map(|child| {
            if child.is_element() {
                Some(MarkupNode::Element(convert_element(child)))
            } else if child.is_text() {
                let text = child.text().unwrap_or("");
                if text.trim().is_empty() {
                    None
                } else {
                    Some(MarkupNode::Text {
                        content: text.to_string(),
                    })
                }
            } else {
                None
            }
        })
        .collect()
}

fn convert_element(node: roxmltree::Node) -> Element {
    Element {
        tag: node.tag_name().name().to_string(),
        attributes: node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect(),
        children: convert_children(node),
    }
}
