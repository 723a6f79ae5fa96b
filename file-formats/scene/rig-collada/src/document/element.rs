//! Minimal owned element tree built from the `xml-rs` event stream

use crate::error::{ColladaError, Result};
use std::io::Read;
use xml::reader::{EventReader, XmlEvent};

/// An XML element with its attributes, concatenated text and child elements
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Read a whole document and return its root element
    pub fn read<R: Read>(reader: R) -> Result<Self> {
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        for event in EventReader::new(reader) {
            match event? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => {
                    stack.push(Element {
                        name: name.local_name,
                        attributes: attributes
                            .into_iter()
                            .map(|a| (a.name.local_name, a.value))
                            .collect(),
                        text: String::new(),
                        children: Vec::new(),
                    });
                }
                XmlEvent::EndElement { .. } => {
                    let Some(finished) = stack.pop() else {
                        return Err(ColladaError::ParseError(
                            "unbalanced end element".to_string(),
                        ));
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(finished),
                        None => root = Some(finished),
                    }
                }
                XmlEvent::Characters(text) | XmlEvent::CData(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                _ => {}
            }
        }

        root.ok_or_else(|| ColladaError::ParseError("document has no root element".to_string()))
    }

    /// Value of the attribute `key`, if present
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child called `name`
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First direct child called `name`, or a `MissingSection` error
    pub fn require_child(&self, name: &str) -> Result<&Element> {
        self.child(name).ok_or_else(|| {
            ColladaError::MissingSection(format!("<{name}> inside <{}>", self.name))
        })
    }

    /// All direct children called `name`
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a path of direct child names
    pub fn path(&self, names: &[&str]) -> Option<&Element> {
        names.iter().try_fold(self, |element, name| element.child(name))
    }

    /// Depth-first search for every descendant called `name`
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        while let Some(element) = stack.pop() {
            if element.name == name {
                found.push(element);
            }
            stack.extend(element.children.iter().rev());
        }
        found
    }
}

/// Strip the leading `#` of a URI fragment reference
pub fn strip_ref(reference: &str) -> &str {
    reference.strip_prefix('#').unwrap_or(reference)
}
