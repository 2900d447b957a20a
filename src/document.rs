//! Queryable documents produced by document adapters.
//!
//! Providers never see the HTML library in use. They query a [`Document`]
//! through the [`Node`] trait: select descendants, read text and attributes.
//! Selector syntax is whatever the active adapter understands; the built-in
//! [`Element`] tree only matches bare tag names.

use std::collections::HashMap;

use crate::capability::{Capabilities, Role};
use crate::Result;

/// A node of a parsed document.
pub trait Node {
    /// All descendants matching `selector`, in document order.
    fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn Node + '_>>>;

    /// Concatenated text content.
    fn text(&self) -> String;

    /// Attribute value, if present.
    fn attr(&self, name: &str) -> Option<String>;

    /// First descendant matching `selector`.
    fn find(&self, selector: &str) -> Result<Option<Box<dyn Node + '_>>> {
        Ok(self.find_all(selector)?.into_iter().next())
    }

    /// Trimmed text of the first descendant matching `selector`.
    fn text_at(&self, selector: &str) -> Result<Option<String>> {
        Ok(self
            .find(selector)?
            .map(|node| node.text().trim().to_string()))
    }

    /// Trimmed text of every node matching `selector` (the cells of a row).
    fn cells(&self, selector: &str) -> Result<Vec<String>> {
        Ok(self
            .find_all(selector)?
            .iter()
            .map(|node| node.text().trim().to_string())
            .collect())
    }
}

/// A parsed listing document.
pub struct Document {
    root: Box<dyn Node>,
}

impl Document {
    /// Wraps a root node.
    pub fn new(root: impl Node + 'static) -> Self {
        Self {
            root: Box::new(root),
        }
    }
}

impl Node for Document {
    fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn Node + '_>>> {
        self.root.find_all(selector)
    }

    fn text(&self) -> String {
        self.root.text()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.root.attr(name)
    }
}

/// Converts raw markup into a [`Document`].
pub trait DocumentAdapter: Send + Sync {
    /// Adapter name, used in logs and errors.
    fn name(&self) -> &str;

    /// Makes sure the adapter's runtime requirements are available.
    ///
    /// Called once when the adapter is assigned to a configuration.
    fn install_requirements(&self) -> Result<()> {
        Ok(())
    }

    /// Parses raw markup.
    fn parse(&self, markup: &str) -> Result<Document>;

    /// Operations this adapter exports.
    fn capabilities(&self) -> Capabilities {
        Role::DocumentAdapter.capabilities()
    }
}

/// An owned element tree.
///
/// Used by [`LineAdapter`] and handy for building documents by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    tag: String,
    text: String,
    attrs: HashMap<String, String>,
    children: Vec<Element>,
}

impl Element {
    /// Creates an empty element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Sets the element's own text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Appends a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn collect<'a>(&'a self, selector: &str, out: &mut Vec<Box<dyn Node + 'a>>) {
        for child in &self.children {
            if selector == "*" || child.tag == selector {
                out.push(Box::new(child));
            }
            child.collect(selector, out);
        }
    }
}

impl Node for Element {
    fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn Node + '_>>> {
        let mut out = Vec::new();
        self.collect(selector.trim(), &mut out);
        Ok(out)
    }

    fn text(&self) -> String {
        let mut text = self.text.clone();
        for child in &self.children {
            if !text.is_empty() && !child.text().is_empty() {
                text.push('\n');
            }
            text.push_str(&child.text());
        }
        text
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.attrs.get(name).cloned()
    }
}

impl<'a> Node for &'a Element {
    fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn Node + '_>>> {
        <Element as Node>::find_all(self, selector)
    }

    fn text(&self) -> String {
        <Element as Node>::text(self)
    }

    fn attr(&self, name: &str) -> Option<String> {
        <Element as Node>::attr(self, name)
    }
}

/// Adapter for plain-text listings.
///
/// Every non-empty line becomes a `row` element whose `cell` children are the
/// line's fields, split on whitespace, commas, tabs and colons.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineAdapter;

impl LineAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentAdapter for LineAdapter {
    fn name(&self) -> &str {
        "line"
    }

    fn parse(&self, markup: &str) -> Result<Document> {
        let root = markup
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.split(|c: char| c.is_whitespace() || c == ',' || c == ':')
                    .filter(|field| !field.is_empty())
                    .fold(Element::new("row").with_attr("line", line), |row, field| {
                        row.with_child(Element::new("cell").with_text(field))
                    })
            })
            .fold(Element::new("document"), Element::with_child);
        Ok(Document::new(LineDocument {
            raw: markup.to_string(),
            root,
        }))
    }
}

/// Rows parsed by [`LineAdapter`]; text is the original markup.
struct LineDocument {
    raw: String,
    root: Element,
}

impl Node for LineDocument {
    fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn Node + '_>>> {
        self.root.find_all(selector)
    }

    fn text(&self) -> String {
        self.raw.clone()
    }

    fn attr(&self, _name: &str) -> Option<String> {
        None
    }
}
