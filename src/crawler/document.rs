//! Navigable HTML document
//!
//! This is the single seam through which extraction code queries markup:
//! - select nodes by any CSS selector string
//! - read a node's text or attributes
//! - scope a search to a node's descendants
//!
//! Parsing is best-effort and never fails; a selector that does not parse
//! simply matches nothing.

use crate::normalize::clean_text;
use scraper::{ElementRef, Html, Selector};

/// A parsed HTML page
#[derive(Debug)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML content, tolerating malformed or partial markup
    ///
    /// # Example
    ///
    /// ```
    /// use avitolog::crawler::Document;
    ///
    /// let doc = Document::parse(r#"<div class="price">1 000 ₽</div>"#);
    /// let node = doc.first("div.price").unwrap();
    /// assert_eq!(node.text(), "1 000 ₽");
    /// ```
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Returns every element matching `selector`, in document order
    pub fn select(&self, selector: &str) -> Vec<Node<'_>> {
        match compile(selector) {
            Some(sel) => self.html.select(&sel).map(Node::new).collect(),
            None => Vec::new(),
        }
    }

    /// Returns the first element matching `selector`
    pub fn first(&self, selector: &str) -> Option<Node<'_>> {
        let sel = compile(selector)?;
        self.html.select(&sel).next().map(Node::new)
    }

    /// Returns the root `<html>` element
    pub fn root(&self) -> Node<'_> {
        Node::new(self.html.root_element())
    }
}

/// An element inside a [`Document`]
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    element: ElementRef<'a>,
}

impl<'a> Node<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Returns the concatenated text of the node and its descendants, whitespace-cleaned
    pub fn text(&self) -> String {
        clean_text(&self.element.text().collect::<String>())
    }

    /// Returns an attribute value, if present
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Returns a non-blank attribute value, trimmed
    pub fn attr_non_empty(&self, name: &str) -> Option<&'a str> {
        self.attr(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Returns the tag name (lowercase)
    pub fn tag(&self) -> &'a str {
        self.element.value().name()
    }

    /// Returns every descendant matching `selector`, in document order
    pub fn select(&self, selector: &str) -> Vec<Node<'a>> {
        match compile(selector) {
            Some(sel) => self.element.select(&sel).map(Node::new).collect(),
            None => Vec::new(),
        }
    }

    /// Returns the first descendant matching `selector`
    pub fn first(&self, selector: &str) -> Option<Node<'a>> {
        let sel = compile(selector)?;
        self.element.select(&sel).next().map(Node::new)
    }

    /// Returns the cleaned text of the first descendant matching `selector`, if non-empty
    pub fn first_text(&self, selector: &str) -> Option<String> {
        self.first(selector)
            .map(|node| node.text())
            .filter(|text| !text.is_empty())
    }

    /// Returns the nearest parent element
    pub fn parent(&self) -> Option<Node<'a>> {
        self.element
            .parent()
            .and_then(ElementRef::wrap)
            .map(Node::new)
    }
}

fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::debug!("Ignoring invalid selector {:?}: {:?}", selector, e);
            None
        }
    }
}
