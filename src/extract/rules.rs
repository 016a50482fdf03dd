//! Selector cascades
//!
//! Markup on the target site drifts, so every region is described by an
//! ordered list of alternatives instead of one selector. A [`Rule`] pairs a
//! selector with the function that reads a value out of each match; plain
//! text cascades are just ordered selector lists. New fallbacks are added by
//! appending to a list, never by touching control flow.

use crate::crawler::Node;

/// A named extraction strategy
#[derive(Debug, Clone, Copy)]
pub struct Rule<T> {
    /// Short label used in logs
    pub name: &'static str,
    pub selector: &'static str,
    pub extract: fn(Node<'_>) -> Option<T>,
}

impl<T> Rule<T> {
    /// Applies the rule to every match under `scope`, in document order
    pub fn collect(&self, scope: Node<'_>) -> Vec<T> {
        scope
            .select(self.selector)
            .into_iter()
            .filter_map(self.extract)
            .collect()
    }
}

/// Returns the cleaned text of the first selector in `selectors` that yields non-empty text
pub fn first_text(scope: Node<'_>, selectors: &[&str]) -> Option<String> {
    selectors
        .iter()
        .find_map(|selector| scope.first_text(selector))
}

/// Returns the first non-blank attribute among `attrs` on `node`
///
/// Each entry pairs an attribute name with a reader, so `srcset` can be cut
/// down to its first candidate while `src` is taken as is.
pub fn first_attr<'a>(node: Node<'a>, attrs: &[AttrReader]) -> Option<&'a str> {
    attrs
        .iter()
        .find_map(|(name, read)| node.attr_non_empty(name).and_then(|value| read(value)))
}

/// An attribute name and how to read a URL out of its value
pub type AttrReader = (&'static str, fn(&str) -> Option<&str>);

/// Reads an attribute value unchanged
pub fn verbatim(value: &str) -> Option<&str> {
    Some(value)
}

/// Reads the first URL of a `srcset` list
pub fn first_srcset_entry(value: &str) -> Option<&str> {
    value
        .split(',')
        .next()
        .and_then(|candidate| candidate.split_whitespace().next())
}

/// Returns the href of the first anchor under `scope` whose href contains `fragment`
pub fn link_containing<'a>(scope: Node<'a>, fragment: &str) -> Option<&'a str> {
    scope
        .select("a[href]")
        .into_iter()
        .filter_map(|anchor| anchor.attr_non_empty("href"))
        .find(|href| href.contains(fragment))
}
