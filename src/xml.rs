//! Strict XML for the container descriptor, the package document and the NCX.
//!
//! Parsing is roxmltree's; [`NodeExt`] adds the few local-name queries the
//! EPUB parsers share. Prefixes are ignored, so `dc:title` and `title` match
//! the same way.

use roxmltree::{Document, Node, ParsingOptions};

use crate::error::Result;

/// Parse a well-formed XML document.
///
/// NCX files routinely carry a `<!DOCTYPE>`, so DTDs are accepted.
pub fn parse(text: &str) -> Result<Document<'_>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(text, options)?)
}

/// Local-name queries over roxmltree nodes.
pub trait NodeExt<'a, 'input: 'a> {
    /// Whether this is an element with the given local name.
    fn is(&self, local: &str) -> bool;

    /// First direct child element with the given local name.
    fn child(&self, local: &str) -> Option<Node<'a, 'input>>;

    /// First element with the given local name, `self` included, in
    /// document order.
    fn find(&self, local: &str) -> Option<Node<'a, 'input>>;

    /// Concatenated text of everything below this node.
    fn text_content(&self) -> String;
}

impl<'a, 'input: 'a> NodeExt<'a, 'input> for Node<'a, 'input> {
    fn is(&self, local: &str) -> bool {
        self.is_element() && self.tag_name().name() == local
    }

    fn child(&self, local: &str) -> Option<Node<'a, 'input>> {
        self.children().find(|n| n.is(local))
    }

    fn find(&self, local: &str) -> Option<Node<'a, 'input>> {
        self.descendants().find(|n| n.is(local))
    }

    fn text_content(&self) -> String {
        self.descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect()
    }
}
