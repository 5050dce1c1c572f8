//! Document root.
//!
//! A [`Document`] owns a `body` element that bindings and component
//! resolution scan. There is one document per app instance; pages under
//! test construct their DOM through the [`Node`](crate::dom::Node) builder
//! API since HTML parsing lives outside this engine.

use crate::dom::Node;
use crate::error::Error;

/// A page document with a `body` root element.
#[derive(Clone, PartialEq)]
pub struct Document {
    body: Node,
}

impl Document {
    /// Create a document with an empty `body`.
    pub fn new() -> Document {
        Document {
            body: Node::element("body"),
        }
    }

    /// The `body` root element.
    pub fn body(&self) -> &Node {
        &self.body
    }

    /// All elements in the document matching `selector`.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Node>, Error> {
        self.body.query_selector_all(selector)
    }

    /// First element in the document matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<Node>, Error> {
        self.body.query_selector(selector)
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_queries_body_subtree() {
        let doc = Document::new();
        doc.body()
            .append_child(&Node::element("div").attr("id", "root"));

        assert!(doc.query_selector("#root").unwrap().is_some());
        assert!(doc.query_selector("#other").unwrap().is_none());
    }
}
