//! Minimal compound selector engine.
//!
//! Supports the selector shapes the binding compiler needs for selective
//! data binding: `tag`, `#id`, `.class`, compounds of those (`button.cta`),
//! and comma-separated groups. Combinators (descendant, `>`, `~`) are
//! rejected with [`Error::Selector`].

use crate::dom::Node;
use crate::error::Error;

/// One compound selector: every present part must match.
#[derive(Debug, Default, Clone, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

/// A parsed selector group (`a, b.c`).
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(input: &str) -> Result<Selector, Error> {
        let mut compounds = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(Error::Selector(input.to_string()));
            }
            compounds.push(parse_compound(part, input)?);
        }
        Ok(Selector { compounds })
    }

    /// True when the element matches any compound in the group.
    pub fn matches(&self, node: &Node) -> bool {
        if !node.is_element() {
            return false;
        }
        self.compounds.iter().any(|c| compound_matches(c, node))
    }
}

fn parse_compound(part: &str, original: &str) -> Result<Compound, Error> {
    let mut compound = Compound::default();
    let mut rest = part;

    // Optional leading tag name.
    let tag_len = rest
        .find(|ch: char| ch == '#' || ch == '.')
        .unwrap_or(rest.len());
    if tag_len > 0 {
        let tag = &rest[..tag_len];
        if !is_name(tag) {
            return Err(Error::Selector(original.to_string()));
        }
        compound.tag = Some(tag.to_ascii_lowercase());
        rest = &rest[tag_len..];
    }

    // `#id` and `.class` qualifiers, in any order.
    while !rest.is_empty() {
        let marker = rest.chars().next().unwrap();
        rest = &rest[1..];
        let len = rest
            .find(|ch: char| ch == '#' || ch == '.')
            .unwrap_or(rest.len());
        let name = &rest[..len];
        if !is_name(name) {
            return Err(Error::Selector(original.to_string()));
        }
        match marker {
            '#' => compound.id = Some(name.to_string()),
            '.' => compound.classes.push(name.to_string()),
            _ => return Err(Error::Selector(original.to_string())),
        }
        rest = &rest[len..];
    }

    Ok(compound)
}

fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

fn compound_matches(compound: &Compound, node: &Node) -> bool {
    if let Some(tag) = &compound.tag {
        if node.tag().as_deref() != Some(tag.as_str()) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if node.attribute("id").as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    compound.classes.iter().all(|c| node.has_class(c))
}

impl Node {
    /// All descendant elements matching `selector`, in document order.
    /// The node itself is not considered, per `querySelectorAll` semantics.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Node>, Error> {
        let parsed = Selector::parse(selector)?;
        let mut matches = Vec::new();
        collect_matches(self, &parsed, &mut matches);
        Ok(matches)
    }

    /// First descendant element matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<Node>, Error> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }
}

fn collect_matches(node: &Node, selector: &Selector, out: &mut Vec<Node>) {
    for child in node.children() {
        if selector.matches(&child) {
            out.push(child.clone());
        }
        collect_matches(&child, selector, out);
    }
}

// =============================================================================
// Tests
// =============================================================================
