//! Headless retained DOM.
//!
//! The diff engine reconciles real, identity-bearing nodes rather than a
//! virtual tree, so the crate ships a small DOM of its own: shared node
//! handles with browser mutation semantics, a live `value` property split
//! from the `value` attribute, creation-time listener side tables, and a
//! compound selector engine.
//!
//! - [`node`] - node kinds, tree mutation, listeners, cloning
//! - [`document`] - the `body`-rooted page document
//! - [`selector`] - `tag` / `#id` / `.class` compound selectors

pub mod document;
pub mod node;
pub mod selector;

pub use document::Document;
pub use node::{Event, Handler, Node, NodeKind};
pub use selector::Selector;
