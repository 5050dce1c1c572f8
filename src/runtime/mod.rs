//! Runtime: binding compiler, diff engine, components, app singleton.

pub mod app;
pub mod compile;
pub mod component;
pub mod diff;

pub use app::{use_app, App};
pub use compile::{compile, Binding, BindingValue, EventListener, TrackedNode};
pub use component::{
    mount_component, register_component, ComponentRender, ComponentResult, Props,
};
pub use diff::diff;

use crate::dom::Node;

/// Output of a render closure: plain text or a DOM subtree (element or
/// fragment).
pub enum Rendered {
    Text(String),
    Node(Node),
}

impl Rendered {
    pub(crate) fn into_node(self) -> Node {
        match self {
            Rendered::Text(text) => Node::text(text),
            Rendered::Node(node) => node,
        }
    }
}

impl From<Node> for Rendered {
    fn from(node: Node) -> Self {
        Rendered::Node(node)
    }
}

impl From<String> for Rendered {
    fn from(text: String) -> Self {
        Rendered::Text(text)
    }
}

impl From<&str> for Rendered {
    fn from(text: &str) -> Self {
        Rendered::Text(text.to_string())
    }
}
