//! Retained DOM node tree.
//!
//! Nodes are cheap cloneable handles (`Rc<RefCell<_>>`) with identity
//! semantics: `==` compares handles, never structure. The tree follows DOM
//! mutation rules that the diff engine depends on:
//!
//! - inserting a node that already has a parent moves it,
//! - inserting a fragment splices its children in and empties the fragment,
//! - a replaced node keeps its identity and can be re-inserted later.
//!
//! Event listeners live in a per-element side table keyed by event name,
//! recorded at element-creation time so the diff engine can sync them by
//! handler identity. Input-like elements carry a live `value` property that
//! is distinct from the `value` attribute, mirroring the browser split the
//! controlled/uncontrolled heuristics rely on.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

/// Event callback attached to an element.
pub type Handler = Rc<dyn Fn(&Event)>;

/// A dispatched DOM event.
pub struct Event {
    /// Event name, e.g. `"click"` or `"input"`.
    pub name: String,
    /// The element the event was dispatched on.
    pub target: Node,
}

/// The four node kinds the engine reconciles.
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    Comment(String),
    /// A childless container once inserted: insertion splices its children
    /// into the target and leaves the fragment empty.
    Fragment,
}

/// Element payload: tag, attributes, listener side table, live value.
pub struct ElementData {
    tag: String,
    attrs: IndexMap<String, String>,
    listeners: IndexMap<String, Handler>,
    /// Live `value` property (set by user input or `set_value`), distinct
    /// from the `value` attribute.
    value: Option<String>,
    /// Visibility toggle driven by `show` bindings (`style.display: none`).
    hidden: bool,
}

struct NodeData {
    kind: NodeKind,
    parent: Weak<RefCell<NodeData>>,
    children: Vec<Node>,
    key: Option<String>,
}

/// Shared handle to a DOM node.
#[derive(Clone)]
pub struct Node {
    inner: Rc<RefCell<NodeData>>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.borrow();
        match &data.kind {
            NodeKind::Element(e) => write!(f, "<{} children={}>", e.tag, data.children.len()),
            NodeKind::Text(t) => write!(f, "#text({t:?})"),
            NodeKind::Comment(c) => write!(f, "#comment({c:?})"),
            NodeKind::Fragment => write!(f, "#fragment(children={})", data.children.len()),
        }
    }
}

// =============================================================================
// Construction
// =============================================================================

impl Node {
    fn from_kind(kind: NodeKind) -> Node {
        Node {
            inner: Rc::new(RefCell::new(NodeData {
                kind,
                parent: Weak::new(),
                children: Vec::new(),
                key: None,
            })),
        }
    }

    /// Create an element node. Tag names are normalized to lowercase.
    pub fn element(tag: &str) -> Node {
        Node::from_kind(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: IndexMap::new(),
            listeners: IndexMap::new(),
            value: None,
            hidden: false,
        }))
    }

    /// Create a text node.
    pub fn text(content: impl Into<String>) -> Node {
        Node::from_kind(NodeKind::Text(content.into()))
    }

    /// Create a comment node.
    pub fn comment(content: impl Into<String>) -> Node {
        Node::from_kind(NodeKind::Comment(content.into()))
    }

    /// Create an empty document fragment.
    pub fn fragment() -> Node {
        Node::from_kind(NodeKind::Fragment)
    }

    // Builder-style helpers for constructing render output.

    /// Set an attribute and return the node (builder style).
    pub fn attr(self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Set the reconciliation key and return the node (builder style).
    pub fn keyed(self, key: impl Into<String>) -> Self {
        self.set_key(Some(key.into()));
        self
    }

    /// Attach a creation-time event listener and return the node.
    pub fn on(self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
        self.add_listener(event, Rc::new(handler));
        self
    }

    /// Append a child and return the node (builder style).
    pub fn child(self, node: Node) -> Self {
        self.append_child(&node);
        self
    }
}

// =============================================================================
// Kind queries
// =============================================================================

impl Node {
    /// Stable identity of the underlying allocation.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }

    pub fn is_element(&self) -> bool {
        matches!(self.inner.borrow().kind, NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.inner.borrow().kind, NodeKind::Text(_))
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.inner.borrow().kind, NodeKind::Comment(_))
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.inner.borrow().kind, NodeKind::Fragment)
    }

    fn is_container(&self) -> bool {
        matches!(
            self.inner.borrow().kind,
            NodeKind::Element(_) | NodeKind::Fragment
        )
    }

    /// Tag name for elements, `None` otherwise.
    pub fn tag(&self) -> Option<String> {
        match &self.inner.borrow().kind {
            NodeKind::Element(e) => Some(e.tag.clone()),
            _ => None,
        }
    }

    /// True when both nodes are the same kind and, for elements, share a
    /// tag name. The diff engine replaces wholesale when this is false.
    pub fn same_shape(&self, other: &Node) -> bool {
        let a = self.inner.borrow();
        let b = other.inner.borrow();
        match (&a.kind, &b.kind) {
            (NodeKind::Element(x), NodeKind::Element(y)) => x.tag == y.tag,
            (NodeKind::Text(_), NodeKind::Text(_)) => true,
            (NodeKind::Comment(_), NodeKind::Comment(_)) => true,
            (NodeKind::Fragment, NodeKind::Fragment) => true,
            _ => false,
        }
    }

    /// Elements whose live `value` property the diff engine syncs.
    pub fn is_input_like(&self) -> bool {
        matches!(self.tag().as_deref(), Some("input") | Some("textarea"))
    }
}

// =============================================================================
// Keys, attributes, value, visibility
// =============================================================================

impl Node {
    /// Reconciliation key used by the keyed child diff.
    pub fn key(&self) -> Option<String> {
        self.inner.borrow().key.clone()
    }

    pub fn set_key(&self, key: Option<String>) {
        self.inner.borrow_mut().key = key;
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        match &self.inner.borrow().kind {
            NodeKind::Element(e) => e.attrs.get(name).cloned(),
            _ => None,
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        match &self.inner.borrow().kind {
            NodeKind::Element(e) => e.attrs.contains_key(name),
            _ => false,
        }
    }

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        if let NodeKind::Element(e) = &mut self.inner.borrow_mut().kind {
            e.attrs.insert(name.to_string(), value.into());
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        if let NodeKind::Element(e) = &mut self.inner.borrow_mut().kind {
            e.attrs.shift_remove(name);
        }
    }

    /// Snapshot of the element's attributes in insertion order.
    pub fn attributes(&self) -> IndexMap<String, String> {
        match &self.inner.borrow().kind {
            NodeKind::Element(e) => e.attrs.clone(),
            _ => IndexMap::new(),
        }
    }

    /// Attribute names in insertion order.
    pub fn attribute_names(&self) -> Vec<String> {
        match &self.inner.borrow().kind {
            NodeKind::Element(e) => e.attrs.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// True when the element's `class` attribute contains `class_name` as a
    /// whitespace-separated token.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attribute("class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == class_name))
    }

    /// Live `value` property. Falls back to the `value` attribute when the
    /// property was never written, like a freshly parsed input control.
    pub fn value(&self) -> String {
        match &self.inner.borrow().kind {
            NodeKind::Element(e) => e
                .value
                .clone()
                .or_else(|| e.attrs.get("value").cloned())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Write the live `value` property without touching the attribute.
    pub fn set_value(&self, value: impl Into<String>) {
        if let NodeKind::Element(e) = &mut self.inner.borrow_mut().kind {
            e.value = Some(value.into());
        }
    }

    /// Visibility toggle used by `show` bindings.
    pub fn set_hidden(&self, hidden: bool) {
        if let NodeKind::Element(e) = &mut self.inner.borrow_mut().kind {
            e.hidden = hidden;
        }
    }

    pub fn is_hidden(&self) -> bool {
        match &self.inner.borrow().kind {
            NodeKind::Element(e) => e.hidden,
            _ => false,
        }
    }
}

// =============================================================================
// Listeners and dispatch
// =============================================================================

impl Node {
    /// Record a listener in the element's side table. A later listener for
    /// the same event name replaces the earlier one.
    pub fn add_listener(&self, event: &str, handler: Handler) {
        if let NodeKind::Element(e) = &mut self.inner.borrow_mut().kind {
            e.listeners.insert(event.to_string(), handler);
        }
    }

    pub fn remove_listener(&self, event: &str) {
        if let NodeKind::Element(e) = &mut self.inner.borrow_mut().kind {
            e.listeners.shift_remove(event);
        }
    }

    pub fn listener(&self, event: &str) -> Option<Handler> {
        match &self.inner.borrow().kind {
            NodeKind::Element(e) => e.listeners.get(event).cloned(),
            _ => None,
        }
    }

    pub fn listener_names(&self) -> Vec<String> {
        match &self.inner.borrow().kind {
            NodeKind::Element(e) => e.listeners.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Run the listener registered for `event` on this node, if any.
    /// Dispatch does not bubble.
    pub fn dispatch(&self, event: &str) {
        let handler = self.listener(event);
        if let Some(handler) = handler {
            handler(&Event {
                name: event.to_string(),
                target: self.clone(),
            });
        }
    }
}

// =============================================================================
// Tree structure
// =============================================================================

impl Node {
    pub fn parent(&self) -> Option<Node> {
        self.inner.borrow().parent.upgrade().map(|inner| Node { inner })
    }

    /// Snapshot of the current children.
    pub fn children(&self) -> Vec<Node> {
        self.inner.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.inner.borrow().children.len()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.inner.borrow().children.first().cloned()
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let data = parent.inner.borrow();
        let idx = data.children.iter().position(|c| c == self)?;
        data.children.get(idx + 1).cloned()
    }

    /// Remove this node from its parent, if attached.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.inner.borrow_mut().children.retain(|c| c != self);
            self.inner.borrow_mut().parent = Weak::new();
        }
    }

    /// Insert `node` before `reference` (or append when `None`). A node
    /// already in a tree is moved; a fragment is spliced and emptied.
    ///
    /// Panics when this node cannot contain children or `reference` is not
    /// a child, matching the DOM API's thrown errors.
    pub fn insert_before(&self, node: &Node, reference: Option<&Node>) {
        assert!(
            self.is_container(),
            "cannot insert children into a text or comment node"
        );
        if node.is_fragment() {
            let moved = std::mem::take(&mut node.inner.borrow_mut().children);
            for child in &moved {
                child.inner.borrow_mut().parent = Weak::new();
            }
            for child in moved {
                self.insert_single(&child, reference);
            }
            return;
        }
        self.insert_single(node, reference);
    }

    fn insert_single(&self, node: &Node, reference: Option<&Node>) {
        node.detach();
        let idx = match reference {
            Some(r) => {
                let data = self.inner.borrow();
                data.children
                    .iter()
                    .position(|c| c == r)
                    .expect("reference node is not a child of this node")
            }
            None => self.inner.borrow().children.len(),
        };
        node.inner.borrow_mut().parent = Rc::downgrade(&self.inner);
        self.inner.borrow_mut().children.insert(idx, node.clone());
    }

    pub fn append_child(&self, node: &Node) {
        self.insert_before(node, None);
    }

    /// Panics when `child` is not a child of this node.
    pub fn remove_child(&self, child: &Node) {
        let idx = {
            let data = self.inner.borrow();
            data.children
                .iter()
                .position(|c| c == child)
                .expect("node to remove is not a child of this node")
        };
        self.inner.borrow_mut().children.remove(idx);
        child.inner.borrow_mut().parent = Weak::new();
    }

    /// Replace this node with `node` in its parent. A detached node is left
    /// untouched, mirroring `parentNode?.replaceChild`.
    pub fn replace_with(&self, node: &Node) {
        let Some(parent) = self.parent() else {
            return;
        };
        let next = self.next_sibling();
        parent.remove_child(self);
        parent.insert_before(node, next.as_ref());
    }
}

// =============================================================================
// Content, cloning, serialization
// =============================================================================

impl Node {
    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self) -> String {
        let data = self.inner.borrow();
        match &data.kind {
            NodeKind::Text(t) | NodeKind::Comment(t) => t.clone(),
            NodeKind::Element(_) | NodeKind::Fragment => {
                data.children.iter().map(|c| c.text_content()).collect()
            }
        }
    }

    /// For text and comment nodes, overwrite the content. For containers,
    /// replace all children with a single text node.
    pub fn set_text_content(&self, content: impl Into<String>) {
        let content = content.into();
        let replace_children = {
            let mut data = self.inner.borrow_mut();
            match &mut data.kind {
                NodeKind::Text(t) | NodeKind::Comment(t) => {
                    *t = content.clone();
                    false
                }
                NodeKind::Element(_) | NodeKind::Fragment => true,
            }
        };
        if replace_children {
            for child in self.children() {
                child.inner.borrow_mut().parent = Weak::new();
            }
            self.inner.borrow_mut().children.clear();
            self.append_child(&Node::text(content));
        }
    }

    /// Clone the node. `deep` clones the subtree; listeners are shared by
    /// handle, matching `cloneNode` keeping inline handlers.
    pub fn clone_node(&self, deep: bool) -> Node {
        let kind = {
            let data = self.inner.borrow();
            match &data.kind {
                NodeKind::Element(e) => NodeKind::Element(ElementData {
                    tag: e.tag.clone(),
                    attrs: e.attrs.clone(),
                    listeners: e.listeners.clone(),
                    value: e.value.clone(),
                    hidden: e.hidden,
                }),
                NodeKind::Text(t) => NodeKind::Text(t.clone()),
                NodeKind::Comment(c) => NodeKind::Comment(c.clone()),
                NodeKind::Fragment => NodeKind::Fragment,
            }
        };
        let clone = Node::from_kind(kind);
        clone.set_key(self.key());
        if deep {
            for child in self.children() {
                clone.append_child(&child.clone_node(true));
            }
        }
        clone
    }

    /// Serialize the subtree to an HTML-like string. Test and debug aid;
    /// no escaping is performed.
    pub fn outer_html(&self) -> String {
        let data = self.inner.borrow();
        match &data.kind {
            NodeKind::Text(t) => t.clone(),
            NodeKind::Comment(c) => format!("<!--{c}-->"),
            NodeKind::Fragment => data.children.iter().map(|c| c.outer_html()).collect(),
            NodeKind::Element(e) => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&e.tag);
                for (name, value) in &e.attrs {
                    out.push_str(&format!(" {name}=\"{value}\""));
                }
                out.push('>');
                for child in &data.children {
                    out.push_str(&child.outer_html());
                }
                out.push_str(&format!("</{}>", e.tag));
                out
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_identity_semantics() {
        let a = Node::element("div");
        let b = a.clone();
        let c = Node::element("div");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_insert_moves_existing_node() {
        let parent_a = Node::element("div");
        let parent_b = Node::element("div");
        let child = Node::text("x");

        parent_a.append_child(&child);
        assert_eq!(parent_a.child_count(), 1);

        parent_b.append_child(&child);
        assert_eq!(parent_a.child_count(), 0);
        assert_eq!(parent_b.child_count(), 1);
        assert_eq!(child.parent(), Some(parent_b));
    }

    #[test]
    fn test_fragment_insertion_splices_and_empties() {
        let frag = Node::fragment()
            .child(Node::text("a"))
            .child(Node::text("b"));
        let parent = Node::element("div").child(Node::text("z"));
        let z = parent.first_child().unwrap();

        parent.insert_before(&frag, Some(&z));

        assert_eq!(frag.child_count(), 0);
        assert_eq!(parent.outer_html(), "<div>abz</div>");
    }

    #[test]
    fn test_replace_with_preserves_position() {
        let parent = Node::element("ul")
            .child(Node::element("li").child(Node::text("1")))
            .child(Node::element("li").child(Node::text("2")));
        let first = parent.first_child().unwrap();
        let replacement = Node::element("li").child(Node::text("9"));

        first.replace_with(&replacement);

        assert_eq!(parent.outer_html(), "<ul><li>9</li><li>2</li></ul>");
        assert!(first.parent().is_none());
    }

    #[test]
    fn test_replace_detached_node_is_noop() {
        let detached = Node::element("div");
        detached.replace_with(&Node::element("span"));
        assert!(detached.parent().is_none());
    }

    #[test]
    fn test_value_property_falls_back_to_attribute() {
        let input = Node::element("input").attr("value", "initial");
        assert_eq!(input.value(), "initial");

        input.set_value("typed");
        assert_eq!(input.value(), "typed");
        assert_eq!(input.attribute("value").as_deref(), Some("initial"));
    }

    #[test]
    fn test_set_text_content_replaces_children() {
        let div = Node::element("div")
            .child(Node::element("span"))
            .child(Node::text("old"));
        div.set_text_content("new");
        assert_eq!(div.child_count(), 1);
        assert_eq!(div.text_content(), "new");
    }

    #[test]
    fn test_dispatch_runs_registered_listener() {
        let hits = Rc::new(Cell::new(0));
        let hits_in = hits.clone();
        let button = Node::element("button").on("click", move |_| {
            hits_in.set(hits_in.get() + 1);
        });

        button.dispatch("click");
        button.dispatch("click");
        button.dispatch("change");
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_clone_node_deep() {
        let original = Node::element("div")
            .attr("class", "card")
            .keyed("k")
            .child(Node::text("hello"));
        let copy = original.clone_node(true);

        assert_ne!(original, copy);
        assert_eq!(copy.outer_html(), original.outer_html());
        assert_eq!(copy.key().as_deref(), Some("k"));

        let shallow = original.clone_node(false);
        assert_eq!(shallow.child_count(), 0);
    }

    #[test]
    fn test_next_sibling() {
        let parent = Node::element("div");
        let a = Node::text("a");
        let b = Node::text("b");
        parent.append_child(&a);
        parent.append_child(&b);

        assert_eq!(a.next_sibling(), Some(b.clone()));
        assert_eq!(b.next_sibling(), None);
    }
}
