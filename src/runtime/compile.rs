//! Binding compiler.
//!
//! Turns a declarative [`Binding`] descriptor into live update callbacks.
//! Every element matching the descriptor's selector gets one callback
//! that, in order: toggles visibility (`show`), sets text, assigns the
//! live value of input-like controls, reconciles the `render` result
//! against the tracked node, and publishes the tracked node through an
//! optional output ref. The callback runs once immediately with itself
//! installed as the current subscriber, so every reactive read inside it
//! establishes a subscription; later mutations replay it.
//!
//! Listeners are attached exactly once, after the first run and outside
//! tracking - handler identities are assumed stable across re-renders.
//!
//! A `render` returning a fragment is bracketed by a persistent pair of
//! comment anchors; only the content between them is patched afterwards,
//! because an inserted fragment has no identity left to diff against.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::dom::{Document, Event, Handler, Node};
use crate::error::Error;
use crate::reactivity::reference::Ref;
use crate::reactivity::tracking::UpdateFn;
use crate::runtime::diff::{diff, patch_children_range};
use crate::runtime::Rendered;

// =============================================================================
// Binding values - static, ref, or getter
// =============================================================================

/// A binding field value: static, bound to a ref, or computed by a getter.
/// Reading a `Ref` or `Getter` variant inside a tracked update callback
/// subscribes the callback as usual.
#[derive(Clone)]
pub enum BindingValue<T> {
    Static(T),
    Ref(Ref<T>),
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone> BindingValue<T> {
    /// Evaluate the current value.
    pub fn get(&self) -> T {
        match self {
            BindingValue::Static(v) => v.clone(),
            BindingValue::Ref(r) => r.get(),
            BindingValue::Getter(f) => f(),
        }
    }
}

impl<T> BindingValue<T> {
    pub fn getter(f: impl Fn() -> T + 'static) -> BindingValue<T> {
        BindingValue::Getter(Rc::new(f))
    }
}

impl<T> From<T> for BindingValue<T> {
    fn from(value: T) -> Self {
        BindingValue::Static(value)
    }
}

impl<T> From<Ref<T>> for BindingValue<T> {
    fn from(r: Ref<T>) -> Self {
        BindingValue::Ref(r)
    }
}

impl From<&str> for BindingValue<String> {
    fn from(value: &str) -> Self {
        BindingValue::Static(value.to_string())
    }
}

// =============================================================================
// Binding descriptor
// =============================================================================

/// A listener to attach to the compiled element.
#[derive(Clone)]
pub struct EventListener {
    pub event: String,
    pub handler: Handler,
}

impl EventListener {
    pub fn new(event: &str, handler: impl Fn(&Event) + 'static) -> EventListener {
        EventListener {
            event: event.to_string(),
            handler: Rc::new(handler),
        }
    }
}

/// Declarative binding descriptor. Every field besides the selector is
/// independently optional.
#[derive(Clone, Default)]
pub struct Binding {
    pub selector: String,
    pub show: Option<BindingValue<bool>>,
    pub text: Option<BindingValue<String>>,
    pub value: Option<BindingValue<String>>,
    pub render: Option<Rc<dyn Fn() -> Rendered>>,
    pub listeners: Vec<EventListener>,
    /// Output handle receiving the latest tracked node after each update.
    pub node_ref: Option<Ref<Option<Node>>>,
}

impl Binding {
    pub fn new(selector: &str) -> Binding {
        Binding {
            selector: selector.to_string(),
            ..Binding::default()
        }
    }

    pub fn show(mut self, show: impl Into<BindingValue<bool>>) -> Self {
        self.show = Some(show.into());
        self
    }

    pub fn text(mut self, text: impl Into<BindingValue<String>>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn value(mut self, value: impl Into<BindingValue<String>>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn render(mut self, render: impl Fn() -> Rendered + 'static) -> Self {
        self.render = Some(Rc::new(render));
        self
    }

    pub fn listener(mut self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
        self.listeners.push(EventListener::new(event, handler));
        self
    }

    pub fn node_ref(mut self, r: Ref<Option<Node>>) -> Self {
        self.node_ref = Some(r);
        self
    }
}

// =============================================================================
// Tracked render nodes
// =============================================================================

/// The DOM currently representing a binding's last render output: a single
/// node, or a dynamic child range bracketed by persistent comment anchors
/// (fragment results).
#[derive(Clone)]
pub enum TrackedNode {
    Single(Node),
    Range { start: Node, end: Node },
}

impl TrackedNode {
    /// The node reported through `node_ref` and used as the listener
    /// target: the single node, or the first element between the anchors
    /// (falling back to the start anchor for element-free ranges).
    pub fn target(&self) -> Node {
        match self {
            TrackedNode::Single(node) => node.clone(),
            TrackedNode::Range { start, end } => range_children(start, end)
                .into_iter()
                .find(Node::is_element)
                .unwrap_or_else(|| start.clone()),
        }
    }
}

/// Nodes currently between the two anchors, exclusive.
pub(crate) fn range_children(start: &Node, end: &Node) -> Vec<Node> {
    let mut out = Vec::new();
    let mut cursor = start.next_sibling();
    while let Some(node) = cursor {
        if node == *end {
            break;
        }
        cursor = node.next_sibling();
        out.push(node);
    }
    out
}

/// Reconcile a render result against the tracked node, returning the new
/// tracked state. Anchors, once created, persist for the binding's life.
pub(crate) fn apply_render(current: TrackedNode, result: Rendered) -> TrackedNode {
    let new_node = result.into_node();
    match current {
        TrackedNode::Single(node) => {
            if new_node.is_fragment() {
                let Some(parent) = node.parent() else {
                    warn!("render target is detached; fragment result dropped");
                    return TrackedNode::Single(node);
                };
                let start = Node::comment("glint:start");
                let end = Node::comment("glint:end");
                parent.insert_before(&start, Some(&node));
                parent.insert_before(&end, node.next_sibling().as_ref());
                // Splices the fragment's children between the anchors.
                node.replace_with(&new_node);
                TrackedNode::Range { start, end }
            } else {
                TrackedNode::Single(diff(&node, &new_node))
            }
        }
        TrackedNode::Range { start, end } => {
            let Some(parent) = start.parent() else {
                warn!("fragment anchors are detached; render result dropped");
                return TrackedNode::Range { start, end };
            };
            let old_children = range_children(&start, &end);
            let new_children = if new_node.is_fragment() {
                new_node.children()
            } else {
                vec![new_node]
            };
            patch_children_range(&parent, &old_children, &new_children, Some(&end));
            TrackedNode::Range { start, end }
        }
    }
}

// =============================================================================
// Compilation
// =============================================================================

/// Compile a binding against the document. Each element matching the
/// selector is compiled independently; zero matches compiles nothing.
pub fn compile(document: &Document, binding: &Binding) -> Result<(), Error> {
    let matches = document.query_selector_all(&binding.selector)?;
    if matches.is_empty() {
        debug!(selector = %binding.selector, "selector matched no elements");
    }
    for element in matches {
        compile_element(&element, binding);
    }
    Ok(())
}

fn compile_element(element: &Node, binding: &Binding) {
    let tracked = Rc::new(RefCell::new(TrackedNode::Single(element.clone())));

    let b = binding.clone();
    let t = tracked.clone();
    let update = UpdateFn::new(move || {
        let current = t.borrow().clone();

        if let TrackedNode::Single(node) = &current {
            if let Some(show) = &b.show {
                node.set_hidden(!show.get());
            }
            if let Some(text) = &b.text {
                node.set_text_content(text.get());
            }
            if let Some(value) = &b.value {
                if node.is_input_like() {
                    node.set_value(value.get());
                }
            }
        }

        if let Some(render) = &b.render {
            let next = apply_render(current, render());
            *t.borrow_mut() = next;
        }

        if let Some(node_ref) = &b.node_ref {
            let target = t.borrow().target();
            node_ref.set(Some(target));
        }
    });

    // First run under tracking establishes all subscriptions; subsequent
    // runs come from the bus and are untracked.
    update.run_tracked_compile();

    let target = tracked.borrow().target();
    for listener in &binding.listeners {
        target.add_listener(&listener.event, listener.handler.clone());
    }
}

// =============================================================================
// Tests
// =============================================================================
