//! DOM diff/patch engine.
//!
//! Reconciles a previously rendered subtree against freshly rendered nodes
//! by mutating the old subtree in place, preserving node identity wherever
//! the shapes line up - the property that keeps focus, selection, and
//! user-typed input alive across re-renders.
//!
//! # Algorithm
//!
//! 1. Different kind or tag: replace the old node wholesale; the new node
//!    becomes the tracked result.
//! 2. Text/comment: overwrite content only when it differs; identity kept.
//! 3. Same-tag elements: sync attributes (with the controlled/uncontrolled
//!    `value` asymmetry), sync listeners by handler identity, then
//!    reconcile children - keyed when any new child carries a key,
//!    index-positional otherwise.
//! 4. Fragments are never diffed: insertion empties them, so `diff` hands
//!    back the new fragment verbatim and callers track content through
//!    anchor nodes instead.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::dom::Node;

/// Reconcile `old` against `new`, returning the node that now represents
/// the rendered output: `old` when patched in place, `new` when replaced.
pub fn diff(old: &Node, new: &Node) -> Node {
    if !old.same_shape(new) {
        old.replace_with(new);
        return new.clone();
    }

    if old.is_text() || old.is_comment() {
        let new_text = new.text_content();
        if old.text_content() != new_text {
            old.set_text_content(new_text);
        }
        return old.clone();
    }

    if old.is_fragment() {
        // A fragment has no DOM identity once inserted. Callers must
        // bracket fragment content with anchors before reaching here.
        return new.clone();
    }

    update_attributes(old, new);
    update_listeners(old, new);
    update_children(old, new);
    old.clone()
}

/// Reconcile two explicit child lists under `parent`, keyed when the new
/// list carries keys.
pub fn diff_children(parent: &Node, old_list: &[Node], new_list: &[Node]) {
    patch_children_range(parent, old_list, new_list, None);
}

/// Like [`diff_children`], bounded by an optional end `anchor`: appended
/// nodes land immediately before it. Used for content tracked between
/// fragment anchors.
pub fn patch_children_range(
    parent: &Node,
    old_list: &[Node],
    new_list: &[Node],
    anchor: Option<&Node>,
) {
    if has_keyed_children(new_list) {
        patch_keyed_children(parent, old_list, new_list, anchor);
    } else {
        positional_patch(parent, old_list, new_list, anchor);
    }
}

/// True when at least one child carries an explicit key.
pub fn has_keyed_children(children: &[Node]) -> bool {
    children.iter().any(|c| c.key().is_some())
}

// =============================================================================
// Attributes and listeners
// =============================================================================

fn update_attributes(old: &Node, new: &Node) {
    for name in old.attribute_names() {
        if !new.has_attribute(&name) {
            old.remove_attribute(&name);
        }
    }
    for name in new.attribute_names() {
        if let Some(value) = new.attribute(&name) {
            if old.attribute(&name).as_deref() != Some(value.as_str()) {
                old.set_attribute(&name, value);
            }
        }
    }
    sync_value_property(old, new);
}

/// Controlled/uncontrolled `value` rule: force-sync the live property only
/// when the new element declares a `value` attribute or its effective
/// value is non-empty. A new render with no opinion about the value must
/// not clobber user-typed text.
fn sync_value_property(old: &Node, new: &Node) {
    if !old.is_input_like() || !new.is_input_like() {
        return;
    }
    let new_value = new.value();
    if new_value == old.value() {
        return;
    }
    if new.has_attribute("value") || !new_value.is_empty() {
        old.set_value(new_value);
    }
}

fn update_listeners(old: &Node, new: &Node) {
    // Remove listeners whose handler changed or disappeared.
    for name in old.listener_names() {
        let unchanged = match (old.listener(&name), new.listener(&name)) {
            (Some(a), Some(b)) => Rc::ptr_eq(&a, &b),
            _ => false,
        };
        if !unchanged {
            old.remove_listener(&name);
        }
    }
    // Add the new ones; unchanged handlers stay attached untouched.
    for name in new.listener_names() {
        if old.listener(&name).is_none() {
            if let Some(handler) = new.listener(&name) {
                old.add_listener(&name, handler);
            }
        }
    }
}

// =============================================================================
// Children
// =============================================================================

fn update_children(old: &Node, new: &Node) {
    let old_children = old.children();
    let new_children = new.children();
    patch_children_range(old, &old_children, &new_children, None);
}

fn positional_patch(parent: &Node, old_list: &[Node], new_list: &[Node], anchor: Option<&Node>) {
    let max = old_list.len().max(new_list.len());
    for i in 0..max {
        match (old_list.get(i), new_list.get(i)) {
            (None, Some(new_child)) => parent.insert_before(new_child, anchor),
            (Some(old_child), None) => parent.remove_child(old_child),
            (Some(old_child), Some(new_child)) => {
                diff(old_child, new_child);
            }
            (None, None) => unreachable!(),
        }
    }
}

/// Keyed child reconciliation.
///
/// Old children are indexed by key; each new child either patches its
/// keyed match in place (reusing the DOM node) or is inserted fresh.
/// Children without a key among a keyed set never match - partial keying
/// degrades to extra churn, never to wrong output. Old children that were
/// not reused are removed, then the result list is walked back to front,
/// moving a node only when it is not already immediately before the
/// running anchor.
pub fn patch_keyed_children(
    parent: &Node,
    old_children: &[Node],
    new_children: &[Node],
    anchor: Option<&Node>,
) {
    let mut old_by_key: HashMap<String, Node> = HashMap::new();
    for child in old_children {
        if let Some(key) = child.key() {
            old_by_key.insert(key, child.clone());
        }
    }

    let mut reused: HashSet<usize> = HashSet::new();
    let mut result: Vec<Node> = Vec::with_capacity(new_children.len());

    for new_child in new_children {
        let matched = new_child
            .key()
            .and_then(|key| old_by_key.get(&key).cloned());
        match matched {
            Some(old_child) => {
                let patched = diff(&old_child, new_child);
                reused.insert(old_child.id());
                result.push(patched);
            }
            None => result.push(new_child.clone()),
        }
    }

    for old_child in old_children {
        if !reused.contains(&old_child.id()) {
            parent.remove_child(old_child);
        }
    }

    // Reorder with minimal moves: back to front, a node already sitting
    // immediately before the running anchor stays put.
    let mut insert_anchor: Option<Node> = anchor.cloned();
    for node in result.iter().rev() {
        let in_place = node.parent().as_ref() == Some(parent) && node.next_sibling() == insert_anchor;
        if !in_place {
            parent.insert_before(node, insert_anchor.as_ref());
        }
        insert_anchor = Some(node.clone());
    }
}

// =============================================================================
// Tests
// =============================================================================
