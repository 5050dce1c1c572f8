//! Custom components and slot resolution.
//!
//! Components come in two flavors:
//!
//! - **Markup components**: registered by tag name, matched against
//!   custom elements already present in the document. Their attributes
//!   become props and their children become slot content, then the
//!   element is replaced by the component's render output under a
//!   tracked update callback ([`compile_custom`]).
//! - **Instance components**: constructed programmatically through
//!   [`mount_component`]. The setup function runs once under the
//!   instance's own update callback; reactive state created inside it
//!   survives re-renders because only the returned render closure
//!   replays.
//!
//! Slot content is parsed from the custom element's children: `template`
//! wrappers and `slot`-attributed elements feed named slots, everything
//! else feeds the `default` slot. Slot content may itself contain custom
//! elements; those resolve depth-first before the host renders.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::error;

use crate::dom::Node;
use crate::reactivity::tracking::{self, UpdateFn};
use crate::runtime::compile::{apply_render, TrackedNode};
use crate::runtime::Rendered;

// =============================================================================
// Registry
// =============================================================================

/// Render function of a markup component.
pub type ComponentRender = Rc<dyn Fn(&Props) -> Rendered>;

thread_local! {
    static REGISTRY: RefCell<IndexMap<String, ComponentRender>> =
        RefCell::new(IndexMap::new());
}

/// Register a component under a tag name. Names are case-insensitive;
/// an empty name is rejected.
pub fn register_component(name: &str, render: impl Fn(&Props) -> Rendered + 'static) {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        error!("component name must be non-empty");
        return;
    }
    REGISTRY.with(|r| r.borrow_mut().insert(name, Rc::new(render)));
}

fn registered(name: &str) -> Option<ComponentRender> {
    REGISTRY.with(|r| r.borrow().get(&name.to_lowercase()).cloned())
}

fn registered_names() -> Vec<String> {
    REGISTRY.with(|r| r.borrow().keys().cloned().collect())
}

/// Clear the component registry. Call between tests.
pub fn reset_component_registry() {
    REGISTRY.with(|r| r.borrow_mut().clear());
}

// =============================================================================
// Props and slots
// =============================================================================

/// Inputs to a component render: the custom element's attributes plus
/// its parsed slot content.
#[derive(Clone, Default)]
pub struct Props {
    pub attrs: IndexMap<String, String>,
    pub slots: HashMap<String, Vec<Node>>,
}

impl Props {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Content of a named slot; empty when the caller supplied none.
    pub fn slot(&self, name: &str) -> Vec<Node> {
        self.slots.get(name).cloned().unwrap_or_default()
    }

    /// Content of the `default` slot.
    pub fn children(&self) -> Vec<Node> {
        self.slot("default")
    }
}

/// The slot name a `template` wrapper targets: its `slot` attribute, or
/// a `#name` shorthand attribute. `None` means default content.
fn template_slot_name(template: &Node) -> Option<String> {
    let attrs = template.attributes();
    if let Some(name) = attrs.get("slot") {
        if !name.is_empty() {
            return Some(name.clone());
        }
    }
    attrs
        .keys()
        .find(|k| k.starts_with('#') && k.len() > 1)
        .map(|k| k[1..].to_string())
}

fn is_blank_text(node: &Node) -> bool {
    node.is_text() && node.text_content().trim().is_empty()
}

/// Parse a custom element's children into slot content. Content is
/// deep-cloned so the host element can be replaced without tearing the
/// slots apart.
pub fn parse_slots(custom: &Node) -> HashMap<String, Vec<Node>> {
    let mut slots: HashMap<String, Vec<Node>> = HashMap::new();
    let mut default_content: Vec<Node> = Vec::new();

    for child in custom.children() {
        if child.tag().as_deref() == Some("template") {
            let content: Vec<Node> = child
                .children()
                .iter()
                .filter(|n| !is_blank_text(n))
                .map(|n| n.clone_node(true))
                .collect();
            match template_slot_name(&child) {
                Some(name) => slots.entry(name).or_default().extend(content),
                None => default_content.extend(content),
            }
        } else if child.is_element() {
            match child.attributes().get("slot").filter(|s| !s.is_empty()) {
                Some(name) => slots
                    .entry(name.clone())
                    .or_default()
                    .push(child.clone_node(true)),
                None => default_content.push(child.clone_node(true)),
            }
        } else if child.is_text() {
            let text = child.text_content();
            if !text.trim().is_empty() {
                default_content.push(Node::text(text.trim().to_string()));
            }
        }
    }

    if !default_content.is_empty() {
        slots.entry("default".to_string()).or_default().extend(default_content);
    }
    slots
}

// =============================================================================
// Resolution against markup
// =============================================================================

/// A custom element matched to its registered render function, with
/// props already extracted.
#[derive(Clone)]
pub struct ResolvedComponent {
    pub el: Node,
    pub props: Props,
    pub render: ComponentRender,
}

fn resolve_element(el: &Node) -> Option<ResolvedComponent> {
    let tag = el.tag()?;
    let render = registered(&tag)?;
    let props = Props {
        attrs: el.attributes(),
        slots: parse_slots(el),
    };
    Some(ResolvedComponent {
        el: el.clone(),
        props,
        render,
    })
}

/// Find every registered custom element in `root`'s subtree, including
/// `root` itself, in document order.
pub fn resolve_components(root: &Node) -> Vec<ResolvedComponent> {
    let mut out = Vec::new();
    if let Some(resolved) = resolve_element(root) {
        out.push(resolved);
    }
    for name in registered_names() {
        if let Ok(matches) = root.query_selector_all(&name) {
            out.extend(matches.iter().filter_map(resolve_element));
        }
    }
    out
}

/// Replace custom elements appearing in slot content with their render
/// output, depth-first. Runs before the host's render sees the slots, so
/// a component only ever receives plain DOM as children.
fn process_slot_nodes(slots: &mut HashMap<String, Vec<Node>>) {
    for nodes in slots.values_mut() {
        let mut processed = Vec::with_capacity(nodes.len());
        for node in nodes.iter() {
            if node.is_element() {
                if let Some(resolved) = resolve_element(node) {
                    let mut props = resolved.props.clone();
                    process_slot_nodes(&mut props.slots);
                    processed.push((resolved.render)(&props).into_node());
                    continue;
                }
                // Nested custom elements deeper in the slot subtree are
                // compiled in place.
                for nested in resolve_components(node) {
                    if nested.el != *node {
                        compile_custom(&nested);
                    }
                }
            }
            processed.push(node.clone());
        }
        *nodes = processed;
    }
}

/// Compile a resolved custom element: replace it with its render output
/// under a tracked update callback, so reactive reads inside the render
/// re-run it through the usual diff/patch path.
pub fn compile_custom(component: &ResolvedComponent) {
    let tracked = Rc::new(RefCell::new(TrackedNode::Single(component.el.clone())));
    let render = component.render.clone();
    let props = Rc::new(RefCell::new(component.props.clone()));

    let t = tracked.clone();
    let update = UpdateFn::new(move || {
        process_slot_nodes(&mut props.borrow_mut().slots);
        // Released before user code runs.
        let snapshot = props.borrow().clone();
        let result = render(&snapshot);
        let current = t.borrow().clone();
        let next = apply_render(current, result);
        *t.borrow_mut() = next;
    });
    update.run_tracked_compile();
}

// =============================================================================
// Component instances
// =============================================================================

/// What a setup function produces: finished DOM (stateless, rendered
/// once), or a render closure replayed on every reactive update.
pub enum ComponentResult {
    Dom(Rendered),
    Render(ComponentRender),
}

/// Mount a component instance. `setup` runs exactly once under the
/// instance's update callback; state it creates is captured by the
/// returned render closure. The returned node is ready for insertion;
/// fragment roots come back wrapped with persistent comment anchors so
/// later updates can find their place.
pub fn mount_component(
    setup: impl Fn(&Props) -> ComponentResult + 'static,
    props: Props,
) -> Node {
    struct Instance {
        render: RefCell<Option<ComponentRender>>,
        props: Props,
        tracked: RefCell<Option<TrackedNode>>,
    }

    let instance = Rc::new(Instance {
        render: RefCell::new(None),
        props,
        tracked: RefCell::new(None),
    });

    // The update callback re-tracks its dependencies on every run, so a
    // render with branch-dependent reads stays subscribed correctly.
    let job_slot: Rc<RefCell<Option<UpdateFn>>> = Rc::new(RefCell::new(None));
    let update = {
        let instance = instance.clone();
        let job_slot = job_slot.clone();
        UpdateFn::new(move || {
            let Some(job) = job_slot.borrow().clone() else {
                return;
            };
            let Some(render) = instance.render.borrow().clone() else {
                return;
            };
            let Some(current) = instance.tracked.borrow().clone() else {
                return;
            };
            let result = tracking::with_subscriber(&job, || render(&instance.props));
            let next = apply_render(current, result);
            *instance.tracked.borrow_mut() = Some(next);
        })
    };
    *job_slot.borrow_mut() = Some(update.clone());

    let first = match tracking::with_subscriber(&update, || setup(&instance.props)) {
        ComponentResult::Render(render) => {
            *instance.render.borrow_mut() = Some(render.clone());
            tracking::with_subscriber(&update, || render(&instance.props))
        }
        // Stateless result: rendered once, never replayed.
        ComponentResult::Dom(rendered) => rendered,
    };

    let root = first.into_node();
    if root.is_fragment() {
        let start = Node::comment("glint:start");
        let end = Node::comment("glint:end");
        let wrapper = Node::fragment();
        wrapper.append_child(&start);
        wrapper.append_child(&root);
        wrapper.append_child(&end);
        *instance.tracked.borrow_mut() = Some(TrackedNode::Range { start, end });
        wrapper
    } else {
        *instance.tracked.borrow_mut() = Some(TrackedNode::Single(root.clone()));
        root
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::reactivity::reference::Ref;

    fn page_with(node: Node) -> Document {
        let doc = Document::new();
        doc.body().append_child(&node);
        doc
    }

    #[test]
    fn test_register_and_resolve_by_tag() {
        reset_component_registry();
        register_component("My-Badge", |_| Rendered::Node(Node::element("span")));

        let doc = page_with(
            Node::element("div").child(Node::element("my-badge").attr("label", "new")),
        );
        let resolved = resolve_components(doc.body());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].props.attr("label"), Some("new"));
    }

    #[test]
    fn test_root_itself_resolves() {
        reset_component_registry();
        register_component("panel", |_| Rendered::Node(Node::element("section")));

        let el = Node::element("panel");
        assert_eq!(resolve_components(&el).len(), 1);
    }

    #[test]
    fn test_parse_slots_named_and_default() {
        reset_component_registry();
        let custom = Node::element("card")
            .child(
                Node::element("template")
                    .attr("slot", "header")
                    .child(Node::element("h2").child(Node::text("Title"))),
            )
            .child(Node::element("p").child(Node::text("body text")))
            .child(Node::text("  \n  "));

        let slots = parse_slots(&custom);
        assert_eq!(slots["header"].len(), 1);
        assert_eq!(slots["header"][0].tag().as_deref(), Some("h2"));
        assert_eq!(slots["default"].len(), 1);
        assert_eq!(slots["default"][0].tag().as_deref(), Some("p"));
        // Whitespace-only text contributes nothing.
    }

    #[test]
    fn test_parse_slots_hash_shorthand() {
        let custom = Node::element("card").child(
            Node::element("template")
                .attr("#footer", "")
                .child(Node::element("small")),
        );
        let slots = parse_slots(&custom);
        assert_eq!(slots["footer"].len(), 1);
    }

    #[test]
    fn test_slot_content_is_cloned() {
        let original = Node::element("p").child(Node::text("hi"));
        let custom = Node::element("card").child(original.clone());
        let slots = parse_slots(&custom);
        assert_ne!(slots["default"][0], original);
        assert_eq!(slots["default"][0].text_content(), "hi");
    }

    #[test]
    fn test_compile_custom_replaces_element_reactively() {
        reset_component_registry();
        let count = Ref::new(0);
        {
            let count = count.clone();
            register_component("counter-view", move |props| {
                let label = props.attr("label").unwrap_or("count").to_string();
                Rendered::Node(
                    Node::element("div")
                        .child(Node::text(format!("{label}: {}", count.get()))),
                )
            });
        }

        let doc = page_with(Node::element("counter-view").attr("label", "clicks"));
        for resolved in resolve_components(doc.body()) {
            compile_custom(&resolved);
        }
        assert_eq!(doc.body().text_content(), "clicks: 0");

        count.set(5);
        assert_eq!(doc.body().text_content(), "clicks: 5");
    }

    #[test]
    fn test_render_receives_slot_children() {
        reset_component_registry();
        register_component("card", |props| {
            let body = Node::element("article");
            for child in props.children() {
                body.append_child(&child);
            }
            Rendered::Node(body)
        });

        let doc = page_with(
            Node::element("card").child(Node::element("p").child(Node::text("inner"))),
        );
        for resolved in resolve_components(doc.body()) {
            compile_custom(&resolved);
        }
        assert_eq!(
            doc.body().outer_html(),
            "<body><article><p>inner</p></article></body>"
        );
    }

    #[test]
    fn test_nested_component_in_slot_resolves_first() {
        reset_component_registry();
        register_component("chip", |_| {
            Rendered::Node(Node::element("span").child(Node::text("chip")))
        });
        register_component("card", |props| {
            let body = Node::element("article");
            for child in props.children() {
                body.append_child(&child);
            }
            Rendered::Node(body)
        });

        let doc = page_with(Node::element("card").child(Node::element("chip")));
        for resolved in resolve_components(doc.body()) {
            if resolved.el.tag().as_deref() == Some("card") {
                compile_custom(&resolved);
            }
        }
        assert_eq!(
            doc.body().outer_html(),
            "<body><article><span>chip</span></article></body>"
        );
    }

    #[test]
    fn test_mount_component_state_survives_rerenders() {
        let doc = Document::new();
        let count = Ref::new(0);

        let count_in = count.clone();
        let root = mount_component(
            move |_| {
                // Setup runs once; the render closure replays.
                let count = count_in.clone();
                ComponentResult::Render(Rc::new(move |_| {
                    Rendered::Node(
                        Node::element("p").child(Node::text(count.get().to_string())),
                    )
                }))
            },
            Props::default(),
        );
        doc.body().append_child(&root);
        assert_eq!(doc.body().text_content(), "0");

        count.set(1);
        count.set(2);
        assert_eq!(doc.body().text_content(), "2");
    }

    #[test]
    fn test_mount_component_dom_result_is_static() {
        let doc = Document::new();
        let count = Ref::new(0);

        let count_in = count.clone();
        let root = mount_component(
            move |_| {
                ComponentResult::Dom(Rendered::Node(
                    Node::element("p").child(Node::text(count_in.get().to_string())),
                ))
            },
            Props::default(),
        );
        doc.body().append_child(&root);
        assert_eq!(doc.body().text_content(), "0");

        count.set(9);
        assert_eq!(doc.body().text_content(), "0");
    }

    #[test]
    fn test_mount_component_fragment_root_gets_anchors() {
        let doc = Document::new();
        let items = Ref::new(vec!["a".to_string(), "b".to_string()]);

        let items_in = items.clone();
        let root = mount_component(
            move |_| {
                let items = items_in.clone();
                ComponentResult::Render(Rc::new(move |_| {
                    let frag = Node::fragment();
                    for item in items.get() {
                        frag.append_child(&Node::element("li").child(Node::text(item)));
                    }
                    Rendered::Node(frag)
                }))
            },
            Props::default(),
        );
        doc.body().append_child(&root);
        assert_eq!(
            doc.body().outer_html(),
            "<body><!--glint:start--><li>a</li><li>b</li><!--glint:end--></body>"
        );

        items.set(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(
            doc.body().outer_html(),
            "<body><!--glint:start--><li>a</li><li>b</li><li>c</li><!--glint:end--></body>"
        );
    }

    #[test]
    fn test_empty_component_name_is_rejected() {
        reset_component_registry();
        register_component("  ", |_| Rendered::Text(String::new()));
        assert!(registered_names().is_empty());
    }
}
