//! App singleton.
//!
//! One [`App`] per thread owns the document and drives compilation.
//! Custom components registered through [`App::with_component`] are held
//! until the first [`App::resolve_options`] call, then resolved against
//! the document exactly once before any binding compiles. That way a
//! binding whose selector targets a component's render output still
//! finds its element.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::dom::Document;
use crate::error::Error;
use crate::reactivity::bus;
use crate::runtime::compile::{compile, Binding};
use crate::runtime::component::{
    compile_custom, register_component, reset_component_registry, resolve_components, Props,
};
use crate::runtime::Rendered;

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

struct AppInner {
    document: Document,
    components_resolved: Cell<bool>,
}

/// Handle to the per-thread app instance. Cheap to clone.
#[derive(Clone)]
pub struct App {
    inner: Rc<AppInner>,
}

impl App {
    /// Install the app for this thread, or return the already-installed
    /// instance (its document wins over the argument).
    pub fn new(document: Document) -> App {
        APP.with(|slot| {
            let mut slot = slot.borrow_mut();
            if let Some(existing) = &*slot {
                return existing.clone();
            }
            let app = App {
                inner: Rc::new(AppInner {
                    document,
                    components_resolved: Cell::new(false),
                }),
            };
            *slot = Some(app.clone());
            app
        })
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    /// Register a custom component. Resolution is deferred until the
    /// first `resolve_options` call.
    pub fn with_component(
        &self,
        name: &str,
        render: impl Fn(&Props) -> Rendered + 'static,
    ) -> &Self {
        register_component(name, render);
        self
    }

    /// Compile a set of bindings against the document, resolving any
    /// registered custom components first (once per app).
    pub fn resolve_options(&self, bindings: &[Binding]) -> Result<&Self, Error> {
        if !self.inner.components_resolved.get() {
            for component in resolve_components(self.inner.document.body()) {
                compile_custom(&component);
            }
            self.inner.components_resolved.set(true);
        }
        for binding in bindings {
            compile(&self.inner.document, binding)?;
        }
        Ok(self)
    }

    /// Drop every compile-phase subscription and compile `bindings`
    /// fresh. Used when the page's bound DOM is rebuilt and stale update
    /// callbacks would patch orphaned nodes.
    pub fn recompile(&self, bindings: &[Binding]) -> Result<&Self, Error> {
        bus::clear_compile_subscribers();
        for binding in bindings {
            compile(&self.inner.document, binding)?;
        }
        Ok(self)
    }
}

/// The installed app instance.
pub fn use_app() -> Result<App, Error> {
    APP.with(|slot| slot.borrow().clone().ok_or(Error::AppNotCreated))
}

/// Tear down the app singleton and the component registry. Call between
/// tests.
pub fn reset_app() {
    APP.with(|slot| *slot.borrow_mut() = None);
    reset_component_registry();
}
