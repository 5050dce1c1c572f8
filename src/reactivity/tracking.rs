//! Current-subscriber tracking.
//!
//! A single thread-local slot holds the update callback currently
//! executing. Reactive reads consult it to register subscriptions; reads
//! outside any tracked execution are inert. The slot is deliberately not a
//! stack: nested tracked executions save and restore the previous value
//! around their own run ([`with_subscriber`]), the discipline component
//! mounting relies on to keep re-renders local.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A zero-argument update callback with pointer identity.
///
/// Cloning shares the underlying closure; two clones compare equal for
/// subscription purposes via [`UpdateFn::id`].
#[derive(Clone)]
pub struct UpdateFn {
    f: Rc<dyn Fn()>,
}

impl UpdateFn {
    pub fn new(f: impl Fn() + 'static) -> UpdateFn {
        UpdateFn { f: Rc::new(f) }
    }

    /// Identity of the underlying closure, used to keep subscriber sets
    /// idempotent.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.f) as *const () as usize
    }

    pub fn call(&self) {
        (self.f)()
    }

    /// Run this callback with itself installed as the current subscriber,
    /// so every reactive read during the run subscribes it.
    pub fn run_tracked(&self) {
        with_subscriber(self, || self.call());
    }

    /// Like [`run_tracked`](UpdateFn::run_tracked), additionally marking
    /// the subscriptions as compile-phase so they can be bulk-cleared.
    pub fn run_tracked_compile(&self) {
        let prev = COMPILE_PHASE.with(|c| c.replace(true));
        with_subscriber(self, || self.call());
        COMPILE_PHASE.with(|c| c.set(prev));
    }
}

thread_local! {
    static CURRENT: RefCell<Option<UpdateFn>> = const { RefCell::new(None) };
    static COMPILE_PHASE: Cell<bool> = const { Cell::new(false) };
}

/// The update callback currently executing, if any.
pub fn current_update_fn() -> Option<UpdateFn> {
    CURRENT.with(|c| c.borrow().clone())
}

/// Overwrite the current-subscriber slot. Prefer [`with_subscriber`],
/// which restores the previous value.
pub fn set_current_update_fn(f: Option<UpdateFn>) {
    CURRENT.with(|c| *c.borrow_mut() = f);
}

/// True while a compile-phase tracked run is executing.
pub fn in_compile_phase() -> bool {
    COMPILE_PHASE.with(|c| c.get())
}

/// Run `f` with `subscriber` installed, restoring the previous subscriber
/// afterwards.
pub fn with_subscriber<R>(subscriber: &UpdateFn, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT.with(|c| c.replace(Some(subscriber.clone())));
    let result = f();
    CURRENT.with(|c| *c.borrow_mut() = prev);
    result
}

// =============================================================================
// Tests
// =============================================================================
