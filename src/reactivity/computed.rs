//! Derived refs.
//!
//! `computed` re-runs its getter as an update callback whenever any source
//! read during the first (tracked) evaluation changes, and writes the
//! result through [`Ref::set`]. Because `set` is equality-gated, a
//! computed notifies its own subscribers only when the recomputed value
//! actually differs - the authoritative rule for both observation paths.

use std::cell::RefCell;
use std::rc::Rc;

use super::reference::Ref;
use super::tracking::{self, UpdateFn};

/// Create a ref kept in sync by re-running `f` when its dependencies
/// change. Dependencies are captured during the initial evaluation.
pub fn computed<T: Clone + PartialEq + 'static>(f: impl Fn() -> T + 'static) -> Ref<T> {
    let f = Rc::new(f);
    let slot: Rc<RefCell<Option<Ref<T>>>> = Rc::new(RefCell::new(None));

    let recompute = {
        let slot = slot.clone();
        let f = f.clone();
        UpdateFn::new(move || {
            let target = slot.borrow().clone();
            if let Some(target) = target {
                target.set(f());
            }
        })
    };

    // The seed evaluation runs under the recompute callback so every
    // reactive read subscribes it.
    let initial = tracking::with_subscriber(&recompute, || f());
    let result = Ref::new(initial);
    *slot.borrow_mut() = Some(result.clone());
    result
}

// =============================================================================
// Tests
// =============================================================================
