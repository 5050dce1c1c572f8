//! `watch` and `watch_effect`.
//!
//! `watch` observes one source and invokes a callback with new and old
//! values. Sources are a tagged union, so watching a plain non-reactive
//! value cannot be expressed:
//!
//! - [`WatchSource::Getter`] - re-evaluated (and re-tracked) on every
//!   dependency change; the callback fires only when the result differs.
//! - [`WatchSource::Ref`] - subscribes to the ref directly; the callback
//!   fires on value changes, gated by `PartialEq`.
//!
//! Reactive object graphs are watched with [`watch_reactive`], which fires
//! unconditionally on every publish - a shared trigger handle carries no
//! meaningful old/new pair.

use std::cell::RefCell;
use std::rc::Rc;

use super::bus;
use super::reactive::Reactive;
use super::reference::Ref;
use super::tracking::{self, UpdateFn};

/// What a [`watch`] call observes.
pub enum WatchSource<T> {
    /// A getter re-run on any dependency change.
    Getter(Rc<dyn Fn() -> T>),
    /// A ref handle, subscribed directly.
    Ref(Ref<T>),
}

impl<T> WatchSource<T> {
    pub fn getter(f: impl Fn() -> T + 'static) -> WatchSource<T> {
        WatchSource::Getter(Rc::new(f))
    }
}

impl<T> From<Ref<T>> for WatchSource<T> {
    fn from(r: Ref<T>) -> Self {
        WatchSource::Ref(r)
    }
}

/// Observe `source`, invoking `callback(new, old)` when its value changes.
pub fn watch<T: Clone + PartialEq + 'static>(
    source: impl Into<WatchSource<T>>,
    callback: impl Fn(&T, &T) + 'static,
) {
    match source.into() {
        WatchSource::Getter(getter) => watch_getter(getter, callback),
        WatchSource::Ref(r) => watch_ref(&r, callback),
    }
}

fn watch_getter<T: Clone + PartialEq + 'static>(
    getter: Rc<dyn Fn() -> T>,
    callback: impl Fn(&T, &T) + 'static,
) {
    let old_state: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
    // The job needs itself as the tracking subscriber, so it reaches
    // through a slot filled in right after construction.
    let job_slot: Rc<RefCell<Option<UpdateFn>>> = Rc::new(RefCell::new(None));

    let job = {
        let getter = getter.clone();
        let old_state = old_state.clone();
        let job_slot = job_slot.clone();
        UpdateFn::new(move || {
            let Some(job) = job_slot.borrow().clone() else {
                return;
            };
            // Re-track on every run, so conditional dependencies stay live.
            let new_value = tracking::with_subscriber(&job, || getter());
            let prev = {
                let mut old = old_state.borrow_mut();
                if old.as_ref() == Some(&new_value) {
                    return;
                }
                old.replace(new_value.clone())
            };
            if let Some(prev) = prev {
                callback(&new_value, &prev);
            }
        })
    };
    *job_slot.borrow_mut() = Some(job.clone());

    // Initial evaluation establishes subscriptions without firing the
    // callback.
    let initial = tracking::with_subscriber(&job, || getter());
    *old_state.borrow_mut() = Some(initial);
}

fn watch_ref<T: Clone + PartialEq + 'static>(r: &Ref<T>, callback: impl Fn(&T, &T) + 'static) {
    let old_state = Rc::new(RefCell::new(r.peek()));
    let source = r.clone();
    bus::subscribe(
        r.source(),
        &UpdateFn::new(move || {
            let new_value = source.peek();
            let prev = {
                let mut old = old_state.borrow_mut();
                if *old == new_value {
                    return;
                }
                std::mem::replace(&mut *old, new_value.clone())
            };
            callback(&new_value, &prev);
        }),
    );
}

/// Observe a reactive object graph. The callback runs unconditionally on
/// every publish of the graph's trigger handle.
pub fn watch_reactive<T: 'static>(source: &Reactive<T>, callback: impl Fn() + 'static) {
    bus::subscribe(source.trigger(), &UpdateFn::new(callback));
}

/// Run `f` once as its own update callback, subscribing to everything it
/// reads, and re-run it wholesale whenever any of those sources change.
pub fn watch_effect(f: impl Fn() + 'static) {
    UpdateFn::new(f).run_tracked();
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_watch_ref_reports_new_and_old() {
        let r = Ref::new(1);
        let log: Rc<RefCell<Vec<(i32, i32)>>> = Rc::new(RefCell::new(Vec::new()));
        let log_in = log.clone();

        watch(r.clone(), move |new, old| {
            log_in.borrow_mut().push((*new, *old));
        });

        r.set(2);
        r.set(2); // no-op, suppressed at the ref
        r.set(5);
        assert_eq!(*log.borrow(), vec![(2, 1), (5, 2)]);
    }

    #[test]
    fn test_watch_getter_fires_only_on_result_change() {
        let a = Ref::new(1);
        let b = Ref::new(1);
        let fired = Rc::new(Cell::new(0));

        let (a_in, b_in) = (a.clone(), b.clone());
        let fired_in = fired.clone();
        watch(
            WatchSource::getter(move || a_in.get().min(b_in.get())),
            move |_, _| fired_in.set(fired_in.get() + 1),
        );

        a.set(5); // min(5, 1) == 1, unchanged
        assert_eq!(fired.get(), 0);
        b.set(3); // min(5, 3) == 3
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_watch_getter_retracks_conditional_dependencies() {
        let flag = Ref::new(true);
        let a = Ref::new(1);
        let b = Ref::new(10);
        let fired = Rc::new(Cell::new(0));

        let (flag_in, a_in, b_in) = (flag.clone(), a.clone(), b.clone());
        let fired_in = fired.clone();
        watch(
            WatchSource::getter(move || if flag_in.get() { a_in.get() } else { b_in.get() }),
            move |_, _| fired_in.set(fired_in.get() + 1),
        );

        flag.set(false); // value 1 -> 10
        assert_eq!(fired.get(), 1);
        b.set(20); // b became a live dependency on the re-run
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn test_watch_reactive_fires_on_every_publish() {
        let list = Reactive::new(vec![1]);
        let fired = Rc::new(Cell::new(0));
        let fired_in = fired.clone();

        watch_reactive(&list, move || fired_in.set(fired_in.get() + 1));

        list.push(2);
        list.update(|_| {}); // no observable change, still a publish
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn test_watch_effect_runs_immediately_then_on_change() {
        let r = Ref::new(0);
        let runs = Rc::new(Cell::new(0));

        let r_in = r.clone();
        let runs_in = runs.clone();
        watch_effect(move || {
            runs_in.set(runs_in.get() + 1);
            let _ = r_in.get();
        });
        assert_eq!(runs.get(), 1);

        r.set(1);
        assert_eq!(runs.get(), 2);
    }
}
