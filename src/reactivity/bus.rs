//! Event/subscription bus.
//!
//! Maps an opaque [`SourceId`] to the ordered set of update callbacks that
//! read it during a tracked execution. Subscription is idempotent per
//! callback identity; publishing runs the callbacks in subscription order.
//! Publishing never removes subscribers - the only removal path is the
//! explicit compile-phase clear used by bulk recompiles.
//!
//! Callbacks run over a snapshot, so a running callback may freely
//! subscribe or publish again. Propagation is synchronous and recursive; a
//! panicking callback aborts the rest of its publish pass.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use super::tracking::{self, UpdateFn};

/// Opaque identity of a reactive source. Every `Ref`, `Reactive`, and
/// `computed` owns exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

thread_local! {
    static NEXT_SOURCE_ID: Cell<u64> = const { Cell::new(0) };
    static BUS: RefCell<EventBus> = RefCell::new(EventBus::new());
}

/// Allocate a fresh source id.
pub fn next_source_id() -> SourceId {
    NEXT_SOURCE_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        SourceId(id)
    })
}

struct EventBus {
    subscribers: HashMap<SourceId, IndexMap<usize, UpdateFn>>,
    /// Which subscriptions were made during a compile-phase run.
    compile_subscribers: HashMap<SourceId, HashSet<usize>>,
}

impl EventBus {
    fn new() -> EventBus {
        EventBus {
            subscribers: HashMap::new(),
            compile_subscribers: HashMap::new(),
        }
    }
}

/// Subscribe `callback` to `source`. Re-subscribing the same callback is a
/// no-op that keeps its original position in the order.
pub fn subscribe(source: SourceId, callback: &UpdateFn) {
    let compile_phase = tracking::in_compile_phase();
    BUS.with(|bus| {
        let mut bus = bus.borrow_mut();
        bus.subscribers
            .entry(source)
            .or_default()
            .entry(callback.id())
            .or_insert_with(|| callback.clone());
        if compile_phase {
            bus.compile_subscribers
                .entry(source)
                .or_default()
                .insert(callback.id());
        }
    });
}

/// Subscribe the currently tracked update callback, if any, to `source`.
/// Inert outside a tracked execution.
pub fn track_read(source: SourceId) {
    if let Some(callback) = tracking::current_update_fn() {
        subscribe(source, &callback);
    }
}

/// Run every callback subscribed to `source`, in subscription order.
pub fn notify_write(source: SourceId) {
    let snapshot: Vec<UpdateFn> = BUS.with(|bus| {
        bus.borrow()
            .subscribers
            .get(&source)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default()
    });
    for callback in snapshot {
        callback.call();
    }
}

/// Drop every subscription that was made during a compile-phase run.
/// Used before recompiling a page's bindings from scratch.
pub fn clear_compile_subscribers() {
    BUS.with(|bus| {
        let mut bus = bus.borrow_mut();
        let compile = std::mem::take(&mut bus.compile_subscribers);
        for (source, ids) in compile {
            if let Some(set) = bus.subscribers.get_mut(&source) {
                set.retain(|id, _| !ids.contains(id));
            }
        }
    });
}

/// Number of callbacks currently subscribed to `source`.
pub fn subscriber_count(source: SourceId) -> usize {
    BUS.with(|bus| {
        bus.borrow()
            .subscribers
            .get(&source)
            .map_or(0, |set| set.len())
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_subscribe_is_idempotent() {
        let source = next_source_id();
        let cb = UpdateFn::new(|| {});
        subscribe(source, &cb);
        subscribe(source, &cb);
        subscribe(source, &cb.clone());
        assert_eq!(subscriber_count(source), 1);
    }

    #[test]
    fn test_publish_runs_in_subscription_order() {
        let source = next_source_id();
        let log: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3u8 {
            let log = log.clone();
            subscribe(source, &UpdateFn::new(move || log.borrow_mut().push(i)));
        }

        notify_write(source);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_track_read_outside_tracking_is_inert() {
        let source = next_source_id();
        track_read(source);
        assert_eq!(subscriber_count(source), 0);
    }

    #[test]
    fn test_track_read_subscribes_current_callback() {
        let source = next_source_id();
        let cb = UpdateFn::new(move || track_read(source));
        cb.run_tracked();
        assert_eq!(subscriber_count(source), 1);
    }

    #[test]
    fn test_clear_compile_subscribers_keeps_runtime_subs() {
        let source = next_source_id();

        let runtime = UpdateFn::new(move || track_read(source));
        runtime.run_tracked();

        let compiled = UpdateFn::new(move || track_read(source));
        compiled.run_tracked_compile();

        assert_eq!(subscriber_count(source), 2);
        clear_compile_subscribers();
        assert_eq!(subscriber_count(source), 1);
    }

    #[test]
    fn test_callback_may_subscribe_during_publish() {
        let source = next_source_id();
        let other = next_source_id();
        let cb = UpdateFn::new(move || {
            subscribe(other, &UpdateFn::new(|| {}));
        });
        subscribe(source, &cb);
        notify_write(source);
        assert_eq!(subscriber_count(other), 1);
    }
}
