//! `Reactive<T>` - object-graph reactivity with a shared trigger handle.
//!
//! Granularity is deliberately coarse: one trigger handle is shared by
//! the whole object graph, so any mutation anywhere in the graph re-runs
//! every reader of any part of it. Reads go through [`Reactive::with`]
//! (subscribing the current update callback to the graph's single
//! trigger), writes through [`Reactive::update`] (one publish per
//! mutation, however deep).
//!
//! [`Reactive<Vec<T>>`] additionally carries the usual mutating vector
//! methods - each runs the underlying `Vec` operation and then publishes
//! once.

use std::cell::RefCell;
use std::fmt;
use std::ops::RangeBounds;
use std::rc::Rc;

use super::bus::{self, SourceId};

/// A reactive object wrapper with one trigger handle for the whole value.
///
/// Cloning shares the underlying value and trigger.
pub struct Reactive<T> {
    value: Rc<RefCell<T>>,
    trigger: SourceId,
}

impl<T> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        Reactive {
            value: self.value.clone(),
            trigger: self.trigger,
        }
    }
}

impl<T> Reactive<T> {
    pub fn new(initial: T) -> Reactive<T> {
        Reactive {
            value: Rc::new(RefCell::new(initial)),
            trigger: bus::next_source_id(),
        }
    }

    /// The trigger handle every read subscribes to and every write
    /// publishes on.
    pub fn trigger(&self) -> SourceId {
        self.trigger
    }

    /// Tracked read. Any mutation anywhere in the graph re-runs the
    /// subscribed callback, matching the proxy's per-object granularity.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        bus::track_read(self.trigger);
        f(&self.value.borrow())
    }

    /// Untracked read.
    pub fn peek<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Mutate the value and publish once.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.value.borrow_mut());
        bus::notify_write(self.trigger);
        result
    }
}

impl<T: PartialEq> Reactive<T> {
    /// Replace the whole value, publishing only when it changed.
    pub fn set(&self, value: T) {
        let changed = {
            let mut current = self.value.borrow_mut();
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        };
        if changed {
            bus::notify_write(self.trigger);
        }
    }
}

impl<T: Clone> Reactive<T> {
    /// Tracked clone of the whole value.
    pub fn get(&self) -> T {
        self.with(|v| v.clone())
    }
}

// =============================================================================
// Reactive vectors - intercepted mutating methods
// =============================================================================

impl<T> Reactive<Vec<T>> {
    /// Tracked length read.
    pub fn len(&self) -> usize {
        self.with(|v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.with(|v| v.is_empty())
    }

    pub fn push(&self, value: T) {
        self.update(|v| v.push(value));
    }

    pub fn pop(&self) -> Option<T> {
        self.update(|v| v.pop())
    }

    /// Remove and return the first element (`shift`).
    pub fn shift(&self) -> Option<T> {
        self.update(|v| if v.is_empty() { None } else { Some(v.remove(0)) })
    }

    /// Insert at the front (`unshift`).
    pub fn unshift(&self, value: T) {
        self.update(|v| v.insert(0, value));
    }

    pub fn insert(&self, index: usize, value: T) {
        self.update(|v| v.insert(index, value));
    }

    pub fn remove(&self, index: usize) -> T {
        self.update(|v| v.remove(index))
    }

    /// Replace `range` with `replacement`, returning the removed elements.
    pub fn splice(&self, range: impl RangeBounds<usize>, replacement: Vec<T>) -> Vec<T> {
        self.update(|v| v.splice(range, replacement).collect())
    }

    pub fn reverse(&self) {
        self.update(|v| v.reverse());
    }

    /// Shrink to `len` elements.
    pub fn truncate(&self, len: usize) {
        self.update(|v| v.truncate(len));
    }

    pub fn clear(&self) {
        self.update(|v| v.clear());
    }

    /// Index assignment. Publishes unconditionally, like the proxy's
    /// numeric-key set trap.
    pub fn set_at(&self, index: usize, value: T) {
        self.update(|v| v[index] = value);
    }
}

impl<T: Clone> Reactive<Vec<T>> {
    /// Tracked element read.
    pub fn get_at(&self, index: usize) -> Option<T> {
        self.with(|v| v.get(index).cloned())
    }

    /// Overwrite every element with `value`.
    pub fn fill(&self, value: T) {
        self.update(|v| v.fill(value));
    }
}

impl<T: Copy> Reactive<Vec<T>> {
    /// Copy `src` into the region starting at `dest` (`copyWithin`).
    pub fn copy_within(&self, src: impl RangeBounds<usize>, dest: usize) {
        self.update(|v| v.copy_within(src, dest));
    }
}

impl<T: fmt::Debug> fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reactive({:?})", self.value.borrow())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactivity::tracking::UpdateFn;
    use std::cell::Cell;

    fn counting_subscriber<T: 'static>(source: &Reactive<T>) -> Rc<Cell<u32>> {
        let runs = Rc::new(Cell::new(0));
        let runs_in = runs.clone();
        let source_in = source.clone();
        UpdateFn::new(move || {
            runs_in.set(runs_in.get() + 1);
            source_in.with(|_| {});
        })
        .run_tracked();
        runs
    }

    #[test]
    fn test_any_field_write_republishes_shared_trigger() {
        #[derive(Default)]
        struct Profile {
            name: String,
            age: u32,
        }

        let profile = Reactive::new(Profile::default());
        let runs = Rc::new(Cell::new(0));
        let runs_in = runs.clone();
        let p = profile.clone();
        // Subscriber reads only `name`, but the trigger is graph-wide.
        UpdateFn::new(move || {
            runs_in.set(runs_in.get() + 1);
            p.with(|v| v.name.len());
        })
        .run_tracked();

        profile.update(|v| v.age = 30);
        assert_eq!(runs.get(), 2);
        profile.update(|v| v.name = "ada".into());
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn test_vec_methods_publish_once_each() {
        let list = Reactive::new(vec![1, 2, 3]);
        let runs = counting_subscriber(&list);
        assert_eq!(runs.get(), 1);

        list.push(4);
        assert_eq!(runs.get(), 2);
        assert_eq!(list.pop(), Some(4));
        assert_eq!(runs.get(), 3);
        assert_eq!(list.shift(), Some(1));
        assert_eq!(runs.get(), 4);
        list.unshift(0);
        assert_eq!(runs.get(), 5);
        let removed = list.splice(0..2, vec![9]);
        assert_eq!(removed, vec![0, 2]);
        assert_eq!(runs.get(), 6);
        list.reverse();
        assert_eq!(runs.get(), 7);
        list.peek(|v| assert_eq!(*v, vec![3, 9]));
    }

    #[test]
    fn test_index_assignment_and_truncate_publish() {
        let list = Reactive::new(vec![1, 2, 3]);
        let runs = counting_subscriber(&list);

        list.set_at(1, 20);
        assert_eq!(runs.get(), 2);
        list.truncate(1);
        assert_eq!(runs.get(), 3);
        assert_eq!(list.peek(|v| v.clone()), vec![1]);
    }

    #[test]
    fn test_set_suppresses_equal_replacement() {
        let value = Reactive::new(vec![1, 2]);
        let runs = counting_subscriber(&value);

        value.set(vec![1, 2]);
        assert_eq!(runs.get(), 1);
        value.set(vec![3]);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_peek_is_inert() {
        let value = Reactive::new(0u32);
        let v = value.clone();
        UpdateFn::new(move || {
            v.peek(|_| {});
        })
        .run_tracked();
        assert_eq!(bus::subscriber_count(value.trigger()), 0);
    }

    #[test]
    fn test_fill_and_copy_within() {
        let list = Reactive::new(vec![1, 2, 3, 4]);
        let runs = counting_subscriber(&list);

        list.copy_within(0..2, 2);
        assert_eq!(list.peek(|v| v.clone()), vec![1, 2, 1, 2]);
        list.fill(7);
        assert_eq!(list.peek(|v| v.clone()), vec![7, 7, 7, 7]);
        assert_eq!(runs.get(), 3);
    }
}
