//! `Ref<T>` - single-value reactive container.
//!
//! The tracked value is reached through explicit `get`/`with`/`set`
//! methods rather than transparent field access, with one contract:
//! subscribe-on-read, publish-on-write. Writes of an equal value are
//! suppressed so no-op assignments never fan out.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::bus::{self, SourceId};

/// A reactive single-value container.
///
/// Cloning shares the underlying value and subscriber set.
pub struct Ref<T> {
    value: Rc<RefCell<T>>,
    source: SourceId,
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Ref {
            value: self.value.clone(),
            source: self.source,
        }
    }
}

impl<T> Ref<T> {
    pub fn new(initial: T) -> Ref<T> {
        Ref {
            value: Rc::new(RefCell::new(initial)),
            source: bus::next_source_id(),
        }
    }

    /// The subscription key this ref publishes under.
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Tracked read through a borrow, avoiding a clone.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        bus::track_read(self.source);
        f(&self.value.borrow())
    }

    /// Untracked read; never subscribes.
    pub fn peek_with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Mutate in place and publish unconditionally.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.value.borrow_mut());
        bus::notify_write(self.source);
    }
}

impl<T: Clone> Ref<T> {
    /// Tracked read.
    pub fn get(&self) -> T {
        bus::track_read(self.source);
        self.value.borrow().clone()
    }

    /// Untracked read.
    pub fn peek(&self) -> T {
        self.value.borrow().clone()
    }
}

impl<T: PartialEq> Ref<T> {
    /// Write the value, publishing only when it actually changed.
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
            bus::notify_write(self.source);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({:?})", self.value.borrow())
    }
}

// =============================================================================
// Tests
// =============================================================================
