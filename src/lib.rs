//! # glint
//!
//! Fine-grained reactive DOM binding and diffing engine.
//!
//! ## Architecture
//!
//! glint binds reactive state to a retained DOM tree through declarative
//! binding descriptors. State lives in [`Ref`](reactivity::Ref) and
//! [`Reactive`](reactivity::Reactive) containers whose reads are tracked
//! against a per-thread current-subscriber slot; writes publish through an
//! event bus that replays every subscribed update callback.
//!
//! The update pipeline is purely push-based:
//! ```text
//! Ref / Reactive write → event bus → update callback → diff → DOM patch
//! ```
//!
//! Compilation wires it together: each [`Binding`](runtime::Binding) is
//! matched against the document by selector, producing one update callback
//! per element that runs once under tracking and thereafter replays on
//! every write to the state it read.
//!
//! ## Modules
//!
//! - [`reactivity`] - Refs, reactive objects, computed values, watchers
//! - [`dom`] - Retained node tree, selectors, events
//! - [`runtime`] - Binding compiler, diff engine, components, app singleton

pub mod dom;
pub mod error;
pub mod reactivity;
pub mod runtime;

pub use error::Error;

pub use dom::{Document, Event, Node};

pub use reactivity::{
    computed, watch, watch_effect, watch_reactive, Reactive, Ref, WatchSource,
};

pub use runtime::{
    compile, mount_component, register_component, use_app, App, Binding, BindingValue,
    ComponentResult, Props, Rendered,
};
