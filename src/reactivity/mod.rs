//! Fine-grained reactivity core.
//!
//! Dependency tracking is implicit: while an update callback executes with
//! itself installed as the current subscriber ([`tracking`]), every read of
//! a reactive source subscribes it through the event bus ([`bus`]); a later
//! write to that source replays the callback synchronously. There is no
//! batching - propagation runs to completion inside the mutating call.
//!
//! - [`tracking`] - current-subscriber slot, `UpdateFn`
//! - [`bus`] - source ids, subscribe/publish, compile-phase clearing
//! - [`reference`] - `Ref<T>` single-value containers
//! - [`reactive`] - `Reactive<T>` object graphs and reactive vectors
//! - [`computed`] - derived refs
//! - [`watch`] - `watch`, `watch_reactive`, `watch_effect`

pub mod bus;
pub mod computed;
pub mod reactive;
pub mod reference;
pub mod tracking;
pub mod watch;

pub use bus::{clear_compile_subscribers, notify_write, subscribe, track_read, SourceId};
pub use computed::computed;
pub use reactive::Reactive;
pub use reference::Ref;
pub use tracking::{current_update_fn, set_current_update_fn, with_subscriber, UpdateFn};
pub use watch::{watch, watch_effect, watch_reactive, WatchSource};
