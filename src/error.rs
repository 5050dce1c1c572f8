//! Crate error type.
//!
//! Usage errors are the only hard failures in the engine: everything else
//! (missing selector matches, unregistered tags) degrades gracefully and is
//! reported through `tracing` instead.

use thiserror::Error;

/// Errors surfaced to callers of the binding compiler and app singleton.
#[derive(Debug, Error)]
pub enum Error {
    /// `use_app()` was called before `App::new` installed the singleton.
    #[error("app instance not created yet; call App::new first")]
    AppNotCreated,

    /// A selector used syntax the engine does not support.
    ///
    /// Supported: `tag`, `#id`, `.class`, compounds of those, and
    /// comma-separated groups.
    #[error("unsupported selector: {0}")]
    Selector(String),
}
