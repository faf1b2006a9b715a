//! Client layer - views, commands and the shared application context.
//!
//! This module plays the role of the user interface: it owns the session state,
//! guards fetches against late results and talks to the user through a
//! [`prompt::Prompt`]. All business rules live in [`crate::core`].

/// User commands (deletes, launches, form saves)
pub mod commands;
/// Shared application context
pub mod context;
/// Stale-fetch protection and loadable data
pub mod guard;
/// Confirmation and alert adapter
pub mod prompt;
/// Page models
pub mod views;

pub use context::AppContext;
pub use prompt::{ConsolePrompt, Prompt};
