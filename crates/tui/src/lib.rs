//! # keysource TUI
//!
//! Terminal front end for the "Select Key" form. The form offers two mutually
//! exclusive ways to supply a key (a file on disk or pasted text), lets the user
//! browse for a file in a modal picker, and hands the chosen [`KeySource`] back
//! to the caller once Next is confirmed.
//!
//! The crate follows a component architecture: [`app::App`] holds state,
//! components under `ui::components` render and react to input, and side
//! effects are returned as [`keysource_types::Effect`]s that the runtime
//! executes.

mod app;
mod cmd;
mod ui;

use anyhow::Result;
use keysource_types::KeySource;

pub use app::FormOptions;

/// Runs the form in the alternate screen.
///
/// Returns `Ok(Some(source))` when the user confirms a key source and
/// `Ok(None)` when the form is closed without one.
pub async fn run(options: FormOptions) -> Result<Option<KeySource>> {
    ui::runtime::run_app(options).await
}
