//! Shared types for the keysource workspace.
//!
//! The form model lives in [`selection`]; the remaining types form the message
//! vocabulary exchanged between the terminal runtime, its components and the
//! background command runner.

use std::path::PathBuf;

pub mod selection;

pub use selection::{FilePicker, InputMode, KeySource, KeySourceSelection, ParseInputModeError, SelectionError, is_plausible_path};

/// A single row of a directory listing shown by the file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub path: PathBuf,
    pub is_directory: bool,
}

/// Modal overlays the runtime knows how to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    /// File picker restricted to the given extensions, opened in `start_dir` when present.
    FilePicker {
        extensions: Vec<&'static str>,
        start_dir: Option<PathBuf>,
    },
}

/// Messages delivered to components.
#[derive(Debug, Clone)]
pub enum Msg {
    /// Periodic UI tick.
    Tick,
    /// Terminal resized.
    Resize(u16, u16),
    /// Text pasted into the terminal (bracketed paste).
    Paste(String),
    /// The file picker committed a file.
    FilePicked(PathBuf),
    /// The file picker was dismissed without a choice.
    FilePickerCancelled,
    /// Background execution completed with outcome.
    ExecCompleted(Box<ExecOutcome>),
}

/// Side effects requested by components and executed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowModal(Modal),
    CloseModal,
    /// List the contents of a directory for the file picker.
    ListDirectoryContents(PathBuf),
    /// Read a file for the picker preview pane.
    ReadFileContents(PathBuf),
    /// Hand the chosen file back to the form.
    FilePicked(PathBuf),
    /// Tell the form the picker was dismissed.
    FilePickerCancelled,
    /// The form produced a key source; advance to the next stage.
    Proceed(KeySource),
    /// Close the form without producing a key source.
    Quit,
}

/// Result of executing an effect.
#[derive(Debug, Clone)]
pub enum ExecOutcome {
    DirectoryContents {
        entries: Vec<DirectoryEntry>,
        root_path: PathBuf,
    },
    FileContents(String, PathBuf),
    /// A message to route straight back into the component tree.
    Message(Msg),
    /// Free-form status line, usually an error description.
    Log(String),
}
