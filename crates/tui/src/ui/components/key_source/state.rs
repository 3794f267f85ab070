//! State for the "Select Key" form.
//!
//! Wraps the [`KeySourceSelection`] model with the editable text buffers and
//! the focus flags of every control. Text buffers are the source of truth for
//! what is displayed; every edit is pushed into the selection so `can_proceed`
//! is always current.

use std::path::{Path, PathBuf};

use keysource_types::{Effect, InputMode, KeySource, KeySourceSelection, Modal, SelectionError, is_plausible_path};
use keysource_util::{expand_tilde, key_material};
use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::layout::Rect;
use tracing::debug;

use crate::ui::components::common::TextInputState;

/// Extensions highlighted by the file picker.
pub const KEY_FILE_EXTENSIONS: &[&str] = &["pem", "key", "pub", "crt", "der", "txt"];

/// Advisory line rendered beneath the inputs. It never blocks the Next action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Info(String),
    Warning(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct KeySourceState {
    selection: KeySourceSelection,
    path_input: TextInputState,
    manual_input: TextInputState,
    status: Option<StatusLine>,
    // Directory to open the picker in when the path field gives no hint
    fallback_browse_dir: Option<PathBuf>,

    container_focus: FocusFlag,
    pub f_mode: FocusFlag,
    pub f_path_input: FocusFlag,
    pub f_browse: FocusFlag,
    pub f_manual_input: FocusFlag,
    pub f_cancel: FocusFlag,
    pub f_next: FocusFlag,
}

impl Default for KeySourceState {
    fn default() -> Self {
        Self::new(InputMode::default(), None)
    }
}

impl KeySourceState {
    pub fn new(mode: InputMode, fallback_browse_dir: Option<PathBuf>) -> Self {
        Self {
            selection: KeySourceSelection::with_mode(mode),
            path_input: TextInputState::new(),
            manual_input: TextInputState::new(),
            status: None,
            fallback_browse_dir,
            container_focus: FocusFlag::new().with_name("key_source.container"),
            f_mode: FocusFlag::new().with_name("key_source.mode"),
            f_path_input: FocusFlag::new().with_name("key_source.path_input"),
            f_browse: FocusFlag::new().with_name("key_source.browse"),
            f_manual_input: FocusFlag::new().with_name("key_source.manual_input"),
            f_cancel: FocusFlag::new().with_name("key_source.cancel"),
            f_next: FocusFlag::new().with_name("key_source.next"),
        }
    }

    pub fn selection(&self) -> &KeySourceSelection {
        &self.selection
    }

    pub fn mode(&self) -> InputMode {
        self.selection.mode()
    }

    pub fn can_proceed(&self) -> bool {
        self.selection.can_proceed()
    }

    pub fn path_input(&self) -> &TextInputState {
        &self.path_input
    }

    pub fn manual_input(&self) -> &TextInputState {
        &self.manual_input
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn set_status(&mut self, status: Option<StatusLine>) {
        self.status = status;
    }

    /// Switches modes and refreshes the advisory status for the newly active input.
    pub fn toggle_input_mode(&mut self, mode: InputMode) {
        self.selection.toggle_input_mode(mode);
        self.refresh_status();
    }

    /// Runs `edit` against the enabled input and pushes the result into the selection.
    ///
    /// Returns `false` without touching anything when `field` is disabled.
    pub fn edit_input(&mut self, field: InputMode, edit: impl FnOnce(&mut TextInputState)) -> bool {
        if field != self.selection.mode() {
            return false;
        }
        match field {
            InputMode::FromFile => {
                edit(&mut self.path_input);
                self.selection.set_file_path(self.path_input.input());
            }
            InputMode::Manual => {
                edit(&mut self.manual_input);
                self.selection.set_manual_text(self.manual_input.input());
            }
        }
        self.refresh_status();
        true
    }

    /// Inserts pasted text into the active input. Line breaks are dropped for paths.
    pub fn paste(&mut self, text: &str) -> bool {
        let mode = self.selection.mode();
        match mode {
            InputMode::FromFile => {
                let single_line: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
                self.edit_input(mode, |input| input.insert_str(&single_line))
            }
            InputMode::Manual => {
                let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
                self.edit_input(mode, |input| input.insert_str(&normalized))
            }
        }
    }

    /// The effect that opens the file picker, or why it cannot be opened.
    pub fn browse_effect(&self) -> Result<Effect, SelectionError> {
        self.selection.ensure_browsable()?;
        let start_dir = self
            .selection
            .browse_start_dir()
            .map(|dir| expand_path(&dir))
            .filter(|dir| dir.is_dir())
            .or_else(|| self.fallback_browse_dir.clone());
        Ok(Effect::ShowModal(Modal::FilePicker {
            extensions: KEY_FILE_EXTENSIONS.to_vec(),
            start_dir,
        }))
    }

    /// Applies the file picker outcome; `None` means the picker was cancelled.
    pub fn apply_picked_file(&mut self, picked: Option<PathBuf>) -> Result<bool, SelectionError> {
        let changed = self.selection.apply_picked_file(picked)?;
        if changed && let Some(path) = self.selection.file_path() {
            self.path_input.set_input(path.to_string_lossy());
            self.refresh_status();
        }
        Ok(changed)
    }

    /// Produces the key source when the active input is valid.
    pub fn next(&self) -> Result<KeySource, SelectionError> {
        self.selection.handle_next()
    }

    fn refresh_status(&mut self) {
        self.status = match self.selection.mode() {
            InputMode::FromFile => self.selection.file_path().and_then(file_status),
            InputMode::Manual => manual_status(self.manual_input.input()),
        };
    }
}

/// Expands `~` in UTF-8 paths; other paths are used as is.
fn expand_path(path: &Path) -> PathBuf {
    path.to_str().map_or_else(|| path.to_path_buf(), expand_tilde)
}

fn file_status(raw: &Path) -> Option<StatusLine> {
    if !is_plausible_path(&raw.to_string_lossy()) {
        return None;
    }
    let path = expand_path(raw);
    if path.is_file() {
        None
    } else if path.is_dir() {
        Some(StatusLine::Warning("That path is a directory; choose a key file".into()))
    } else {
        Some(StatusLine::Warning("No file exists at this path yet".into()))
    }
}

fn manual_status(text: &str) -> Option<StatusLine> {
    if text.trim().is_empty() {
        return None;
    }
    match key_material::inspect(text) {
        Ok(material) => Some(StatusLine::Info(format!(
            "Looks like {} {} key ({})",
            article(material.kind.to_string().as_str()),
            material.kind,
            material.label
        ))),
        Err(error) => {
            debug!(error = %error, "manual key text not recognised yet");
            Some(StatusLine::Warning("Key format not recognised yet".into()))
        }
    }
}

fn article(word: &str) -> &'static str {
    if word.starts_with(['a', 'e', 'i', 'o', 'u']) { "an" } else { "a" }
}

impl HasFocus for KeySourceState {
    /// Only enabled controls take part in the focus cycle.
    fn build(&self, builder: &mut FocusBuilder) {
        let tag = builder.start(self);
        builder.leaf_widget(&self.f_mode);
        match self.selection.mode() {
            InputMode::FromFile => {
                builder.leaf_widget(&self.f_path_input);
                builder.leaf_widget(&self.f_browse);
            }
            InputMode::Manual => {
                builder.leaf_widget(&self.f_manual_input);
            }
        }
        builder.leaf_widget(&self.f_cancel);
        if self.selection.can_proceed() {
            builder.leaf_widget(&self.f_next);
        }
        builder.end(tag);
    }

    fn focus(&self) -> FocusFlag {
        self.container_focus.clone()
    }

    fn area(&self) -> Rect {
        Rect::default()
    }
}
