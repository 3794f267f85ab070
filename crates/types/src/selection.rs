//! The "Select Key" form model.
//!
//! `KeySourceSelection` owns the two mutually exclusive inputs (a file path and
//! manually entered key text) together with the active [`InputMode`]. Front ends
//! never mutate the fields directly; they call the transition methods below and
//! read back the derived flags (`can_proceed`, which input is enabled) to decide
//! what to render.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Which of the two key inputs is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Load the key from a file on disk.
    #[default]
    FromFile,
    /// Type or paste the key text.
    Manual,
}

impl InputMode {
    /// Returns the other mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::FromFile => Self::Manual,
            Self::Manual => Self::FromFile,
        }
    }

    /// Human-friendly label used by radio buttons and summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::FromFile => "Load from file",
            Self::Manual => "Enter manually",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromFile => f.write_str("file"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// Error returned when a string does not name an input mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown input mode '{0}' (expected 'file' or 'manual')")]
pub struct ParseInputModeError(pub String);

impl FromStr for InputMode {
    type Err = ParseInputModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "from_file" | "from-file" => Ok(Self::FromFile),
            "manual" | "text" => Ok(Self::Manual),
            other => Err(ParseInputModeError(other.to_string())),
        }
    }
}

/// The validated value handed to the next stage once the user confirms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum KeySource {
    /// Path to a key file, exactly as selected or typed.
    FromFile(PathBuf),
    /// Key text, exactly as entered.
    Manual(String),
}

impl KeySource {
    pub fn mode(&self) -> InputMode {
        match self {
            Self::FromFile(_) => InputMode::FromFile,
            Self::Manual(_) => InputMode::Manual,
        }
    }
}

/// Failures reported by the selection transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// `handle_next` was called while the active value is empty or implausible.
    #[error("no usable key source for mode '{0}'")]
    NotReady(InputMode),
    /// `browse_file` was called while the manual mode is active.
    #[error("file browsing is only available while loading from a file")]
    BrowseUnavailable,
}

/// External collaborator that lets the user choose a file.
///
/// Returns `None` when the user cancels.
pub trait FilePicker {
    fn pick_file(&mut self, start_dir: Option<&Path>) -> Option<PathBuf>;
}

/// State of the key-source form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySourceSelection {
    mode: InputMode,
    file_path: Option<PathBuf>,
    manual_text: Option<String>,
    can_proceed: bool,
}

impl KeySourceSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a selection that starts in the given mode with both values empty.
    pub fn with_mode(mode: InputMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn manual_text(&self) -> Option<&str> {
        self.manual_text.as_deref()
    }

    /// Whether the proceed action is currently allowed.
    pub fn can_proceed(&self) -> bool {
        self.can_proceed
    }

    /// The path input is enabled iff the file mode is active.
    pub fn is_file_input_enabled(&self) -> bool {
        self.mode == InputMode::FromFile
    }

    /// The manual text area is enabled iff the manual mode is active.
    pub fn is_manual_input_enabled(&self) -> bool {
        self.mode == InputMode::Manual
    }

    /// Switches to `mode`, enabling its input and disabling the other one.
    ///
    /// The value of the deactivated input is kept so switching back restores it.
    pub fn toggle_input_mode(&mut self, mode: InputMode) {
        if self.mode != mode {
            debug!(from = %self.mode, to = %mode, "key input mode changed");
        }
        self.mode = mode;
        self.recompute();
    }

    /// Records a path typed into the path input. Ignored unless the file mode is active.
    pub fn set_file_path(&mut self, path: impl Into<PathBuf>) -> bool {
        if !self.is_file_input_enabled() {
            return false;
        }
        self.file_path = Some(path.into());
        self.recompute();
        true
    }

    /// Records the manual key text. Ignored unless the manual mode is active.
    pub fn set_manual_text(&mut self, text: impl Into<String>) -> bool {
        if !self.is_manual_input_enabled() {
            return false;
        }
        self.manual_text = Some(text.into());
        self.recompute();
        true
    }

    /// Directory the file picker should open in: the parent of the current path, if any.
    pub fn browse_start_dir(&self) -> Option<PathBuf> {
        let current = self.file_path.as_deref()?;
        let path = current.to_str().map_or(current, |text| Path::new(text.trim()));
        if path.as_os_str().is_empty() {
            return None;
        }
        if path.is_dir() {
            return Some(path.to_path_buf());
        }
        path.parent().filter(|p| !p.as_os_str().is_empty()).map(Path::to_path_buf)
    }

    /// Fails unless a file can be browsed for right now.
    pub fn ensure_browsable(&self) -> Result<(), SelectionError> {
        if self.is_file_input_enabled() {
            Ok(())
        } else {
            Err(SelectionError::BrowseUnavailable)
        }
    }

    /// Asks `picker` for a file and stores the choice.
    ///
    /// Returns `Ok(true)` when a file was chosen, `Ok(false)` on cancellation
    /// (state untouched).
    pub fn browse_file(&mut self, picker: &mut dyn FilePicker) -> Result<bool, SelectionError> {
        self.ensure_browsable()?;
        let start_dir = self.browse_start_dir();
        let picked = picker.pick_file(start_dir.as_deref());
        self.apply_picked_file(picked)
    }

    /// Applies the outcome of an asynchronous file dialog.
    ///
    /// The picked path is stored as is, including names that are not UTF-8.
    pub fn apply_picked_file(&mut self, picked: Option<PathBuf>) -> Result<bool, SelectionError> {
        self.ensure_browsable()?;
        let Some(path) = picked else {
            debug!("file picker cancelled");
            return Ok(false);
        };
        debug!(path = %path.display(), "file picked");
        self.file_path = Some(path);
        self.recompute();
        Ok(true)
    }

    /// Produces the key source for the active mode.
    ///
    /// The value is returned exactly as entered; no trimming is applied.
    pub fn handle_next(&self) -> Result<KeySource, SelectionError> {
        if !self.can_proceed {
            return Err(SelectionError::NotReady(self.mode));
        }
        Ok(match self.mode {
            InputMode::FromFile => KeySource::FromFile(self.file_path.clone().unwrap_or_default()),
            InputMode::Manual => KeySource::Manual(self.manual_text.clone().unwrap_or_default()),
        })
    }

    fn recompute(&mut self) {
        self.can_proceed = match self.mode {
            InputMode::FromFile => self
                .file_path
                .as_deref()
                .is_some_and(|path| is_plausible_path(&path.to_string_lossy())),
            InputMode::Manual => self.manual_text.as_deref().is_some_and(|text| !text.trim().is_empty()),
        };
    }
}

/// Cheap syntactic check for something that could name a file.
pub fn is_plausible_path(candidate: &str) -> bool {
    let trimmed = candidate.trim();
    !trimmed.is_empty() && !trimmed.contains('\0') && !trimmed.trim_matches(['/', '\\']).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedPicker {
        answer: Option<PathBuf>,
        seen_start_dir: Option<PathBuf>,
        calls: usize,
    }

    impl ScriptedPicker {
        fn answering(answer: Option<&str>) -> Self {
            Self {
                answer: answer.map(PathBuf::from),
                seen_start_dir: None,
                calls: 0,
            }
        }
    }

    impl FilePicker for ScriptedPicker {
        fn pick_file(&mut self, start_dir: Option<&Path>) -> Option<PathBuf> {
            self.calls += 1;
            self.seen_start_dir = start_dir.map(Path::to_path_buf);
            self.answer.clone()
        }
    }

    #[test]
    fn starts_in_file_mode_with_nothing_to_proceed() {
        let selection = KeySourceSelection::new();
        assert_eq!(selection.mode(), InputMode::FromFile);
        assert!(selection.is_file_input_enabled());
        assert!(!selection.is_manual_input_enabled());
        assert!(!selection.can_proceed());
        assert_eq!(selection.file_path(), None);
        assert_eq!(selection.manual_text(), None);
    }

    #[test]
    fn toggling_swaps_enabled_inputs() {
        let mut selection = KeySourceSelection::new();
        selection.toggle_input_mode(InputMode::Manual);
        assert!(selection.is_manual_input_enabled());
        assert!(!selection.is_file_input_enabled());

        selection.toggle_input_mode(InputMode::FromFile);
        assert!(selection.is_file_input_enabled());
        assert!(!selection.is_manual_input_enabled());
    }

    #[test]
    fn can_proceed_tracks_the_active_value() {
        let mut selection = KeySourceSelection::new();
        selection.set_file_path("");
        assert!(!selection.can_proceed());
        selection.set_file_path("/keys/id.pem");
        assert!(selection.can_proceed());

        selection.toggle_input_mode(InputMode::Manual);
        assert!(!selection.can_proceed(), "manual text is still empty");
        selection.set_manual_text("");
        assert!(!selection.can_proceed());
        selection.set_manual_text("ssh-ed25519 AAAA...");
        assert!(selection.can_proceed());

        selection.toggle_input_mode(InputMode::FromFile);
        assert!(selection.can_proceed(), "file path survives the round trip");
        assert_eq!(selection.file_path(), Some(Path::new("/keys/id.pem")));
    }

    #[test]
    fn whitespace_and_separators_are_not_values() {
        let mut selection = KeySourceSelection::new();
        selection.set_file_path("   ");
        assert!(!selection.can_proceed());
        selection.set_file_path("/");
        assert!(!selection.can_proceed());
        selection.set_file_path("bad\0path");
        assert!(!selection.can_proceed());

        selection.toggle_input_mode(InputMode::Manual);
        selection.set_manual_text("\n\t ");
        assert!(!selection.can_proceed());
    }

    #[test]
    fn edits_to_the_disabled_input_are_ignored() {
        let mut selection = KeySourceSelection::new();
        assert!(!selection.set_manual_text("typed while disabled"));
        assert_eq!(selection.manual_text(), None);

        selection.toggle_input_mode(InputMode::Manual);
        assert!(!selection.set_file_path("/keys/id.pem"));
        assert_eq!(selection.file_path(), None);
    }

    #[test]
    fn browse_sets_path_on_confirm() {
        let mut selection = KeySourceSelection::new();
        let mut picker = ScriptedPicker::answering(Some("/keys/id.pem"));
        assert_eq!(selection.browse_file(&mut picker), Ok(true));
        assert_eq!(selection.file_path(), Some(Path::new("/keys/id.pem")));
        assert!(selection.can_proceed());
        assert_eq!(selection.manual_text(), None);
    }

    #[test]
    fn browse_cancel_leaves_state_unchanged() {
        let mut selection = KeySourceSelection::new();
        selection.set_file_path("/keys/old.pem");
        let before = selection.clone();

        let mut picker = ScriptedPicker::answering(None);
        assert_eq!(selection.browse_file(&mut picker), Ok(false));
        assert_eq!(selection, before);
        assert_eq!(picker.seen_start_dir.as_deref(), Some(Path::new("/keys")));
    }

    #[test]
    fn browse_is_rejected_in_manual_mode() {
        let mut selection = KeySourceSelection::with_mode(InputMode::Manual);
        let mut picker = ScriptedPicker::answering(Some("/keys/id.pem"));
        assert_eq!(selection.browse_file(&mut picker), Err(SelectionError::BrowseUnavailable));
        assert_eq!(picker.calls, 0);
        assert_eq!(selection.file_path(), None);
    }

    #[test]
    fn next_returns_active_value_unmodified() {
        let mut selection = KeySourceSelection::with_mode(InputMode::Manual);
        selection.set_manual_text("  ssh-ed25519 AAAAC3 me@host\n");
        assert_eq!(
            selection.handle_next(),
            Ok(KeySource::Manual("  ssh-ed25519 AAAAC3 me@host\n".to_string()))
        );

        selection.toggle_input_mode(InputMode::FromFile);
        selection.set_file_path("/keys/id.pem");
        assert_eq!(selection.handle_next(), Ok(KeySource::FromFile(PathBuf::from("/keys/id.pem"))));
    }

    #[cfg(unix)]
    #[test]
    fn picked_non_utf8_path_reaches_next_unchanged() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let picked = PathBuf::from(OsStr::from_bytes(b"/keys/id_\xff.pem"));
        let mut selection = KeySourceSelection::new();
        assert_eq!(selection.apply_picked_file(Some(picked.clone())), Ok(true));
        assert!(selection.can_proceed());
        assert_eq!(selection.file_path(), Some(picked.as_path()));
        assert_eq!(selection.handle_next(), Ok(KeySource::FromFile(picked)));
        assert_eq!(selection.browse_start_dir(), Some(PathBuf::from("/keys")));
    }

    #[test]
    fn next_is_guarded_when_not_ready() {
        let selection = KeySourceSelection::new();
        assert_eq!(selection.handle_next(), Err(SelectionError::NotReady(InputMode::FromFile)));
    }

    #[test]
    fn input_mode_parses_cli_spellings() {
        assert_eq!("file".parse::<InputMode>(), Ok(InputMode::FromFile));
        assert_eq!("Manual".parse::<InputMode>(), Ok(InputMode::Manual));
        assert!("clipboard".parse::<InputMode>().is_err());
    }

    #[test]
    fn key_source_serializes_with_mode_tag() {
        let json = serde_json::to_value(KeySource::FromFile(PathBuf::from("/keys/id.pem"))).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "from_file", "value": "/keys/id.pem"}));
    }
}
