//! User preference persistence for keysource.
//!
//! A small JSON-backed store that remembers the preferred theme, the last input
//! mode the user confirmed, and the directory the last key file was picked from.
//! The file lives in the standard configuration directory
//! (`~/.config/keysource/preferences.json` on most platforms) unless
//! `KEYSOURCE_PREFERENCES_PATH` points elsewhere.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use dirs_next::config_dir;
use keysource_types::{InputMode, KeySource};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::expand_tilde;

/// Environment variable allowing callers to override the preferences file path.
pub const PREFERENCES_PATH_ENV: &str = "KEYSOURCE_PREFERENCES_PATH";

/// Default filename for the JSON payload.
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Error surfaced when reading or writing preferences fails.
#[derive(Debug, Error)]
pub enum PreferencesError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("preferences I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("preferences serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted preference values.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesPayload {
    /// Canonical identifier of the theme to use in the TUI.
    pub preferred_theme: Option<String>,
    /// Mode of the last confirmed key source.
    #[serde(default)]
    pub last_mode: Option<InputMode>,
    /// Directory containing the last confirmed key file.
    #[serde(default)]
    pub last_directory: Option<PathBuf>,
}

/// Thread-safe preferences store backed by a JSON file.
#[derive(Debug, Default)]
pub struct UserPreferences {
    path: PathBuf,
    payload: Mutex<PreferencesPayload>,
    persist_to_disk: bool,
}

impl UserPreferences {
    /// Create a store rooted at the provided path. When `path` is `None`, the
    /// default config directory path is used.
    pub fn new(path: Option<PathBuf>) -> Result<Self, PreferencesError> {
        let resolved_path = path.unwrap_or_else(default_preferences_path);
        let payload = load_payload(&resolved_path)?;
        Ok(Self {
            path: resolved_path,
            payload: Mutex::new(payload),
            persist_to_disk: true,
        })
    }

    /// Build an in-memory store used as a fallback when the config directory cannot be accessed.
    pub fn ephemeral() -> Self {
        Self {
            path: PathBuf::new(),
            payload: Mutex::new(PreferencesPayload::default()),
            persist_to_disk: false,
        }
    }

    /// Opens the default store, falling back to [`UserPreferences::ephemeral`] on error.
    pub fn load_or_ephemeral() -> Self {
        match Self::new(None) {
            Ok(preferences) => preferences,
            Err(error) => {
                warn!(error = %error, "Failed to load preferences; using in-memory defaults");
                Self::ephemeral()
            }
        }
    }

    /// Path to the underlying JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the canonical identifier of the preferred theme, if one was saved.
    pub fn preferred_theme(&self) -> Option<String> {
        self.lock().preferred_theme.clone()
    }

    /// Mode of the last confirmed key source.
    pub fn last_mode(&self) -> Option<InputMode> {
        self.lock().last_mode
    }

    /// Directory of the last confirmed key file, if it still exists.
    pub fn last_directory(&self) -> Option<PathBuf> {
        self.lock().last_directory.clone().filter(|dir| dir.is_dir())
    }

    /// Remember the mode (and for files, the directory) of a confirmed key source.
    ///
    /// The key value itself is never persisted.
    pub fn record_selection(&self, source: &KeySource) -> Result<(), PreferencesError> {
        let mut payload = self.lock();
        payload.last_mode = Some(source.mode());
        if let KeySource::FromFile(path) = source
            && let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        {
            payload.last_directory = Some(parent.to_path_buf());
        }
        if self.persist_to_disk {
            self.save_locked(&payload)?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, PreferencesPayload> {
        self.payload.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save_locked(&self, payload: &PreferencesPayload) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(payload)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Location of the preferences file, honoring [`PREFERENCES_PATH_ENV`].
pub fn default_preferences_path() -> PathBuf {
    if let Ok(path) = env::var(PREFERENCES_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keysource")
        .join(PREFERENCES_FILE_NAME)
}

fn load_payload(path: &Path) -> Result<PreferencesPayload, PreferencesError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(payload) => Ok(payload),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse preferences file; using defaults"
                );
                Ok(PreferencesPayload::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(PreferencesPayload::default()),
        Err(error) => Err(PreferencesError::Io(error)),
    }
}
