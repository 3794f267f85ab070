//! Helpers shared by the keysource front ends: path handling, preferences,
//! log redaction and the key loader that runs after the form hands off.

use once_cell::sync::Lazy;
use regex::Regex;

pub mod key_material;
pub mod path_processing;
pub mod preferences;

pub use key_material::{KeyFormat, KeyKind, KeyLoadError, KeyMaterial};
pub use path_processing::expand_tilde;
pub use preferences::{PreferencesError, UserPreferences};

static KEY_BODY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9+/]{16,}={0,2}").expect("key body pattern is valid"));

/// Masks anything that looks like encoded key material so key text can be logged.
///
/// PEM armor lines, algorithm names and comments survive; base64 runs of 16 or
/// more characters are replaced with `<redacted>`.
pub fn redact_key_text(input: &str) -> String {
    KEY_BODY_PATTERN.replace_all(input, "<redacted>").into_owned()
}
