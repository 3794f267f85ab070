//! The "Select Key" form.

mod key_source_component;
mod state;

pub use key_source_component::KeySourceComponent;
pub use state::{KEY_FILE_EXTENSIONS, KeySourceState, StatusLine};
