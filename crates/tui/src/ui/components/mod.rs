//! UI components: the key source form, the file picker modal and shared widgets.

pub mod common;
pub mod component;
pub mod key_source;

pub use common::{FilePickerModal, FilePickerState};
pub use component::*;
pub use key_source::{KeySourceComponent, KeySourceState};
