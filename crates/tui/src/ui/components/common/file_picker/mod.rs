//! Key file picker modal: state and component.

mod file_picker_component;
mod state;

pub use file_picker_component::FilePickerModal;
pub use state::FilePickerState;
