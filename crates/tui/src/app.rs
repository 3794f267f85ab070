//! Application state shared by every component.

use std::path::PathBuf;

use keysource_types::{Effect, InputMode, KeySource, Modal, Msg};
use rat_focus::{Focus, FocusBuilder, FocusFlag, HasFocus};
use ratatui::layout::Rect;
use tracing::{debug, info};

use crate::ui::{
    components::{FilePickerState, KeySourceState},
    theme::{self, Theme},
};

/// Options the caller supplies when opening the form.
#[derive(Debug, Clone, Default)]
pub struct FormOptions {
    /// Mode the form opens in.
    pub initial_mode: InputMode,
    /// Directory the file picker opens in when the path field is empty.
    pub browse_dir: Option<PathBuf>,
    /// Persisted theme id, if any.
    pub preferred_theme: Option<String>,
}

/// Runtime-wide objects that components read but rarely change.
#[derive(Debug)]
pub struct SharedCtx {
    pub theme: Box<dyn Theme>,
}

impl SharedCtx {
    pub fn new(preferred_theme: Option<&str>) -> Self {
        let loaded = theme::load(preferred_theme);
        debug!(theme = loaded.definition.id, "theme selected");
        Self { theme: loaded.theme }
    }
}

#[derive(Debug)]
pub struct App {
    pub ctx: SharedCtx,
    /// The "Select Key" form.
    pub key_source: KeySourceState,
    /// Present while the file picker modal is open.
    pub file_picker: Option<FilePickerState>,
    pub open_modal_kind: Option<Modal>,
    pub focus: Focus,
    /// Key source produced by the form; set once and then the loop exits.
    pub outcome: Option<KeySource>,
    pub should_quit: bool,
    root_focus: FocusFlag,
}

impl App {
    pub fn new(options: FormOptions) -> Self {
        let mut app = Self {
            ctx: SharedCtx::new(options.preferred_theme.as_deref()),
            key_source: KeySourceState::new(options.initial_mode, options.browse_dir),
            file_picker: None,
            open_modal_kind: None,
            focus: Focus::default(),
            outcome: None,
            should_quit: false,
            root_focus: FocusFlag::new().with_name("app.root"),
        };
        app.focus = FocusBuilder::build_for(&app);
        app.focus.first();
        app
    }

    /// Applies application-level messages before components see them.
    pub fn update(&mut self, msg: &Msg) -> Vec<Effect> {
        if let Msg::Resize(width, height) = msg {
            debug!(width, height, "terminal resized");
        }
        Vec::new()
    }

    /// Records the hand-off and stops the event loop.
    pub fn finish(&mut self, source: KeySource) {
        info!(mode = %source.mode(), "key source confirmed");
        self.outcome = Some(source);
        self.should_quit = true;
    }
}

impl HasFocus for App {
    /// While a modal is open it owns the whole focus graph.
    fn build(&self, builder: &mut FocusBuilder) {
        match self.file_picker.as_ref() {
            Some(picker) if self.open_modal_kind.is_some() => builder.widget(picker),
            _ => builder.widget(&self.key_source),
        };
    }

    fn focus(&self) -> FocusFlag {
        self.root_focus.clone()
    }

    fn area(&self) -> Rect {
        Rect::default()
    }
}
