use crossterm::event::{KeyEvent, MouseEvent};
use keysource_types::{Effect, Modal, Msg};
use ratatui::{
    prelude::*,
    style::Style,
    widgets::{Block, Clear, Paragraph},
};

use super::components::{Component, FilePickerModal, FilePickerState, KeySourceComponent};
use super::utils::centered_min_max;
use crate::app::App;

pub struct ModalLayout(Box<dyn Fn(Rect) -> Rect>);

type ModalView = (Box<dyn Component>, ModalLayout);

/// Root view: the form as content plus at most one modal on top.
pub struct MainView {
    pub content_view: Box<dyn Component>,
    pub modal_view: Option<ModalView>,

    /// the widget_id of the focus just before a modal is opened
    transient_focus_id: Option<usize>,
}

impl Default for MainView {
    fn default() -> Self {
        Self::new(Box::new(KeySourceComponent::default()))
    }
}

impl MainView {
    pub fn new(content_view: Box<dyn Component>) -> Self {
        Self {
            content_view,
            modal_view: None,
            transient_focus_id: None,
        }
    }

    /// Update the open modal kind (use None to clear).
    /// Not intended to be called directly; components return `Effect::ShowModal`.
    pub fn set_open_modal_kind(&mut self, app: &mut App, modal: Option<Modal>) {
        if let Some(modal_kind) = modal.as_ref() {
            let modal_view: ModalView = match modal_kind {
                Modal::FilePicker { extensions, start_dir } => {
                    app.file_picker = Some(FilePickerState::new(extensions.clone(), start_dir.clone()));
                    (
                        Box::new(FilePickerModal::default()),
                        ModalLayout(Box::new(|rect| {
                            centered_min_max(75, 95, Rect::new(0, 0, 80, 15), Rect::new(0, 0, 160, 150), rect)
                        })),
                    )
                }
            };
            self.modal_view = Some(modal_view);
            // save the current focus to restore when the modal is closed
            self.transient_focus_id = app.focus.focused().map(|focus| focus.widget_id());
        } else {
            self.modal_view = None;
            app.file_picker = None;
        }
        app.open_modal_kind = modal;
    }

    pub fn restore_focus(&mut self, app: &mut App) {
        if let Some(id) = self.transient_focus_id
            && app.open_modal_kind.is_none()
        {
            app.focus.by_widget_id(id);
            self.transient_focus_id = None;
        } else {
            app.focus.first();
        }
    }
}

impl Component for MainView {
    fn handle_message(&mut self, app: &mut App, msg: Msg) -> Vec<Effect> {
        let mut effects = app.update(&msg);

        // Messages are consumed by the topmost view. Picker results arrive
        // after CloseModal has run, so they reach the form.
        match self.modal_view.as_mut() {
            Some((modal, _)) => effects.extend(modal.handle_message(app, msg)),
            None => effects.extend(self.content_view.handle_message(app, msg)),
        }
        effects
    }

    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        if let Some((modal, _)) = self.modal_view.as_mut() {
            return modal.handle_key_events(app, key);
        }
        self.content_view.handle_key_events(app, key)
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        if let Some((modal, _)) = self.modal_view.as_mut() {
            return modal.handle_mouse_events(app, mouse);
        }
        self.content_view.handle_mouse_events(app, mouse)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, app: &mut App) {
        // Fill the entire background with the theme's background color for consistency
        let bg_fill = Paragraph::new("").style(Style::default().bg(app.ctx.theme.roles().background));
        frame.render_widget(bg_fill, area);

        let layout = self.get_preferred_layout(app, area);
        self.content_view.render(frame, layout[0], app);

        let hints_widget = Paragraph::new(Line::from(self.get_hint_spans(app))).style(app.ctx.theme.text_muted_style());
        frame.render_widget(hints_widget, layout[1]);

        if let Some((modal, position)) = self.modal_view.as_mut() {
            render_overlay(frame, app);
            let modal_area = position.0(area);
            frame.render_widget(Clear, modal_area);

            let modal_hints = modal.get_hint_spans(app);
            if !modal_hints.is_empty() {
                let splits = Layout::vertical([
                    Constraint::Percentage(100), // Modal body
                    Constraint::Length(1),       // Modal hints bar
                ])
                .split(modal_area);
                let hints_widget = Paragraph::new(Line::from(modal_hints))
                    .style(app.ctx.theme.text_muted_style())
                    .bg(app.ctx.theme.roles().background);
                frame.render_widget(hints_widget, splits[1]);
                modal.render(frame, splits[0], app);
            } else {
                modal.render(frame, modal_area, app);
            }
        }
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'static>> {
        let mut hint_spans = vec![Span::styled("Hints: ", app.ctx.theme.text_muted_style())];
        hint_spans.extend(self.content_view.get_hint_spans(app));
        hint_spans
    }

    fn get_preferred_layout(&self, _app: &App, area: Rect) -> Vec<Rect> {
        let areas = Layout::vertical([
            Constraint::Min(1),    // Form
            Constraint::Length(1), // Hints bar
        ])
        .split(area);
        vec![areas[0], areas[1]]
    }
}

/// Dims everything behind an open modal.
fn render_overlay(frame: &mut Frame, app: &mut App) {
    frame.render_widget(Block::default().style(app.ctx.theme.modal_background_style()).dim(), frame.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FormOptions;
    use keysource_types::InputMode;
    use ratatui::{Terminal, backend::TestBackend};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn renders_form_with_both_modes_and_next() {
        let mut app = App::new(FormOptions::default());
        let mut view = MainView::default();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| view.render(frame, frame.area(), &mut app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Select Key"));
        assert!(text.contains(InputMode::FromFile.label()));
        assert!(text.contains(InputMode::Manual.label()));
        assert!(text.contains("Next"));
        assert!(text.contains("Hints:"));
    }

    #[test]
    fn opening_and_closing_the_picker_tracks_app_state() {
        let mut app = App::new(FormOptions::default());
        let mut view = MainView::default();
        let modal = Modal::FilePicker {
            extensions: vec!["pem"],
            start_dir: Some(std::env::temp_dir()),
        };

        view.set_open_modal_kind(&mut app, Some(modal.clone()));
        assert!(view.modal_view.is_some());
        assert_eq!(app.open_modal_kind, Some(modal));
        assert_eq!(app.file_picker.as_ref().and_then(|p| p.cur_dir().cloned()), Some(std::env::temp_dir()));

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| view.render(frame, frame.area(), &mut app)).unwrap();

        view.set_open_modal_kind(&mut app, None);
        assert!(view.modal_view.is_none());
        assert!(app.file_picker.is_none());
        assert!(app.open_modal_kind.is_none());
    }
}
