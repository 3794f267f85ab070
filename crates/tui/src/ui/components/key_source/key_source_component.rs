//! Renders the "Select Key" form and routes input into [`KeySourceState`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use keysource_types::{Effect, ExecOutcome, InputMode, Msg};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::Modifier,
    text::{Line, Span, Text},
    widgets::{Borders, Paragraph},
};
use tracing::debug;

use super::state::{KeySourceState, StatusLine};
use crate::{
    app::App,
    ui::{
        components::Component,
        theme::{
            Theme,
            theme_helpers::{ButtonRenderOptions, block, build_hint_spans, create_radio_button, disabled_block, render_button},
        },
        utils::centered_min_max,
    },
};

const MANUAL_PLACEHOLDER: &str = "Paste a PEM block or an OpenSSH public key";
const PATH_PLACEHOLDER: &str = "Path to a key file, or press Ctrl+O to browse";

#[derive(Debug, Clone, Default)]
struct KeySourceLayout {
    file_radio_area: Rect,
    manual_radio_area: Rect,
    path_input_area: Rect,
    browse_button_area: Rect,
    manual_input_area: Rect,
    status_area: Rect,
    cancel_button_area: Rect,
    next_button_area: Rect,
}

impl From<&[Rect]> for KeySourceLayout {
    fn from(areas: &[Rect]) -> Self {
        Self {
            file_radio_area: areas[0],
            manual_radio_area: areas[1],
            path_input_area: areas[2],
            browse_button_area: areas[3],
            manual_input_area: areas[4],
            status_area: areas[5],
            cancel_button_area: areas[6],
            next_button_area: areas[7],
        }
    }
}

/// Form component: mode radios, path input with Browse, manual text area, Next.
#[derive(Debug, Default)]
pub struct KeySourceComponent {
    layout: KeySourceLayout,
    intro_area: Rect,
}

impl KeySourceComponent {
    fn proceed(&self, app: &mut App) -> Vec<Effect> {
        match app.key_source.next() {
            Ok(source) => vec![Effect::Proceed(source)],
            Err(error) => {
                debug!(error = %error, "next rejected");
                app.key_source.set_status(Some(StatusLine::Error(error.to_string())));
                Vec::new()
            }
        }
    }

    fn browse(&self, app: &mut App) -> Vec<Effect> {
        match app.key_source.browse_effect() {
            Ok(effect) => vec![effect],
            Err(error) => {
                app.key_source.set_status(Some(StatusLine::Error(error.to_string())));
                Vec::new()
            }
        }
    }

    fn select_mode(&self, app: &mut App, mode: InputMode) {
        app.key_source.toggle_input_mode(mode);
    }

    fn handle_text_key(app: &mut App, field: InputMode, key: KeyEvent) -> bool {
        let multiline = field == InputMode::Manual;
        let plain = key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT;
        match key.code {
            KeyCode::Char(c) if plain && !c.is_control() => app.key_source.edit_input(field, |input| input.insert_char(c)),
            KeyCode::Enter if multiline => app.key_source.edit_input(field, |input| input.insert_char('\n')),
            KeyCode::Backspace => app.key_source.edit_input(field, |input| input.backspace()),
            KeyCode::Delete => app.key_source.edit_input(field, |input| input.delete()),
            KeyCode::Left => app.key_source.edit_input(field, |input| input.move_left()),
            KeyCode::Right => app.key_source.edit_input(field, |input| input.move_right()),
            KeyCode::Home => app.key_source.edit_input(field, |input| input.move_home()),
            KeyCode::End => app.key_source.edit_input(field, |input| input.move_end()),
            KeyCode::Up if multiline => app.key_source.edit_input(field, |input| input.move_up()),
            KeyCode::Down if multiline => app.key_source.edit_input(field, |input| input.move_down()),
            _ => false,
        }
    }

    fn render_mode_radios(&self, frame: &mut Frame, app: &App) {
        let theme = &*app.ctx.theme;
        let state = &app.key_source;
        let focused = state.f_mode.get();
        for (mode, area) in [
            (InputMode::FromFile, self.layout.file_radio_area),
            (InputMode::Manual, self.layout.manual_radio_area),
        ] {
            let selected = state.mode() == mode;
            let radio = create_radio_button(mode.label(), selected, focused && selected, theme);
            frame.render_widget(Paragraph::new(radio), area);
        }
    }

    fn render_path_input(&self, frame: &mut Frame, app: &App) {
        let theme = &*app.ctx.theme;
        let state = &app.key_source;
        let area = self.layout.path_input_area;
        let enabled = state.selection().is_file_input_enabled();
        let focused = enabled && state.f_path_input.get();
        let input_block = if enabled {
            block(theme, Some("Key file"), focused)
        } else {
            disabled_block(theme, "Key file")
        };
        let inner = input_block.inner(area);

        let input = state.path_input();
        let text_style = theme.input_text_style(enabled);
        let line = if input.input().is_empty() && !focused {
            Line::from(Span::styled(PATH_PLACEHOLDER, theme.placeholder_style()))
        } else {
            Line::from(Span::styled(input.input().to_string(), text_style))
        };
        let cursor_columns = u16::try_from(input.cursor_columns()).unwrap_or(u16::MAX);
        let scroll = cursor_columns.saturating_sub(inner.width.saturating_sub(1));
        frame.render_widget(Paragraph::new(line).scroll((0, scroll)).block(input_block), area);
        if focused {
            frame.set_cursor_position((inner.x.saturating_add(cursor_columns - scroll), inner.y));
        }

        let options = ButtonRenderOptions::new(enabled, enabled && state.f_browse.get(), false, Borders::ALL, false);
        render_button(frame, self.layout.browse_button_area, "Browse…", theme, options);
    }

    fn render_manual_input(&self, frame: &mut Frame, app: &App) {
        let theme = &*app.ctx.theme;
        let state = &app.key_source;
        let area = self.layout.manual_input_area;
        let enabled = state.selection().is_manual_input_enabled();
        let focused = enabled && state.f_manual_input.get();
        let input_block = if enabled {
            block(theme, Some("Key text"), focused)
        } else {
            disabled_block(theme, "Key text")
        };
        let inner = input_block.inner(area);

        let input = state.manual_input();
        let (line, column) = input.cursor_line_col();
        let line = u16::try_from(line).unwrap_or(u16::MAX);
        let column = u16::try_from(column).unwrap_or(u16::MAX);
        let scroll_y = line.saturating_sub(inner.height.saturating_sub(1));
        let scroll_x = column.saturating_sub(inner.width.saturating_sub(1));
        let text = if input.input().is_empty() && !focused {
            Text::from(Span::styled(MANUAL_PLACEHOLDER, theme.placeholder_style()))
        } else {
            let style = theme.input_text_style(enabled);
            Text::styled(input.input().to_string(), style)
        };
        frame.render_widget(Paragraph::new(text).scroll((scroll_y, scroll_x)).block(input_block), area);
        if focused {
            frame.set_cursor_position((
                inner.x.saturating_add(column - scroll_x),
                inner.y.saturating_add(line - scroll_y),
            ));
        }
    }

    fn render_status(&self, frame: &mut Frame, app: &App) {
        let theme = &*app.ctx.theme;
        let Some(status) = app.key_source.status() else {
            return;
        };
        let (message, style) = match status {
            StatusLine::Info(message) => (message, theme.status_info()),
            StatusLine::Warning(message) => (message, theme.status_warning()),
            StatusLine::Error(message) => (message, theme.status_error()),
        };
        frame.render_widget(Paragraph::new(message.as_str()).style(style), self.layout.status_area);
    }

    fn render_buttons(&self, frame: &mut Frame, app: &App) {
        let theme = &*app.ctx.theme;
        let state = &app.key_source;
        let borders = Borders::ALL;
        let options = ButtonRenderOptions::new(true, state.f_cancel.get(), false, borders, false);
        render_button(frame, self.layout.cancel_button_area, "Cancel", theme, options);

        let enabled = state.can_proceed();
        let options = ButtonRenderOptions::new(enabled, enabled && state.f_next.get(), false, borders, true);
        render_button(frame, self.layout.next_button_area, "Next", theme, options);
    }
}

impl Component for KeySourceComponent {
    fn handle_message(&mut self, app: &mut App, msg: Msg) -> Vec<Effect> {
        match msg {
            Msg::Paste(text) => {
                if app.key_source.paste(&text) {
                    let target = match app.key_source.mode() {
                        InputMode::FromFile => &app.key_source.f_path_input,
                        InputMode::Manual => &app.key_source.f_manual_input,
                    };
                    app.focus.focus(target);
                }
            }
            Msg::FilePicked(path) => {
                if let Err(error) = app.key_source.apply_picked_file(Some(path)) {
                    app.key_source.set_status(Some(StatusLine::Error(error.to_string())));
                }
            }
            // Cancelling never changes the form.
            Msg::FilePickerCancelled => {}
            Msg::ExecCompleted(outcome) => {
                if let ExecOutcome::Log(message) = *outcome {
                    app.key_source.set_status(Some(StatusLine::Error(message)));
                }
            }
            Msg::Tick | Msg::Resize(..) => {}
        }
        Vec::new()
    }

    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return vec![Effect::Quit],
            KeyCode::Tab => {
                app.focus.next();
                return Vec::new();
            }
            KeyCode::BackTab => {
                app.focus.prev();
                return Vec::new();
            }
            KeyCode::Char('n') if ctrl => return self.proceed(app),
            KeyCode::Char('o') if ctrl && app.key_source.selection().is_file_input_enabled() => return self.browse(app),
            _ => {}
        }

        let state = &app.key_source;
        if state.f_mode.get() {
            match key.code {
                KeyCode::Left => self.select_mode(app, InputMode::FromFile),
                KeyCode::Right => self.select_mode(app, InputMode::Manual),
                KeyCode::Char(' ') | KeyCode::Enter => {
                    let toggled = app.key_source.mode().toggled();
                    self.select_mode(app, toggled);
                }
                _ => {}
            }
        } else if state.f_path_input.get() {
            if key.code == KeyCode::Enter {
                return if app.key_source.can_proceed() { self.proceed(app) } else { self.browse(app) };
            }
            Self::handle_text_key(app, InputMode::FromFile, key);
        } else if state.f_manual_input.get() {
            Self::handle_text_key(app, InputMode::Manual, key);
        } else if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
            if state.f_browse.get() {
                return self.browse(app);
            }
            if state.f_next.get() {
                return self.proceed(app);
            }
            if state.f_cancel.get() {
                return vec![Effect::Quit];
            }
        }
        Vec::new()
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Vec::new();
        }
        let pos = Position::new(mouse.column, mouse.row);
        let layout = self.layout.clone();
        let file_enabled = app.key_source.selection().is_file_input_enabled();

        if layout.file_radio_area.contains(pos) || layout.manual_radio_area.contains(pos) {
            let mode = if layout.file_radio_area.contains(pos) {
                InputMode::FromFile
            } else {
                InputMode::Manual
            };
            self.select_mode(app, mode);
            app.focus.focus(&app.key_source.f_mode);
        } else if layout.path_input_area.contains(pos) && file_enabled {
            let column = mouse.column.saturating_sub(layout.path_input_area.x + 1);
            app.key_source.edit_input(InputMode::FromFile, |input| {
                let index = input.cursor_index_for_column(column);
                input.set_cursor(index);
            });
            app.focus.focus(&app.key_source.f_path_input);
        } else if layout.browse_button_area.contains(pos) && file_enabled {
            app.focus.focus(&app.key_source.f_browse);
            return self.browse(app);
        } else if layout.manual_input_area.contains(pos) && !file_enabled {
            app.focus.focus(&app.key_source.f_manual_input);
        } else if layout.cancel_button_area.contains(pos) {
            return vec![Effect::Quit];
        } else if layout.next_button_area.contains(pos) && app.key_source.can_proceed() {
            return self.proceed(app);
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let area = centered_min_max(70, 80, Rect::new(0, 0, 56, 22), Rect::new(0, 0, 100, 32), rect);
        let theme: &dyn Theme = &*app.ctx.theme;
        let outer = block(theme, Some("Select Key"), false);
        let inner = outer.inner(area);
        frame.render_widget(outer, area);

        let areas = self.get_preferred_layout(app, inner);
        self.intro_area = areas[0];
        self.layout = KeySourceLayout::from(&areas[1..]);

        let intro = Paragraph::new(Line::from(Span::styled(
            "Choose how you want to provide your key.",
            app.ctx.theme.text_secondary_style().add_modifier(Modifier::ITALIC),
        )));
        frame.render_widget(intro, self.intro_area);

        self.render_mode_radios(frame, app);
        self.render_path_input(frame, app);
        self.render_manual_input(frame, app);
        self.render_status(frame, app);
        self.render_buttons(frame, app);
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'static>> {
        let state = &app.key_source;
        let mut hints = vec![(" Tab", " Next field ")];
        if state.f_mode.get() {
            hints.push((" ←/→/Space", " Choose mode "));
        }
        if state.selection().is_file_input_enabled() {
            hints.push((" Ctrl+O", " Browse "));
        }
        if state.can_proceed() {
            hints.push((" Ctrl+N", " Next "));
        }
        hints.push((" Esc", " Close"));
        build_hint_spans(&*app.ctx.theme, &hints)
    }

    /// Intro line, then the eight interactive regions in [`KeySourceLayout`] order.
    fn get_preferred_layout(&self, _app: &App, area: Rect) -> Vec<Rect> {
        let rows = Layout::vertical([
            Constraint::Length(1), // Intro
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Mode radios
            Constraint::Length(1), // Spacer
            Constraint::Length(3), // Path input + Browse
            Constraint::Min(5),    // Manual text
            Constraint::Length(1), // Status
            Constraint::Length(3), // Buttons
        ])
        .split(area);

        let radios = Layout::horizontal([
            Constraint::Length(InputMode::FromFile.label().len() as u16 + 5),
            Constraint::Length(2),
            Constraint::Length(InputMode::Manual.label().len() as u16 + 5),
            Constraint::Min(0),
        ])
        .split(rows[2]);

        let path_row = Layout::horizontal([Constraint::Min(10), Constraint::Length(1), Constraint::Length(12)]).split(rows[4]);

        let buttons = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(10),
            Constraint::Length(1),
            Constraint::Length(10),
        ])
        .split(rows[7]);

        vec![
            rows[0],
            radios[0],
            radios[2],
            path_row[0],
            path_row[2],
            rows[5],
            rows[6],
            buttons[1],
            buttons[3],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FormOptions;
    use keysource_types::{KeySource, Modal};
    use ratatui::{Terminal, backend::TestBackend};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn click(area: Rect) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: area.x,
            row: area.y,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn type_keys(component: &mut KeySourceComponent, app: &mut App, text: &str) {
        for c in text.chars() {
            component.handle_key_events(app, key(KeyCode::Char(c)));
        }
    }

    /// Renders once so the component knows where its controls are.
    fn rendered() -> (KeySourceComponent, App) {
        let mut app = App::new(FormOptions::default());
        let mut component = KeySourceComponent::default();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| component.render(frame, frame.area(), &mut app)).unwrap();
        (component, app)
    }

    #[test]
    fn arrows_and_space_toggle_mode_on_the_radio_group() {
        let mut app = App::new(FormOptions::default());
        let mut component = KeySourceComponent::default();
        assert!(app.key_source.f_mode.get());

        assert!(component.handle_key_events(&mut app, key(KeyCode::Right)).is_empty());
        assert_eq!(app.key_source.mode(), InputMode::Manual);
        component.handle_key_events(&mut app, key(KeyCode::Left));
        assert_eq!(app.key_source.mode(), InputMode::FromFile);
        component.handle_key_events(&mut app, key(KeyCode::Char(' ')));
        assert_eq!(app.key_source.mode(), InputMode::Manual);
        assert!(app.key_source.selection().is_manual_input_enabled());
        assert!(!app.key_source.selection().is_file_input_enabled());
    }

    #[test]
    fn ctrl_n_does_nothing_until_the_form_is_ready() {
        let mut app = App::new(FormOptions::default());
        let mut component = KeySourceComponent::default();

        assert!(component.handle_key_events(&mut app, ctrl('n')).is_empty());
        assert!(matches!(app.key_source.status(), Some(StatusLine::Error(_))));

        app.focus.focus(&app.key_source.f_path_input);
        type_keys(&mut component, &mut app, "/keys/id.pem");
        assert_eq!(
            component.handle_key_events(&mut app, ctrl('n')),
            vec![Effect::Proceed(KeySource::FromFile("/keys/id.pem".into()))]
        );
    }

    #[test]
    fn enter_in_path_field_browses_when_empty_and_proceeds_when_filled() {
        let mut app = App::new(FormOptions::default());
        let mut component = KeySourceComponent::default();
        app.focus.focus(&app.key_source.f_path_input);

        let effects = component.handle_key_events(&mut app, key(KeyCode::Enter));
        assert!(matches!(effects.as_slice(), [Effect::ShowModal(Modal::FilePicker { .. })]));

        type_keys(&mut component, &mut app, "id.pem");
        assert_eq!(app.key_source.path_input().input(), "id.pem");
        assert_eq!(
            component.handle_key_events(&mut app, key(KeyCode::Enter)),
            vec![Effect::Proceed(KeySource::FromFile("id.pem".into()))]
        );
    }

    #[test]
    fn ctrl_o_is_ignored_in_manual_mode() {
        let mut app = App::new(FormOptions {
            initial_mode: InputMode::Manual,
            ..FormOptions::default()
        });
        let mut component = KeySourceComponent::default();
        assert!(component.handle_key_events(&mut app, ctrl('o')).is_empty());
    }

    #[test]
    fn esc_and_cancel_close_the_form() {
        let mut app = App::new(FormOptions::default());
        let mut component = KeySourceComponent::default();
        assert_eq!(component.handle_key_events(&mut app, key(KeyCode::Esc)), vec![Effect::Quit]);

        app.focus.focus(&app.key_source.f_cancel);
        assert_eq!(component.handle_key_events(&mut app, key(KeyCode::Enter)), vec![Effect::Quit]);
    }

    #[test]
    fn clicking_a_radio_switches_mode() {
        let (mut component, mut app) = rendered();
        let manual_radio = component.layout.manual_radio_area;
        assert!(component.handle_mouse_events(&mut app, click(manual_radio)).is_empty());
        assert_eq!(app.key_source.mode(), InputMode::Manual);
        assert!(app.key_source.f_mode.get());

        let file_radio = component.layout.file_radio_area;
        component.handle_mouse_events(&mut app, click(file_radio));
        assert_eq!(app.key_source.mode(), InputMode::FromFile);
    }

    #[test]
    fn clicking_next_only_proceeds_once_enabled() {
        let (mut component, mut app) = rendered();
        let next = component.layout.next_button_area;
        assert!(component.handle_mouse_events(&mut app, click(next)).is_empty());

        app.focus.focus(&app.key_source.f_path_input);
        type_keys(&mut component, &mut app, "/keys/id.pem");
        assert_eq!(
            component.handle_mouse_events(&mut app, click(next)),
            vec![Effect::Proceed(KeySource::FromFile("/keys/id.pem".into()))]
        );

        let cancel = component.layout.cancel_button_area;
        assert_eq!(component.handle_mouse_events(&mut app, click(cancel)), vec![Effect::Quit]);
    }

    #[test]
    fn clicks_on_the_disabled_input_are_ignored() {
        let (mut component, mut app) = rendered();
        let manual_input = component.layout.manual_input_area;
        component.handle_mouse_events(&mut app, click(manual_input));
        assert!(!app.key_source.f_manual_input.get());

        let browse = component.layout.browse_button_area;
        let effects = component.handle_mouse_events(&mut app, click(browse));
        assert!(matches!(effects.as_slice(), [Effect::ShowModal(Modal::FilePicker { .. })]));
    }
}
