//! Modal that lets the user browse for a key file and preview it before choosing.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use keysource_types::{Effect, ExecOutcome, Msg};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, List, Paragraph},
};

use crate::{
    app::App,
    ui::{
        components::Component,
        theme::theme_helpers::{ButtonRenderOptions, block, build_hint_spans, render_button},
        utils::find_target_index_by_mouse_position,
    },
};

/// Resolved rectangles for each render region.
#[derive(Debug, Clone, Default)]
pub struct FilePickerLayout {
    shortcut_bar_area: Rect,
    header_area: Rect,
    header_inner_area: Rect,
    file_list_area: Rect,
    preview_area: Rect,
    error_message_area: Rect,
    cancel_button_area: Rect,
    open_button_area: Rect,
}

impl From<&[Rect]> for FilePickerLayout {
    fn from(layout: &[Rect]) -> Self {
        FilePickerLayout {
            shortcut_bar_area: layout[0],
            header_area: layout[1],
            header_inner_area: Rect::default(),
            file_list_area: layout[2],
            preview_area: layout[3],
            error_message_area: layout[4],
            cancel_button_area: layout[5],
            open_button_area: layout[6],
        }
    }
}

/// Controller + renderer for the file picker modal.
#[derive(Debug, Clone, Default)]
pub struct FilePickerModal {
    layout: FilePickerLayout,
    shortcut_rects: Vec<Rect>,
}

impl FilePickerModal {
    fn render_shortcuts(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) -> Option<()> {
        let theme = &*app.ctx.theme;
        let block = Block::bordered().style(theme.border_style(false));
        let inner = block.inner(rect);

        frame.render_widget(block, rect);
        self.shortcut_rects.clear();
        let file_picker = app.file_picker.as_ref()?;
        let selected_idx = file_picker.selected_shortcut_idx();
        for (index, shortcut) in file_picker.shortcuts().iter().enumerate() {
            let is_focused = file_picker.shortcuts_focus().get(index).is_some_and(|f| f.get());
            let area = Rect {
                x: inner.x,
                y: inner.y + (3 * index as u16),
                width: inner.width,
                height: 3,
            };
            if area.y + area.height > inner.y + inner.height {
                continue;
            }
            let borders = if is_focused { Borders::ALL } else { Borders::NONE };
            let options = ButtonRenderOptions::new(true, is_focused, selected_idx == Some(index), borders, false);
            render_button(frame, area, &shortcut.name, theme, options);
            self.shortcut_rects.push(area);
        }

        Some(())
    }

    fn render_header(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) -> Option<Rect> {
        let file_picker = app.file_picker.as_mut()?;
        let is_focused = file_picker.f_path_input.get();
        let theme = &*app.ctx.theme;
        let title = Line::from(Span::styled("Path", theme.text_secondary_style().add_modifier(Modifier::BOLD)));
        let input_block = block(theme, None, is_focused).title(title);
        let inner_area = input_block.inner(rect);

        // Show the current directory as a placeholder while the field is empty and idle
        let placeholder = file_picker.cur_dir().map(|dir| dir.display().to_string());
        let path_input_state = file_picker.path_input_state_mut();
        let content_line = match (path_input_state.input(), placeholder) {
            ("", Some(dir)) if !is_focused => Line::from(Span::styled(dir, theme.text_muted_style())),
            (query, _) => Line::from(Span::styled(query.to_string(), theme.text_primary_style())),
        };
        let cursor_columns = path_input_state.cursor_columns() as u16;
        let scroll = cursor_columns.saturating_sub(inner_area.width.saturating_sub(1));
        let paragraph = Paragraph::new(content_line)
            .style(theme.text_primary_style())
            .scroll((0, scroll))
            .block(input_block);
        frame.render_widget(paragraph, rect);
        if is_focused {
            frame.set_cursor_position((inner_area.x + cursor_columns - scroll, inner_area.y));
        }

        Some(inner_area)
    }

    fn render_list(&self, frame: &mut Frame, rect: Rect, app: &mut App) -> Option<()> {
        let file_picker = app.file_picker.as_mut()?;

        let mut list_items = file_picker.list_items().to_vec();
        let is_focused = file_picker.f_list.get();
        if let Some(idx) = file_picker.mouse_over_idx()
            && let Some(item) = list_items.get_mut(idx)
        {
            *item = item
                .clone()
                .style(app.ctx.theme.selection_style().add_modifier(Modifier::BOLD));
        }

        let list_block = Block::new()
            .borders(Borders::LEFT)
            .border_style(app.ctx.theme.border_style(is_focused));
        let list = List::new(list_items)
            .block(list_block)
            .highlight_style(app.ctx.theme.selection_style());
        frame.render_stateful_widget(list, rect, file_picker.list_state_mut());
        Some(())
    }

    fn render_preview(&self, frame: &mut Frame, area: Rect, app: &mut App) -> Option<()> {
        let file_picker = app.file_picker.as_ref()?;
        let p_block = Block::new()
            .borders(Borders::LEFT)
            .border_style(app.ctx.theme.border_style(file_picker.f_preview.get()));
        let preview = match file_picker.file_contents() {
            Some(contents) => Paragraph::new(contents.to_string())
                .style(app.ctx.theme.text_primary_style())
                .scroll((file_picker.preview_scroll_offset(), 0)),
            None => Paragraph::new("No preview available").style(app.ctx.theme.status_info()),
        };
        frame.render_widget(preview.block(p_block), area);
        Some(())
    }

    fn render_error_message(&self, frame: &mut Frame, area: Rect, app: &mut App) -> Option<()> {
        let error_message = app.file_picker.as_ref()?.user_input_error()?;
        frame.render_widget(Paragraph::new(error_message.to_string()).style(app.ctx.theme.status_error()), area);
        Some(())
    }

    fn render_buttons(&self, frame: &mut Frame, layout: &FilePickerLayout, app: &mut App) -> Option<()> {
        let file_picker = app.file_picker.as_ref()?;
        let options = ButtonRenderOptions::new(true, file_picker.f_cancel.get(), false, Borders::ALL, false);
        render_button(frame, layout.cancel_button_area, "Cancel", &*app.ctx.theme, options);

        let enabled = file_picker.selected_file().is_some() || file_picker.is_path_input_valid();
        let options = ButtonRenderOptions::new(enabled, file_picker.f_confirm.get(), false, Borders::ALL, true);
        render_button(frame, layout.open_button_area, "Open", &*app.ctx.theme, options);

        Some(())
    }

    fn handle_maybe_button_click(&mut self, pos: Position, app: &mut App) -> Option<Vec<Effect>> {
        let file_picker = app.file_picker.as_mut()?;
        if let Some(shortcut_idx) =
            find_target_index_by_mouse_position(&self.layout.shortcut_bar_area, &self.shortcut_rects, pos.x, pos.y)
        {
            let path = file_picker.shortcut_pressed(shortcut_idx)?;
            app.focus.focus(file_picker.shortcuts_focus().get(shortcut_idx)?);
            return Some(vec![Effect::ListDirectoryContents(path)]);
        }

        if self.layout.cancel_button_area.contains(pos) {
            return Some(cancel_effects());
        }

        if self.layout.open_button_area.contains(pos) {
            return self.maybe_commit_selection(app);
        }
        None
    }

    /// Opens a highlighted directory, or closes the modal with the chosen file.
    fn maybe_commit_selection(&mut self, app: &mut App) -> Option<Vec<Effect>> {
        let file_picker = app.file_picker.as_mut()?;
        if let Some(selected) = file_picker.selected_file().cloned() {
            if selected.is_directory {
                file_picker.set_cur_dir(Some(selected.path.clone()));
                return Some(vec![Effect::ListDirectoryContents(selected.path)]);
            }
            return Some(vec![Effect::CloseModal, Effect::FilePicked(selected.path)]);
        }

        let Some(typed) = file_picker.typed_path().filter(|_| file_picker.is_path_input_valid()) else {
            file_picker.set_user_input_error(Some("No such file or directory".to_string()));
            return None;
        };
        if typed.is_dir() {
            file_picker.path_input_state_mut().clear();
            file_picker.set_cur_dir(Some(typed.clone()));
            return Some(vec![Effect::ListDirectoryContents(typed)]);
        }
        Some(vec![Effect::CloseModal, Effect::FilePicked(typed)])
    }
}

fn cancel_effects() -> Vec<Effect> {
    vec![Effect::CloseModal, Effect::FilePickerCancelled]
}

impl Component for FilePickerModal {
    fn handle_message(&mut self, app: &mut App, msg: Msg) -> Vec<Effect> {
        let Msg::ExecCompleted(outcome) = msg else {
            return Vec::new();
        };
        let theme = &*app.ctx.theme;
        let Some(file_picker) = app.file_picker.as_mut() else {
            return Vec::new();
        };

        match *outcome {
            ExecOutcome::FileContents(contents, path) if file_picker.selected_file().is_some_and(|f| f.path == path) => {
                file_picker.set_file_contents(contents);
            }
            ExecOutcome::DirectoryContents { entries, root_path } if file_picker.cur_dir().is_some_and(|dir| *dir == root_path) => {
                file_picker.set_dir_contents(Some(entries));
                file_picker.rebuild_list_items(theme);
                if let Some(entry) = file_picker.selected_file()
                    && !entry.is_directory
                {
                    return vec![Effect::ReadFileContents(entry.path.clone())];
                }
            }
            ExecOutcome::Log(message) => {
                file_picker.set_user_input_error(Some(message));
            }
            _ => {}
        }

        Vec::new()
    }

    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        let Some(file_picker) = app.file_picker.as_mut() else {
            return Vec::new();
        };

        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter if file_picker.f_list.get() || file_picker.f_confirm.get() => {
                if let Some(effects) = self.maybe_commit_selection(app) {
                    return effects;
                }
            }

            KeyCode::Enter if file_picker.f_path_input.get() => {
                if let Some(effects) = self.maybe_commit_selection(app) {
                    return effects;
                }
            }

            KeyCode::Char(' ') | KeyCode::Enter if file_picker.f_cancel.get() => {
                return cancel_effects();
            }

            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(idx) = file_picker.shortcuts_focus().iter().position(|f| f.get())
                    && let Some(path) = file_picker.shortcut_pressed(idx)
                {
                    return vec![Effect::ListDirectoryContents(path)];
                }
            }

            KeyCode::Char(character)
                if file_picker.f_path_input.get()
                    && !character.is_control()
                    && (key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT) =>
            {
                file_picker.insert_path_char(character);
                file_picker.set_selected_index(None);
            }

            KeyCode::Backspace if file_picker.f_path_input.get() => {
                file_picker.backspace_path_char();
            }

            KeyCode::Delete if file_picker.f_path_input.get() => {
                file_picker.delete_path_char();
            }

            KeyCode::Right if file_picker.f_path_input.get() => {
                file_picker.path_input_state_mut().move_right();
            }

            KeyCode::Left if file_picker.f_path_input.get() => {
                file_picker.path_input_state_mut().move_left();
            }

            KeyCode::Down if file_picker.f_list.get() => {
                if let Some(entry) = file_picker.select_next()
                    && !entry.is_directory
                {
                    return vec![Effect::ReadFileContents(entry.path.clone())];
                }
            }

            KeyCode::Down if file_picker.f_preview.get() => {
                file_picker.scroll_preview_down_by(1, self.layout.preview_area.height);
            }

            KeyCode::Up if file_picker.f_list.get() => {
                if let Some(entry) = file_picker.select_previous()
                    && !entry.is_directory
                {
                    return vec![Effect::ReadFileContents(entry.path.clone())];
                }
            }

            KeyCode::Up if file_picker.f_preview.get() => {
                file_picker.scroll_preview_up_by(1);
            }

            KeyCode::Tab => {
                app.focus.next();
            }

            KeyCode::BackTab => {
                app.focus.prev();
            }

            KeyCode::Esc => {
                return cancel_effects();
            }

            _ => {}
        }

        Vec::new()
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        let Some(file_picker) = app.file_picker.as_mut() else {
            return Vec::new();
        };
        let pos = Position::new(mouse.column, mouse.row);
        let list_area = self.layout.file_list_area;
        let hit_test_list = list_area.contains(pos);
        let hit_test_preview = self.layout.preview_area.contains(pos);
        let hit_test_path_input = self.layout.header_area.contains(pos);
        let idx = hit_test_list.then(|| (pos.y - list_area.y) as usize + file_picker.list_state_offset());

        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Up(MouseButton::Left) => {
                file_picker.set_mouse_over_idx(idx);
            }
            MouseEventKind::ScrollDown => {
                if hit_test_list {
                    file_picker.list_state_mut().scroll_down_by(1);
                } else if hit_test_preview {
                    file_picker.scroll_preview_down_by(1, self.layout.preview_area.height);
                }
            }
            MouseEventKind::ScrollUp => {
                if hit_test_list {
                    file_picker.list_state_mut().scroll_up_by(1);
                } else if hit_test_preview {
                    file_picker.scroll_preview_up_by(1);
                }
            }
            MouseEventKind::Down(MouseButton::Left) => match () {
                _ if hit_test_list => {
                    app.focus.focus(&file_picker.f_list);
                    let was_selected = idx.is_some() && file_picker.list_state_mut().selected() == idx;
                    if was_selected {
                        // Second click on the same entry opens it.
                        return self.maybe_commit_selection(app).unwrap_or_default();
                    }
                    if let Some(entry) = file_picker.set_selected_index(idx)
                        && !entry.is_directory
                    {
                        return vec![Effect::ReadFileContents(entry.path.clone())];
                    }
                }
                _ if hit_test_path_input => {
                    let relative_column = mouse.column.saturating_sub(self.layout.header_inner_area.x);
                    let path_input_state = file_picker.path_input_state_mut();
                    let cursor_index = path_input_state.cursor_index_for_column(relative_column);
                    path_input_state.set_cursor(cursor_index);
                    app.focus.focus(&file_picker.f_path_input);
                }
                _ => return self.handle_maybe_button_click(pos, app).unwrap_or_default(),
            },

            _ => {}
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let block = block(&*app.ctx.theme, Some("Choose Key File"), true);

        let mut layout = FilePickerLayout::from(self.get_preferred_layout(app, block.inner(rect)).as_slice());
        frame.render_widget(block, rect);
        self.render_shortcuts(frame, layout.shortcut_bar_area, app);
        if let Some(inner_area) = self.render_header(frame, layout.header_area, app) {
            layout.header_inner_area = inner_area;
        }
        self.render_list(frame, layout.file_list_area, app);
        self.render_preview(frame, layout.preview_area, app);
        self.render_error_message(frame, layout.error_message_area, app);
        self.render_buttons(frame, &layout, app);

        self.layout = layout;
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'static>> {
        let Some(file_picker) = app.file_picker.as_ref() else {
            return vec![];
        };
        let mut hints = vec![(" Esc", " Cancel ")];
        if file_picker.f_list.get() {
            hints.push((" ↑/↓", " Navigate "));
        }
        if file_picker.f_list.get() || file_picker.f_confirm.get() {
            hints.push((" Enter/Space", " Open "));
        }
        if file_picker.f_path_input.get() {
            hints.push((" Enter", " Go to path "));
        }
        hints.push((" Tab", " Next control "));
        build_hint_spans(&*app.ctx.theme, &hints)
    }

    fn get_preferred_layout(&self, _app: &App, area: Rect) -> Vec<Rect> {
        let outer_areas = Layout::horizontal([
            Constraint::Length(13), // Shortcuts
            Constraint::Length(1),  // Spacer
            Constraint::Min(1),     // Browser
        ])
        .split(area);

        let inner_areas = Layout::vertical([
            Constraint::Length(3), // Path input
            Constraint::Min(5),    // List + preview
            Constraint::Length(3), // Buttons
        ])
        .split(outer_areas[2]);

        let file_viewer_areas = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(inner_areas[1]);

        let button_areas = Layout::horizontal([
            Constraint::Min(10),    // Error message
            Constraint::Length(10), // Cancel
            Constraint::Length(1),  // Spacer
            Constraint::Length(10), // Open
        ])
        .split(inner_areas[2]);

        // Pin the error message to the baseline of the button row
        let error_message = Layout::vertical([Constraint::Length(2), Constraint::Length(1)]).split(button_areas[0]);

        vec![
            outer_areas[0],
            inner_areas[0],
            file_viewer_areas[0],
            file_viewer_areas[1],
            error_message[1],
            button_areas[1],
            button_areas[3],
        ]
    }

    /// Requests the initial directory listing when the modal opens.
    fn on_route_enter(&mut self, app: &mut App) -> Vec<Effect> {
        app.file_picker
            .as_ref()
            .and_then(|picker| picker.cur_dir())
            .map(|dir| vec![Effect::ListDirectoryContents(dir.clone())])
            .unwrap_or_default()
    }
}
