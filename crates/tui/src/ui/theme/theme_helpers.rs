use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph},
};

use super::roles::{Theme, ThemeRoles};

/// Build a standard Block with theme surfaces and borders.
pub fn block<'a, T: Theme + ?Sized>(theme: &'a T, title: Option<&'a str>, focused: bool) -> Block<'a> {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(theme.border_style(focused))
        .style(panel_style(theme));
    if let Some(t) = title {
        block = block.title(Span::styled(t, theme.text_secondary_style().add_modifier(Modifier::BOLD)));
    }
    block
}

/// Block for an input that cannot be edited in the current state.
pub fn disabled_block<'a, T: Theme + ?Sized>(theme: &'a T, title: &'a str) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(theme.text_muted_style())
        .style(panel_style(theme))
        .title(Span::styled(title, theme.text_muted_style()))
}

/// Style for panel-like containers (set background on widget using `.style`).
pub fn panel_style<T: Theme + ?Sized>(theme: &T) -> Style {
    let ThemeRoles { surface, text, .. } = *theme.roles();
    Style::default().bg(surface).fg(text)
}

/// Primary button style (filled accent background).
pub fn button_primary_style<T: Theme + ?Sized>(theme: &T, enabled: bool) -> Style {
    if enabled {
        let ThemeRoles { accent_primary, background, .. } = *theme.roles();
        Style::default().bg(accent_primary).fg(background).add_modifier(Modifier::BOLD)
    } else {
        let ThemeRoles {
            surface_muted, text_muted, ..
        } = *theme.roles();
        Style::default().bg(surface_muted).fg(text_muted)
    }
}

/// Secondary button style (outline-like, rely on border color in Block).
pub fn button_secondary_style<T: Theme + ?Sized>(theme: &T, enabled: bool, selected: bool) -> Style {
    if !enabled {
        return theme.text_muted_style();
    }
    let ThemeRoles {
        accent_secondary,
        selection_bg,
        ..
    } = *theme.roles();
    let style = Style::default().fg(accent_secondary);
    if selected { style.bg(selection_bg) } else { style }
}

/// Flags controlling how [`render_button`] draws a button.
#[derive(Debug, Clone, Copy)]
pub struct ButtonRenderOptions {
    pub enabled: bool,
    pub focused: bool,
    pub selected: bool,
    pub borders: Borders,
    pub is_primary: bool,
}

impl ButtonRenderOptions {
    pub fn new(enabled: bool, focused: bool, selected: bool, borders: Borders, is_primary: bool) -> Self {
        Self {
            enabled,
            focused,
            selected,
            borders,
            is_primary,
        }
    }
}

/// Renders a standard button
pub fn render_button<T: Theme + ?Sized>(frame: &mut Frame, area: Rect, label: &str, theme: &T, options: ButtonRenderOptions) {
    let border_style = if options.enabled {
        theme.border_style(options.focused)
    } else {
        theme.text_muted_style()
    };

    let button_style = match (options.enabled, options.is_primary) {
        (false, _) => theme.text_muted_style(),
        (true, true) => button_primary_style(theme, true),
        (true, false) => button_secondary_style(theme, true, options.selected),
    };

    // Unbordered buttons get padding so they match the bordered size
    let padding = if options.borders.is_empty() {
        Padding::uniform(1)
    } else {
        Padding::uniform(0)
    };

    frame.render_widget(
        Paragraph::new(label)
            .centered()
            .block(
                Block::bordered()
                    .borders(options.borders)
                    .border_style(border_style)
                    .padding(padding),
            )
            .style(button_style),
        area,
    );
}

/// Builds a single radio option: `[✓] Label` when selected, `[ ] Label` otherwise.
pub fn create_radio_button<T: Theme + ?Sized>(label: &str, selected: bool, focused: bool, theme: &T) -> Line<'static> {
    let marker = if selected { "[✓]" } else { "[ ]" };
    let marker_style = if selected {
        theme.status_success()
    } else {
        theme.text_secondary_style()
    };
    let label_style = if selected {
        theme.text_primary_style().add_modifier(Modifier::BOLD)
    } else {
        theme.text_primary_style()
    };
    let line = Line::from(vec![
        Span::styled(marker, marker_style),
        Span::raw(" "),
        Span::styled(label.to_string(), label_style),
    ]);
    if focused { line.style(theme.selection_style()) } else { line }
}

/// Turns `(key, description)` pairs into styled hint spans.
pub fn build_hint_spans<T: Theme + ?Sized>(theme: &T, hints: &[(&'static str, &'static str)]) -> Vec<Span<'static>> {
    hints
        .iter()
        .flat_map(|(key, description)| {
            [
                Span::styled(*key, theme.accent_emphasis_style()),
                Span::styled(*description, theme.text_muted_style()),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::DraculaTheme;

    #[test]
    fn radio_marker_reflects_selection() {
        let theme = DraculaTheme::new();
        let selected = create_radio_button("Load from file", true, false, &theme);
        let unselected = create_radio_button("Enter manually", false, false, &theme);
        assert_eq!(selected.spans[0].content, "[✓]");
        assert_eq!(unselected.spans[0].content, "[ ]");
        assert_eq!(selected.spans[2].content, "Load from file");
    }

    #[test]
    fn hint_spans_alternate_keys_and_descriptions() {
        let theme = DraculaTheme::new();
        let spans = build_hint_spans(&theme, &[(" Tab", " Next field "), (" Esc", " Close")]);
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].content, " Tab");
        assert_eq!(spans[3].content, " Close");
    }
}
