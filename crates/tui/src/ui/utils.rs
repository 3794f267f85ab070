//! Layout helpers shared by the UI components.

use ratatui::prelude::*;

/// Creates a centered rectangle sized as a percentage of `r`.
///
/// Used for modal dialogs and popups.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let area = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1]);
    area[1]
}

/// Like [`centered_rect`], but clamps the result between the sizes of `min` and `max`.
///
/// The result never exceeds `area`, so small terminals still get a usable modal.
pub fn centered_min_max(percent_x: u16, percent_y: u16, min: Rect, max: Rect, area: Rect) -> Rect {
    let width = (area.width.saturating_mul(percent_x) / 100)
        .clamp(min.width, max.width.max(min.width))
        .min(area.width);
    let height = (area.height.saturating_mul(percent_y) / 100)
        .clamp(min.height, max.height.max(min.height))
        .min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Returns the index of the rect under the mouse, if the position lies inside `container`.
pub fn find_target_index_by_mouse_position(container: &Rect, targets: &[Rect], x: u16, y: u16) -> Option<usize> {
    let position = Position::new(x, y);
    if !container.contains(position) {
        return None;
    }
    targets.iter().position(|rect| rect.contains(position))
}
