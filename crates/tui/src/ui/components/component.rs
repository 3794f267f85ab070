//! Component system for the keysource TUI.
//!
//! Components are self-contained UI elements: they own local UI behavior,
//! react to input and application messages, render themselves into a `Rect`,
//! and report side effects back to the runtime as [`Effect`]s instead of
//! mutating global state directly.

use crossterm::event::{KeyEvent, MouseEvent};
use keysource_types::{Effect, Msg};
use ratatui::{Frame, layout::Rect, text::Span};

use crate::app::App;

/// A UI component with its own behavior and rendering.
///
/// # Lifecycle
///
/// 1. `on_route_enter` runs when the component becomes visible (e.g. a modal opens).
/// 2. Input arrives through `handle_key_events` / `handle_mouse_events`.
/// 3. Application messages arrive through `handle_message`.
/// 4. `render` draws the component; it should not change state beyond cursor placement
///    and cached layout.
/// 5. `on_route_exit` runs before the component is dropped.
pub(crate) trait Component {
    /// Handle an application-level message (background results, paste, picker outcome).
    fn handle_message(&mut self, _app: &mut App, _msg: Msg) -> Vec<Effect> {
        Vec::new()
    }

    /// Handle key events while this component owns input.
    fn handle_key_events(&mut self, _app: &mut App, _key: KeyEvent) -> Vec<Effect> {
        Vec::new()
    }

    /// Handle mouse events while this component owns input.
    fn handle_mouse_events(&mut self, _app: &mut App, _mouse: MouseEvent) -> Vec<Effect> {
        Vec::new()
    }

    /// Render the component into the given area.
    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App);

    /// Key hints shown in the footer while this component is active.
    fn get_hint_spans(&self, _app: &App) -> Vec<Span<'static>> {
        Vec::new()
    }

    /// Splits `area` into the regions this component renders into.
    fn get_preferred_layout(&self, _app: &App, area: Rect) -> Vec<Rect> {
        vec![area]
    }

    fn on_route_enter(&mut self, _app: &mut App) -> Vec<Effect> {
        Vec::new()
    }

    fn on_route_exit(&mut self, _app: &mut App) -> Vec<Effect> {
        Vec::new()
    }
}
