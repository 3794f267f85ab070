//! ANSI 256-color fallback theme for terminals without truecolor support.
//!
//! Approximates the Dracula palette with indexed colors so the form stays
//! legible inside macOS Terminal and other 8-bit terminals.

use ratatui::style::Color;

use super::roles::{Theme, ThemeRoles};

fn base_roles() -> ThemeRoles {
    ThemeRoles {
        background: Color::Indexed(236),
        surface: Color::Indexed(236),
        surface_muted: Color::Indexed(239),
        border: Color::Indexed(239),

        text: Color::Indexed(255),
        text_secondary: Color::Indexed(250),
        text_muted: Color::Indexed(247),

        accent_primary: Color::Indexed(212),
        accent_secondary: Color::Indexed(117),

        info: Color::Indexed(117),
        success: Color::Indexed(84),
        warning: Color::Indexed(215),
        error: Color::Indexed(203),

        selection_bg: Color::Indexed(239),
        selection_fg: Color::Indexed(255),
        focus: Color::Indexed(117),
        modal_bg: Color::Indexed(232),
    }
}

/// ANSI 256-color approximation of the Dracula palette.
#[derive(Debug, Clone)]
pub struct Ansi256Theme {
    roles: ThemeRoles,
}

impl Ansi256Theme {
    pub fn new() -> Self {
        Self { roles: base_roles() }
    }
}

impl Theme for Ansi256Theme {
    fn roles(&self) -> &ThemeRoles {
        &self.roles
    }
}

/// High-contrast variant for ANSI terminals.
#[derive(Debug, Clone)]
pub struct Ansi256ThemeHighContrast {
    roles: ThemeRoles,
}

impl Ansi256ThemeHighContrast {
    pub fn new() -> Self {
        Self {
            roles: ThemeRoles {
                border: Color::Indexed(141),
                text_secondary: Color::Indexed(117),
                text_muted: Color::Indexed(61),
                modal_bg: Color::Indexed(235),
                ..base_roles()
            },
        }
    }
}

impl Theme for Ansi256ThemeHighContrast {
    fn roles(&self) -> &ThemeRoles {
        &self.roles
    }
}
