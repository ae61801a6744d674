//! Light/dark theme selection and the matching colour palettes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn palette(self) -> &'static Palette {
        match self {
            Theme::Dark => &DARK,
            Theme::Light => &LIGHT,
        }
    }
}

/// Hex colour strings for every themed surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub background: &'static str,
    pub surface: &'static str,
    pub text: &'static str,
    pub text_secondary: &'static str,
    pub border: &'static str,
    pub success: &'static str,
    pub warning: &'static str,
    pub error: &'static str,
}

const DARK: Palette = Palette {
    primary: "#4A154B",
    secondary: "#7C3AED",
    background: "#1A1D29",
    surface: "#2D3142",
    text: "#FFFFFF",
    text_secondary: "#8B8D97",
    border: "#23242A",
    success: "#10B981",
    warning: "#F59E0B",
    error: "#EF4444",
};

const LIGHT: Palette = Palette {
    primary: "#4A154B",
    secondary: "#7C3AED",
    background: "#FFFFFF",
    surface: "#F8F9FA",
    text: "#1D1C1D",
    text_secondary: "#616061",
    border: "#E1E5E9",
    success: "#10B981",
    warning: "#F59E0B",
    error: "#EF4444",
};

#[derive(Debug, Clone, Default)]
pub struct ThemeStore {
    theme: Theme,
}

impl ThemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn colors(&self) -> &'static Palette {
        self.theme.palette()
    }
}
