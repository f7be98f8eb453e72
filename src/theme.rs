//! Dark/light theme colors shared by the charts and the table.

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn text_color(self) -> Color {
        match self {
            Theme::Dark => Color::Rgb(0xf3, 0xf4, 0xf6),
            Theme::Light => Color::Rgb(0x1f, 0x29, 0x37),
        }
    }

    pub fn grid_color(self) -> Color {
        match self {
            Theme::Dark => Color::Rgb(0x37, 0x41, 0x51),
            Theme::Light => Color::Rgb(0xe5, 0xe7, 0xeb),
        }
    }

    pub fn accent_color(self) -> Color {
        Color::Rgb(0x3b, 0x82, 0xf6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_between_the_two_modes() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn serializes_as_lowercase_key() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        let theme: Theme = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(theme, Theme::Light);
    }
}
