use ratatui::style::{Color, Modifier, Style};

use super::core::scheduler::ToastLevel;
use super::core::state::Theme;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub up: Color,
    pub down: Color,
    pub warn: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
}

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            text: Color::White,
            muted: Color::Gray,
            accent: Color::LightCyan,
            up: Color::Green,
            down: Color::Red,
            warn: Color::Yellow,
            highlight_fg: Color::Black,
            highlight_bg: Color::Yellow,
        },
        Theme::Light => Palette {
            text: Color::Black,
            muted: Color::DarkGray,
            accent: Color::Blue,
            up: Color::Rgb(0, 128, 0),
            down: Color::Rgb(190, 0, 0),
            warn: Color::Rgb(170, 100, 0),
            highlight_fg: Color::White,
            highlight_bg: Color::Blue,
        },
    }
}

impl Palette {
    pub fn text(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Green for gains, red for losses, muted when flat or unknown.
    pub fn change(&self, value: Option<f64>) -> Style {
        match value {
            Some(v) if v > 0.0 => Style::default().fg(self.up),
            Some(v) if v < 0.0 => Style::default().fg(self.down),
            _ => self.muted(),
        }
    }

    pub fn toast(&self, level: ToastLevel) -> Style {
        match level {
            ToastLevel::Info => Style::default().fg(self.accent),
            ToastLevel::Warning => Style::default().fg(self.warn),
            ToastLevel::Alert => Style::default()
                .fg(self.highlight_fg)
                .bg(self.down)
                .add_modifier(Modifier::BOLD),
        }
    }
}
