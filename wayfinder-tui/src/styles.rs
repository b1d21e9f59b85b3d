use crate::transcript::Tone;
use ratatui::style::{Color, Modifier, Style};
use wayfinder_config::Theme;

pub fn background(theme: Theme) -> Style {
    match theme {
        Theme::Dark => Style::default().bg(Color::Black).fg(Color::White),
        Theme::Light => Style::default().bg(Color::White).fg(Color::Black),
    }
}

pub fn title(theme: Theme) -> Style {
    let fg = match theme {
        Theme::Dark => Color::Cyan,
        Theme::Light => Color::Blue,
    };
    background(theme).fg(fg).add_modifier(Modifier::BOLD)
}

pub fn line(tone: Tone, theme: Theme) -> Style {
    let dark = theme == Theme::Dark;
    let base = background(theme);
    match tone {
        Tone::UserHeader => line(Tone::UserText, theme).add_modifier(Modifier::BOLD),
        Tone::UserText => base.fg(if dark { Color::Cyan } else { Color::Blue }),
        Tone::BotHeader => line(Tone::BotText, theme).add_modifier(Modifier::BOLD),
        Tone::BotText => base.fg(if dark { Color::LightGreen } else { Color::Green }),
        Tone::Label => base
            .fg(if dark { Color::Yellow } else { Color::Magenta })
            .add_modifier(Modifier::BOLD),
        Tone::Value => base,
        Tone::Dim => base.fg(Color::DarkGray),
        Tone::System => base.fg(if dark { Color::Gray } else { Color::DarkGray }),
        Tone::Error => base.fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

pub fn busy(theme: Theme) -> Style {
    background(theme).fg(Color::Yellow)
}

pub fn idle(theme: Theme) -> Style {
    background(theme).fg(Color::Green)
}

pub fn map_outline(theme: Theme) -> Color {
    match theme {
        Theme::Dark => Color::DarkGray,
        Theme::Light => Color::Gray,
    }
}

pub fn map_marker(_theme: Theme) -> Color {
    Color::Red
}

pub fn map_user(theme: Theme) -> Color {
    match theme {
        Theme::Dark => Color::LightCyan,
        Theme::Light => Color::Blue,
    }
}
