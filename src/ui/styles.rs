use ratatui::style::{Color, Modifier, Style};

// ── Background colors ──
pub const BG: Color = Color::Rgb(12, 12, 12);
pub const SURFACE: Color = Color::Rgb(20, 20, 20);
pub const PANEL: Color = Color::Rgb(26, 26, 26);
pub const BORDER: Color = Color::Rgb(42, 42, 42);

// ── Text colors ──
pub const TEXT: Color = Color::Rgb(200, 200, 200);
pub const DIM: Color = Color::Rgb(102, 102, 102);
pub const MUTED: Color = Color::Rgb(136, 136, 136);
pub const BRIGHT: Color = Color::Rgb(232, 232, 232);

// ── Accent colors ──
pub const BLUE: Color = Color::Rgb(96, 165, 250);
pub const CYAN: Color = Color::Rgb(34, 211, 238);
pub const GREEN: Color = Color::Rgb(74, 222, 128);
pub const YELLOW: Color = Color::Rgb(250, 204, 21);
pub const PURPLE: Color = Color::Rgb(167, 139, 250);
pub const ORANGE: Color = Color::Rgb(217, 119, 87);

// ── Composed styles ──

pub fn default_style() -> Style {
    Style::default().fg(TEXT).bg(BG)
}

pub fn surface_style() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub fn dim_style() -> Style {
    Style::default().fg(DIM)
}

pub fn selected_style() -> Style {
    Style::default().fg(BLUE).bg(Color::Rgb(26, 42, 58))
}

pub fn key_hint_style() -> Style {
    Style::default().fg(MUTED).add_modifier(Modifier::BOLD)
}

pub fn heading_style(level: u8) -> Style {
    let style = Style::default().fg(BRIGHT).add_modifier(Modifier::BOLD);
    if level <= 2 {
        style.add_modifier(Modifier::UNDERLINED)
    } else {
        style
    }
}

pub fn code_style() -> Style {
    Style::default().fg(CYAN).bg(SURFACE)
}

pub fn star_style() -> Style {
    Style::default().fg(YELLOW)
}

pub fn copied_style() -> Style {
    Style::default().fg(GREEN).add_modifier(Modifier::BOLD)
}

/// Title accent per chat site.
pub fn provider_accent(provider: &str) -> Color {
    match provider {
        "claude" => ORANGE,
        "chatgpt" => GREEN,
        "gemini" => BLUE,
        _ => PURPLE,
    }
}
