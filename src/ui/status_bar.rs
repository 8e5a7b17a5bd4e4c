use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::styles;
use crate::app::{App, InputMode};

/// Compute the display width of a list of spans
fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(|s| s.content.chars().count()).sum()
}

/// Render the top bar:
///   cnav · provider · page.html · ● watching                     47%
pub fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let engine = &app.engine;
    let accent = styles::provider_accent(engine.provider().name());
    let panel_bg = Style::default().bg(styles::PANEL);

    let file_name = app
        .snapshot
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| app.snapshot.display().to_string());

    let mut left = vec![
        Span::styled(
            " cnav ",
            Style::default()
                .fg(styles::BG)
                .bg(accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} ", engine.provider().name()), Style::default().fg(accent)),
        Span::styled("· ", styles::dim_style()),
        Span::styled(file_name, Style::default().fg(styles::BRIGHT)),
    ];
    if app.watching {
        left.push(Span::styled("  ● watching", Style::default().fg(styles::GREEN)));
    }
    if engine.is_settling() {
        left.push(Span::styled("  ◌ updating", Style::default().fg(styles::YELLOW)));
    }

    let right = vec![Span::styled(
        format!("{:>3}% ", engine.progress()),
        Style::default().fg(styles::MUTED),
    )];

    let pad = (area.width as usize).saturating_sub(spans_width(&left) + spans_width(&right));
    let mut spans = left;
    spans.push(Span::raw(" ".repeat(pad)));
    spans.extend(right);

    f.render_widget(Paragraph::new(Line::from(spans)).style(panel_bg), area);
}

struct Hint {
    key: String,
    label: String,
}

impl Hint {
    fn new(key: &str, label: &str) -> Self {
        Self { key: key.to_string(), label: label.to_string() }
    }
    fn width(&self) -> usize {
        self.key.chars().count() + self.label.chars().count()
    }
}

fn build_hints(app: &App) -> Vec<Hint> {
    let mut hints = Vec::new();
    if app.engine.is_open() {
        hints.push(Hint::new("j/k", " focus "));
        hints.push(Hint::new("Enter", " jump "));
        hints.push(Hint::new("←/→", " view "));
        hints.push(Hint::new("/", " search "));
        hints.push(Hint::new("s", " star "));
        hints.push(Hint::new("y", " copy "));
        hints.push(Hint::new("Esc", " close "));
    } else {
        hints.push(Hint::new("j/k", " scroll "));
        hints.push(Hint::new("Tab", " outline "));
    }
    hints.push(Hint::new("g/G", " top/bottom "));
    hints.push(Hint::new("PgUp/PgDn", " page "));
    hints.push(Hint::new("q", " quit "));
    if !app.engine.search().is_empty() && app.input_mode == InputMode::Normal {
        hints.push(Hint::new("", &format!(" search: {} ", app.engine.search())));
    }
    hints
}

fn pack_hint_lines(hints: &[Hint], width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current_spans: Vec<Span<'static>> = Vec::new();
    let mut current_w: usize = 1; // leading space

    for hint in hints {
        let hw = hint.width();
        if current_w + hw > width && !current_spans.is_empty() {
            lines.push(Line::from(current_spans));
            current_spans = Vec::new();
            current_w = 1;
        }
        if current_spans.is_empty() {
            current_spans.push(Span::raw(" "));
        }
        if !hint.key.is_empty() {
            current_spans.push(Span::styled(hint.key.clone(), styles::key_hint_style()));
        }
        let label_style = if hint.key.is_empty() {
            Style::default().fg(styles::YELLOW)
        } else {
            Style::default().fg(styles::DIM)
        };
        current_spans.push(Span::styled(hint.label.clone(), label_style));
        current_w += hw;
    }
    if !current_spans.is_empty() {
        lines.push(Line::from(current_spans));
    }
    if lines.is_empty() {
        lines.push(Line::from(vec![Span::raw(" ")]));
    }
    lines
}

/// Calculate how many rows the bottom bar needs
pub fn bottom_bar_height(app: &App, width: u16) -> u16 {
    match app.input_mode {
        InputMode::Search => 1,
        InputMode::Normal => {
            let hints = build_hints(app);
            (pack_hint_lines(&hints, width as usize).len() as u16).max(1)
        }
    }
}

/// Render the bottom keybinding hints bar
pub fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let panel_bg = Style::default().bg(styles::PANEL);

    match app.input_mode {
        InputMode::Search => {
            let spans = vec![
                Span::styled(" /", styles::key_hint_style()),
                Span::styled(format!(" {}", app.engine.search()), Style::default().fg(styles::TEXT)),
                Span::styled("█", Style::default().fg(styles::BLUE)),
                Span::raw("  "),
                Span::styled("Enter", styles::key_hint_style()),
                Span::styled(" confirm  ", Style::default().fg(styles::DIM)),
                Span::styled("Esc", styles::key_hint_style()),
                Span::styled(" clear", Style::default().fg(styles::DIM)),
            ];
            f.render_widget(Paragraph::new(Line::from(spans)).style(panel_bg), area);
        }
        InputMode::Normal => {
            let lines = pack_hint_lines(&build_hints(app), area.width as usize);
            f.render_widget(Paragraph::new(lines).style(panel_bg), area);
        }
    }
}

pub fn render_watch_notification(f: &mut Frame, area: Rect, message: &str) {
    let notif_width = message.chars().count() as u16 + 4;
    let notif_x = area.x + area.width.saturating_sub(notif_width + 2);
    let notif_y = area.y + 2;

    let notif_area = Rect {
        x: notif_x,
        y: notif_y,
        width: notif_width.min(area.width),
        height: 1,
    };

    let notif = Paragraph::new(Line::from(vec![
        Span::styled(" ● ", Style::default().fg(styles::GREEN)),
        Span::styled(message, Style::default().fg(styles::TEXT)),
        Span::raw(" "),
    ]))
    .style(Style::default().bg(styles::PANEL).fg(styles::TEXT));

    f.render_widget(notif, notif_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_wrap_to_width() {
        let hints = vec![Hint::new("j/k", " focus "), Hint::new("Enter", " jump "), Hint::new("q", " quit ")];
        assert_eq!(pack_hint_lines(&hints, 80).len(), 1);
        assert_eq!(pack_hint_lines(&hints, 12).len(), 3);
        assert_eq!(pack_hint_lines(&[], 80).len(), 1);
    }
}
