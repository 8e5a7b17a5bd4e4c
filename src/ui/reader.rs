use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Padding, Paragraph},
    Frame,
};

use super::styles;
use crate::app::App;
use crate::dom::{LayoutLine, LineKind};

/// Render the reader pane: the lines visible through the scroll source.
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let engine = &app.engine;
    let block = Block::default()
        .padding(Padding::horizontal(1))
        .style(styles::default_style());

    if !engine.is_started() {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "Waiting for page content…",
            styles::dim_style(),
        )))
        .block(block);
        f.render_widget(waiting, area);
        return;
    }

    let lines: Vec<Line> = engine.reader_lines().iter().map(render_line).collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_line(line: &LayoutLine) -> Line<'_> {
    let style = match line.kind {
        LineKind::Heading(level) => styles::heading_style(level),
        LineKind::Code => styles::code_style(),
        LineKind::Text => ratatui::style::Style::default().fg(styles::TEXT),
    };
    Line::from(Span::styled(line.text.as_str(), style))
}
