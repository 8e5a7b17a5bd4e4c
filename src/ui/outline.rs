use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

use super::styles;
use super::utils::{truncate, window_start};
use crate::app::{App, InputMode};
use crate::nav::{NavEntry, ViewLevel};
use crate::turn::Role;

const COPIED_LABEL: &str = "Copied to clipboard!";
const EMPTY_LABEL: &str = "No matches found";
const PROGRESS_WIDTH: usize = 20;

/// One rendered row of the outline, in focus order.
struct Row<'a> {
    id: &'a str,
    depth: u8,
    text: &'a str,
    entry: &'a NavEntry,
}

fn rows(entries: &[NavEntry]) -> Vec<Row<'_>> {
    let mut out = Vec::new();
    for entry in entries {
        out.push(Row { id: &entry.id, depth: 0, text: &entry.label, entry });
        for heading in &entry.headings {
            out.push(Row { id: &heading.id, depth: heading.level, text: &heading.text, entry });
        }
    }
    out
}

/// Render the outline panel (right side)
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let engine = &app.engine;
    let accent = styles::provider_accent(engine.provider().name());
    let title = format!(
        " OUTLINE · {} ({}/{}) ",
        engine.provider().name(),
        engine.index().entries().len(),
        engine.index().turn_count()
    );
    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(accent).add_modifier(Modifier::BOLD)))
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(styles::BORDER))
        .padding(Padding::horizontal(1))
        .style(styles::surface_style());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // progress
            Constraint::Length(1), // view tabs
            Constraint::Length(1), // search line
            Constraint::Min(1),    // items
        ])
        .split(inner);

    render_progress(f, parts[0], engine.progress(), accent);
    render_view_tabs(f, parts[1], engine.view(), accent);
    render_search(f, parts[2], engine.search(), app.input_mode == InputMode::Search);
    render_items(f, parts[3], app);
}

fn render_progress(f: &mut Frame, area: Rect, progress: u8, accent: ratatui::style::Color) {
    let filled = usize::from(progress) * PROGRESS_WIDTH / 100;
    let line = Line::from(vec![
        Span::styled("█".repeat(filled), Style::default().fg(accent)),
        Span::styled("░".repeat(PROGRESS_WIDTH - filled), styles::dim_style()),
        Span::styled(format!(" {progress:>3}%"), Style::default().fg(styles::MUTED)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_view_tabs(f: &mut Frame, area: Rect, current: ViewLevel, accent: ratatui::style::Color) {
    let mut spans = Vec::new();
    for view in ViewLevel::ALL {
        let style = if view == current {
            Style::default()
                .fg(styles::BG)
                .bg(accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(styles::MUTED)
        };
        spans.push(Span::styled(format!(" {} ", view.label()), style));
        spans.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_search(f: &mut Frame, area: Rect, term: &str, editing: bool) {
    let line = if term.is_empty() && !editing {
        Line::from(Span::styled("/ search", styles::dim_style()))
    } else {
        let cursor = if editing { "▏" } else { "" };
        Line::from(vec![
            Span::styled("/ ", styles::key_hint_style()),
            Span::styled(format!("{term}{cursor}"), Style::default().fg(styles::BRIGHT)),
        ])
    };
    f.render_widget(Paragraph::new(line), area);
}

fn render_items(f: &mut Frame, area: Rect, app: &App) {
    let engine = &app.engine;
    let index = engine.index();
    if index.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(EMPTY_LABEL, styles::dim_style())));
        f.render_widget(empty, area);
        return;
    }

    let rows = rows(index.entries());
    let height = area.height as usize;
    let width = area.width as usize;
    // Keep the focused item in view, else the active one.
    let anchor = engine
        .focused_index()
        .or_else(|| engine.active().and_then(|id| index.position(id)));
    let start = window_start(rows.len(), height, anchor);
    let end = (start + height).min(rows.len());

    let items: Vec<ListItem> = rows[start..end]
        .iter()
        .enumerate()
        .map(|(offset, row)| {
            let position = start + offset;
            let focused = engine.focused_index() == Some(position);
            let active = engine.active() == Some(row.id);
            ListItem::new(render_row(row, active, engine.copied() == Some(row.id), width))
                .style(if focused { styles::selected_style() } else { Style::default() })
        })
        .collect();

    f.render_widget(List::new(items), area);
}

fn render_row(row: &Row<'_>, active: bool, copied: bool, width: usize) -> Line<'static> {
    let marker = if active { "▌" } else { " " };
    let mut spans = vec![Span::styled(marker.to_string(), Style::default().fg(styles::BLUE))];

    if row.depth == 0 {
        let (glyph, glyph_style) = match row.entry.role {
            Role::User => ("› ", Style::default().fg(styles::CYAN)),
            Role::Assistant => ("◆ ", Style::default().fg(styles::PURPLE)),
        };
        spans.push(Span::styled(glyph, glyph_style));
        if row.entry.starred {
            spans.push(Span::styled("★ ", styles::star_style()));
        }
        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        if copied {
            spans.push(Span::styled(COPIED_LABEL, styles::copied_style()));
        } else {
            let mut style = Style::default().fg(styles::TEXT);
            if row.entry.snippet {
                style = style.add_modifier(Modifier::ITALIC);
            }
            if active {
                style = style.fg(styles::BRIGHT).add_modifier(Modifier::BOLD);
            }
            spans.push(Span::styled(truncate(row.text, width.saturating_sub(used)), style));
        }
    } else {
        let indent = "  ".repeat(usize::from(row.depth.saturating_sub(1)));
        spans.push(Span::styled(format!("  {indent}└ "), styles::dim_style()));
        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let style = if active {
            Style::default().fg(styles::BRIGHT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(styles::MUTED)
        };
        spans.push(Span::styled(truncate(row.text, width.saturating_sub(used)), style));
    }
    Line::from(spans)
}
