mod outline;
mod reader;
mod status_bar;
mod styles;
mod utils;

use crate::app::App;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

/// Narrowest reader pane kept when the outline is open.
const MIN_READER_WIDTH: u16 = 20;

struct Areas {
    top: Rect,
    reader: Rect,
    outline: Option<Rect>,
    bottom: Rect,
}

fn areas(area: Rect, app: &App) -> Areas {
    let bottom_height = status_bar::bottom_bar_height(app, area.width);
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // top bar
            Constraint::Min(1),                // main content
            Constraint::Length(bottom_height), // bottom bar (dynamic rows)
        ])
        .split(area);

    let panel_width = app.config.panel.width;
    let (reader, outline) = if app.engine.is_open() && outer[1].width >= panel_width + MIN_READER_WIDTH {
        let main_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(MIN_READER_WIDTH), Constraint::Length(panel_width)])
            .split(outer[1]);
        (main_area[0], Some(main_area[1]))
    } else if app.engine.is_open() {
        // Narrow terminal: the outline takes the whole main area
        (outer[1], Some(outer[1]))
    } else {
        (outer[1], None)
    };

    Areas { top: outer[0], reader, outline, bottom: outer[2] }
}

/// Size of the reader text area (columns, rows) for a terminal of `area`.
pub fn reader_size(area: Rect, app: &App) -> (u16, u16) {
    let reader = areas(area, app).reader;
    // One column of padding on each side.
    (reader.width.saturating_sub(2), reader.height)
}

/// Render the entire UI
pub fn draw(f: &mut Frame, app: &App) {
    let areas = areas(f.area(), app);

    status_bar::render_top_bar(f, areas.top, app);

    match areas.outline {
        Some(outline) if outline == areas.reader => outline::render(f, outline, app),
        Some(outline) => {
            reader::render(f, areas.reader, app);
            outline::render(f, outline, app);
        }
        None => reader::render(f, areas.reader, app),
    }

    status_bar::render_bottom_bar(f, areas.bottom, app);

    if let Some(ref msg) = app.watch_message {
        status_bar::render_watch_notification(f, f.area(), msg);
    }
}
