//! Terminal user interface components.
//!
//! This module draws the tone matrix: a transport bar on top, the light grid
//! with note labels in the middle, and a key hint line at the bottom. It only
//! reads state; all mutation goes through [`App`].

mod matrix;
mod transport;

use crate::app::{App, LayoutRegions};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub use matrix::{render_matrix, LABEL_WIDTH};
pub use transport::render_transport;

/// Calculates the layout regions for the given terminal size.
///
/// The matrix panel is centered in the content area. If the terminal is too
/// small to hold every light, the grid region is left empty so mouse hit
/// testing ignores it.
fn calculate_layout(size: Rect, app: &App) -> LayoutRegions {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Transport
            Constraint::Min(4),    // Matrix
            Constraint::Length(1), // Key hints
        ])
        .split(size);

    let content = main_chunks[1];
    let grid_width = app.settings.grid_width();
    let grid_height = app.settings.grid_height();

    // Borders on every side plus the note labels on the left.
    let panel_width = grid_width + LABEL_WIDTH + 2;
    let panel_height = grid_height + 2;

    let (matrix_panel, grid) = if panel_width <= content.width && panel_height <= content.height {
        let panel = Rect {
            x: content.x + (content.width - panel_width) / 2,
            y: content.y + (content.height - panel_height) / 2,
            width: panel_width,
            height: panel_height,
        };
        let grid = Rect {
            x: panel.x + 1 + LABEL_WIDTH,
            y: panel.y + 1,
            width: grid_width,
            height: grid_height,
        };
        (panel, grid)
    } else {
        (content, Rect::default())
    };

    LayoutRegions {
        transport: main_chunks[0],
        matrix_panel,
        grid,
        footer: main_chunks[2],
    }
}

/// Renders the complete UI layout and updates layout regions.
pub fn render(frame: &mut Frame, app: &mut App) {
    let layout = calculate_layout(frame.area(), app);

    // Update app's layout regions for mouse hit testing
    app.update_layout(layout.clone());

    render_transport(frame, layout.transport, app);
    render_matrix(frame, layout.matrix_panel, layout.grid, app);
    render_footer(frame, layout.footer, app);
}

/// Renders the key hint line.
fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(Color::Yellow);
    let desc_style = Style::default().fg(Color::DarkGray);

    let line = if app.show_help {
        Line::from(vec![
            Span::styled("[Click]", key_style),
            Span::styled(" Toggle  ", desc_style),
            Span::styled("[Drag]", key_style),
            Span::styled(" Paint  ", desc_style),
            Span::styled("[c]", key_style),
            Span::styled(" Clear  ", desc_style),
            Span::styled("[e]", key_style),
            Span::styled(" Export WAV  ", desc_style),
            Span::styled("[?]", key_style),
            Span::styled(" Hide help  ", desc_style),
            Span::styled("[q/Esc]", key_style),
            Span::styled(" Quit", desc_style),
        ])
    } else {
        Line::from(Span::styled(
            "Press ? for help",
            desc_style.add_modifier(Modifier::ITALIC),
        ))
    };

    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Settings;
    use crate::audio::split;
    use crate::synth::ToneMatrix;

    fn app(light_size: u32) -> App {
        let (controller, _source) = split(ToneMatrix::new(light_size, 44100).unwrap(), 8);
        App::with_controller(
            controller,
            Settings {
                light_size,
                ..Settings::default()
            },
        )
    }

    #[test]
    fn test_layout_centers_grid() {
        let app = app(1);
        let layout = calculate_layout(Rect::new(0, 0, 80, 24), &app);

        assert_eq!(layout.transport, Rect::new(0, 0, 80, 3));
        assert_eq!(layout.footer, Rect::new(0, 23, 80, 1));
        assert_eq!(layout.grid.width, 32);
        assert_eq!(layout.grid.height, 16);
        assert_eq!(layout.grid.x, layout.matrix_panel.x + 1 + LABEL_WIDTH);
        assert_eq!(layout.grid.y, layout.matrix_panel.y + 1);
    }

    #[test]
    fn test_layout_too_small_disables_grid() {
        let app = app(2);
        let layout = calculate_layout(Rect::new(0, 0, 80, 24), &app);
        assert_eq!(layout.grid, Rect::default());
        assert_eq!(layout.grid_pixel_at(40, 12), None);
    }
}
