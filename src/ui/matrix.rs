//! Light grid rendering.
//!
//! Each light is drawn as a block of `light_size` pixels, two terminal
//! columns per pixel. The rightmost column of every light is left dark so
//! neighbouring lights stay distinguishable. The column the sequencer fired
//! most recently is tinted.

use crate::app::{App, COLUMNS_PER_PIXEL};
use crate::synth::{note_name_for_row, GRID_SIZE};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Width of the note labels left of the grid.
pub const LABEL_WIDTH: u16 = 4;

const LIGHT_OFF: Color = Color::Rgb(64, 64, 64);
const LIGHT_ON: Color = Color::Rgb(192, 192, 192);
const PLAYHEAD_OFF: Color = Color::Rgb(70, 70, 110);
const PLAYHEAD_ON: Color = Color::Rgb(255, 235, 170);

/// Picks the colour of a light.
fn light_color(on: bool, under_playhead: bool) -> Color {
    match (on, under_playhead) {
        (false, false) => LIGHT_OFF,
        (true, false) => LIGHT_ON,
        (false, true) => PLAYHEAD_OFF,
        (true, true) => PLAYHEAD_ON,
    }
}

/// Renders the matrix panel.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `panel` - The bordered panel area
/// * `grid` - The light area inside the panel; empty if the terminal is too small
/// * `app` - Application state
pub fn render_matrix(frame: &mut Frame, panel: Rect, grid: Rect, app: &App) {
    let block = Block::default()
        .title(" Tone Matrix ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    if grid.width == 0 || grid.height == 0 {
        let warning = Paragraph::new(Line::from(Span::styled(
            format!(
                "Terminal too small: need {}x{}",
                app.settings.grid_width() + LABEL_WIDTH + 2,
                app.settings.grid_height() + 5
            ),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        )));
        frame.render_widget(warning, inner);
        return;
    }

    let light_size = app.settings.light_size as usize;
    let light_width = light_size * COLUMNS_PER_PIXEL as usize;
    let cells = app.controller().grid();
    let playhead = app.controller().playhead();
    let label_style = Style::default().fg(Color::DarkGray);

    let mut lines: Vec<Line> = Vec::with_capacity(GRID_SIZE * light_size);
    for (row, lights) in cells.rows().iter().enumerate() {
        for sub_row in 0..light_size {
            let label = if sub_row == 0 {
                format!("{:<width$}", note_name_for_row(row), width = LABEL_WIDTH as usize)
            } else {
                " ".repeat(LABEL_WIDTH as usize)
            };

            let mut spans = Vec::with_capacity(GRID_SIZE * 2 + 1);
            spans.push(Span::styled(label, label_style));

            for (col, on) in lights.iter().enumerate() {
                let color = light_color(*on, playhead == Some(col));
                spans.push(Span::styled(
                    " ".repeat(light_width - 1),
                    Style::default().bg(color),
                ));
                spans.push(Span::raw(" "));
            }

            lines.push(Line::from(spans));
        }
    }

    let area = Rect {
        x: inner.x,
        y: grid.y,
        width: grid.width + LABEL_WIDTH,
        height: grid.height,
    };
    frame.render_widget(Paragraph::new(lines), area);
}
