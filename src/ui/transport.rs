//! Transport bar rendering.
//!
//! Displays the playback state, the current step, the tempo, and either a
//! status message or the number of lit cells.

use crate::app::App;
use crate::audio::PlaybackState;
use crate::synth::GRID_SIZE;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Formats the playhead as "step/total", or dashes before the first step.
fn step_string(playhead: Option<usize>) -> String {
    match playhead {
        Some(col) => format!("{:02}/{}", col + 1, GRID_SIZE),
        None => format!("--/{}", GRID_SIZE),
    }
}

/// Renders the transport bar at the top of the screen.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `area` - The area to render in
/// * `app` - Application state
pub fn render_transport(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Transport ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(12), // Playback state
            Constraint::Length(14), // Step
            Constraint::Length(20), // Tempo
            Constraint::Min(20),    // Status
        ])
        .split(inner);

    let controller = app.controller();

    let play_status = match controller.playback_state() {
        PlaybackState::Playing => Span::styled(
            " [>] PLAY ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        PlaybackState::Stopped => Span::styled(
            " [.] STOP ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };
    frame.render_widget(Paragraph::new(Line::from(play_status)), chunks[0]);

    let step_widget = Paragraph::new(Line::from(vec![
        Span::styled("Step: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            step_string(controller.playhead()),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    frame.render_widget(step_widget, chunks[1]);

    let tempo_widget = Paragraph::new(Line::from(vec![
        Span::styled("Tempo: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{:.2} st/s", app.steps_per_second()),
            Style::default().fg(Color::White),
        ),
    ]));
    frame.render_widget(tempo_widget, chunks[2]);

    let status_line = if let Some((msg, _)) = &app.status_message {
        Line::from(Span::styled(
            msg.as_str(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ))
    } else {
        let pending = controller.pending();
        let mut spans = vec![Span::styled(
            format!("{} lit", controller.grid().active_count()),
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        )];
        if pending > 0 {
            spans.push(Span::styled(
                format!("  ({} queued)", pending),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    };
    frame.render_widget(Paragraph::new(status_line), chunks[3]);
}
