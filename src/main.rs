//! tonematrix - A sixteen-step tone matrix in the terminal.
//!
//! Click lights on a 16x16 grid to switch them on; each row plays a plucked
//! string tuned to a pentatonic scale, and the sequencer sweeps across the
//! columns in a loop.
//!
//! # Usage
//!
//! ```bash
//! cargo run                              # 44.1 kHz, one pixel per light
//! cargo run -- --light-size 2            # bigger lights
//! cargo run -- --export-path loop.wav    # where `e` writes the pattern
//! ```
//!
//! Press `?` for help with keyboard shortcuts.

mod app;
mod audio;
mod synth;
mod ui;

use app::{App, Settings};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line options for the application.
#[derive(Parser, Debug)]
#[command(name = "tonematrix")]
#[command(about = "A sixteen-step tone matrix of plucked strings", long_about = None)]
struct Cli {
    /// Output sample rate in Hz
    #[arg(short, long, default_value = "44100",
          value_parser = clap::value_parser!(u32).range(8000..=192000))]
    sample_rate: u32,

    /// Size of one light in grid pixels
    #[arg(short, long, default_value = "1",
          value_parser = clap::value_parser!(u32).range(1..=4))]
    light_size: u32,

    /// WAV file written by the export key
    #[arg(short, long, default_value = "tonematrix.wav")]
    export_path: PathBuf,

    /// Number of full loops written by an export
    #[arg(long, default_value = "2",
          value_parser = clap::value_parser!(u32).range(1..))]
    export_loops: u32,
}

impl From<Cli> for Settings {
    fn from(cli: Cli) -> Self {
        Self {
            sample_rate: cli.sample_rate,
            light_size: cli.light_size,
            export_path: cli.export_path,
            export_loops: cli.export_loops,
        }
    }
}

fn main() -> Result<()> {
    // Parse CLI options first (before any terminal setup)
    let settings = Settings::from(Cli::parse());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Audio comes up before the terminal so a missing device is reported plainly.
    let mut app = App::new(settings).context("Failed to initialize application")?;

    let mut terminal = setup_terminal().context("Failed to setup terminal")?;

    let result = run_app(&mut terminal, &mut app);

    restore_terminal(&mut terminal).context("Failed to restore terminal")?;
    app.shutdown();

    result
}

/// Sets up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.tick();

        terminal.draw(|frame| ui::render(frame, app))?;

        // Short timeout keeps the playhead moving on screen
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events, not release
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if handle_key(app, key.code, key.modifiers) {
                        break;
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Handles mouse events. Only the left button paints.
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.handle_mouse_down(x, y);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_mouse_drag(x, y);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.handle_mouse_up();
        }
        _ => {}
    }
}

/// Handles a key press event.
///
/// # Returns
///
/// `true` if the application should quit
fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('c') => app.clear_grid(),
        KeyCode::Char('e') => export_pattern(app),
        KeyCode::Char('?') => app.toggle_help(),
        _ => {}
    }
    false
}

/// Exports the current pattern and reports the outcome in the status bar.
fn export_pattern(app: &mut App) {
    match app.export_pattern() {
        Ok(path) => {
            app.set_status(format!("Exported to {}", path.display()));
        }
        Err(e) => {
            app.set_status(format!("Export failed: {}", e));
            tracing::error!("Export failed: {:?}", e);
        }
    }
}
