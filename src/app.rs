//! Application state and event handling.
//!
//! This module defines the application state that sits between the
//! terminal (mouse and keys), the matrix controller, and the audio engine.
//! It is the input collaborator of the matrix: terminal positions are
//! filtered and converted to grid pixels here, never in the core.

use crate::audio::{export_to_wav, AudioEngine, MatrixController};
use crate::synth::{ToneMatrix, DEFAULT_SAMPLE_RATE, GRID_SIZE, STEP_SAMPLES};
use anyhow::{Context, Result};
use ratatui::layout::Rect;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Terminal columns per grid pixel. Terminal cells are about twice as tall
/// as they are wide, so two columns make a square pixel.
pub const COLUMNS_PER_PIXEL: u16 = 2;

/// How long a status message stays visible.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Runtime settings, usually taken from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Size of one light in grid pixels.
    pub light_size: u32,
    /// Where `e` writes the rendered pattern.
    pub export_path: PathBuf,
    /// Number of full loops written by an export.
    pub export_loops: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            light_size: 1,
            export_path: PathBuf::from("tonematrix.wav"),
            export_loops: 2,
        }
    }
}

impl Settings {
    /// Width of the whole grid in terminal columns.
    pub fn grid_width(&self) -> u16 {
        (GRID_SIZE as u32 * self.light_size) as u16 * COLUMNS_PER_PIXEL
    }

    /// Height of the whole grid in terminal rows.
    pub fn grid_height(&self) -> u16 {
        (GRID_SIZE as u32 * self.light_size) as u16
    }
}

/// Layout regions for mouse hit testing.
/// Stores the screen coordinates of each UI panel.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegions {
    /// The transport bar at the top.
    pub transport: Rect,
    /// The bordered panel holding the grid and row labels.
    pub matrix_panel: Rect,
    /// The lights themselves. Empty when the terminal is too small.
    pub grid: Rect,
    /// The key hint line at the bottom.
    pub footer: Rect,
}

impl LayoutRegions {
    /// Checks if a point is within a rectangle.
    fn contains(rect: Rect, x: u16, y: u16) -> bool {
        x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
    }

    /// Converts a terminal position into grid pixel coordinates.
    ///
    /// # Returns
    ///
    /// `Some((x, y))` relative to the top-left light, or `None` when the
    /// position is outside the grid
    pub fn grid_pixel_at(&self, x: u16, y: u16) -> Option<(u32, u32)> {
        if !Self::contains(self.grid, x, y) {
            return None;
        }
        let px = (x - self.grid.x) / COLUMNS_PER_PIXEL;
        let py = y - self.grid.y;
        Some((u32::from(px), u32::from(py)))
    }
}

/// Main application state.
pub struct App {
    /// Input side of the matrix.
    controller: MatrixController,
    /// Audio output; `None` when running without a device (tests).
    audio: Option<AudioEngine>,
    /// Settings the app was started with.
    pub settings: Settings,
    /// Current layout regions for mouse hit testing.
    pub layout: LayoutRegions,
    /// Temporary status message with timestamp.
    pub status_message: Option<(String, Instant)>,
    /// Whether the key help line is shown.
    pub show_help: bool,
    /// True between a press inside the grid and the matching release.
    stroke_active: bool,
}

impl App {
    /// Creates the application and starts audio playback.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The settings cannot produce a valid tone matrix
    /// - Audio output cannot be initialized
    pub fn new(settings: Settings) -> Result<Self> {
        let matrix = ToneMatrix::new(settings.light_size, settings.sample_rate)
            .context("Failed to build tone matrix")?;
        let (engine, controller) = AudioEngine::start(matrix)?;

        let mut app = Self::with_controller(controller, settings);
        app.audio = Some(engine);
        Ok(app)
    }

    /// Creates the application around an existing controller, without audio.
    pub fn with_controller(controller: MatrixController, settings: Settings) -> Self {
        Self {
            controller,
            audio: None,
            settings,
            layout: LayoutRegions::default(),
            status_message: None,
            show_help: false,
            stroke_active: false,
        }
    }

    /// Returns the matrix controller.
    pub fn controller(&self) -> &MatrixController {
        &self.controller
    }

    /// Updates the layout regions based on current terminal size.
    /// Called by the UI module during rendering.
    pub fn update_layout(&mut self, layout: LayoutRegions) {
        self.layout = layout;
    }

    /// Sets a status message to display temporarily.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Clears expired status messages.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    /// Per-frame housekeeping: retries edits the queue could not take.
    pub fn tick(&mut self) {
        self.controller.flush();
        self.clear_expired_status();
    }

    /// Handles a left-button press at a terminal position.
    ///
    /// # Returns
    ///
    /// true if the press landed on the grid
    pub fn handle_mouse_down(&mut self, x: u16, y: u16) -> bool {
        match self.layout.grid_pixel_at(x, y) {
            Some((px, py)) => {
                self.controller.on_press(px, py);
                self.stroke_active = true;
                true
            }
            None => false,
        }
    }

    /// Handles a left-button drag at a terminal position.
    ///
    /// Drags only paint while a stroke started on the grid is active, and
    /// positions outside the grid are ignored.
    pub fn handle_mouse_drag(&mut self, x: u16, y: u16) {
        if !self.stroke_active {
            return;
        }
        if let Some((px, py)) = self.layout.grid_pixel_at(x, y) {
            self.controller.on_drag(px, py);
        }
    }

    /// Handles a left-button release: ends the current stroke.
    pub fn handle_mouse_up(&mut self) {
        self.stroke_active = false;
    }

    /// Switches every light off.
    pub fn clear_grid(&mut self) {
        self.controller.clear();
        self.set_status("Grid cleared");
    }

    /// Toggles the key help line.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Renders the current pattern to the configured WAV file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn export_pattern(&mut self) -> Result<PathBuf> {
        let path = self.settings.export_path.clone();
        export_to_wav(
            self.controller.grid(),
            self.settings.sample_rate,
            self.settings.export_loops,
            &path,
            None::<fn(f32)>,
        )?;
        Ok(path)
    }

    /// Stops playback and waits for the audio thread to let go of the matrix.
    pub fn shutdown(self) {
        if let Some(engine) = self.audio {
            engine.shutdown();
        }
    }

    /// Tempo in steps per second.
    pub fn steps_per_second(&self) -> f64 {
        f64::from(self.controller.sample_rate()) / STEP_SAMPLES as f64
    }
}
