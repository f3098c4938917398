//! Synthesis core: sample type, plucked strings, and the step-sequenced matrix.
//!
//! Nothing in this module touches an audio device, a terminal, or a thread.
//! It produces samples on demand and exposes the grid state for drawing.

mod grid;
mod matrix;
mod sample;
mod scale;
mod string;

pub use grid::{CellEdit, Grid, Painter};
pub use matrix::{ToneMatrix, GRID_SIZE, STEP_SAMPLES};
pub use sample::{Sample, SAMPLE_TOLERANCE};
pub use scale::{frequencies, frequency_for_row, note_name_for_row, BASE_FREQUENCY, SCALE_STEPS};
pub use string::{StringInstrument, DECAY_FACTOR, PLUCK_AMPLITUDE};

use thiserror::Error;

/// Standard sample rate used when none is configured.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Errors raised while building instruments or the matrix.
///
/// All of them are construction-time failures; once built, nothing in the
/// synthesis path can fail.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SynthError {
    /// The requested frequency is zero, negative, or not a number.
    #[error("frequency must be positive, got {0} Hz")]
    InvalidFrequency(f64),

    /// The frequency is too high for the sample rate to leave two delay slots.
    #[error(
        "{frequency} Hz at {sample_rate} Hz sample rate gives a delay line of {length} samples (need at least 2)"
    )]
    DelayLineTooSmall {
        frequency: f64,
        sample_rate: u32,
        length: usize,
    },

    /// A light must be at least one pixel wide.
    #[error("light size must be at least 1 pixel")]
    InvalidLightSize,
}
