//! tonematrix - A sixteen-step tone matrix of plucked strings.
//!
//! This library provides the synthesis core, the real-time audio plumbing,
//! and the terminal front end used by the `tonematrix` binary.

pub mod app;
pub mod audio;
pub mod synth;
pub mod ui;

// Re-export commonly used types
pub use app::{App, Settings};
pub use audio::{engine::AudioEngine, export::export_to_wav, split, MatrixController, MatrixSource};
pub use synth::{
    CellEdit, Grid, Sample, StringInstrument, SynthError, ToneMatrix, GRID_SIZE, STEP_SAMPLES,
};
