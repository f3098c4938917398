//! Audio output for the tone matrix.
//!
//! This module turns the synthesis core into sound:
//! - Real-time playback through rodio, with grid edits handed to the
//!   audio thread through a lock-free queue
//! - Offline WAV export of the current pattern

pub mod engine;
pub mod export;

pub use engine::{split, AudioEngine, GridCommand, MatrixController, MatrixSource, PlaybackState};
pub use export::export_to_wav;
