//! Pitch table for the sixteen matrix rows.
//!
//! The lowest row is middle C. The rows above it climb a major pentatonic
//! scale (C D E G A) across three octaves. One half step multiplies the
//! frequency by the twelfth root of two, so a note `n` half steps above the
//! base sounds at `base * 2^(n / 12)`.

use super::matrix::GRID_SIZE;

/// Middle C: three half steps above A3 (220 Hz).
pub const BASE_FREQUENCY: f64 = 261.625_565_300_598_6;

/// Half steps above [`BASE_FREQUENCY`] for each row. Row 0 is the highest pitch.
pub const SCALE_STEPS: [i32; GRID_SIZE] = [36, 33, 31, 28, 26, 24, 21, 19, 16, 14, 12, 9, 7, 4, 2, 0];

/// MIDI note number of [`BASE_FREQUENCY`].
const BASE_MIDI_NOTE: i32 = 60;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Returns the frequency in Hz of the voice on `row`.
///
/// # Panics
///
/// Panics if `row >= GRID_SIZE`.
pub fn frequency_for_row(row: usize) -> f64 {
    BASE_FREQUENCY * 2f64.powf(f64::from(SCALE_STEPS[row]) / 12.0)
}

/// Returns the frequencies of all rows, top to bottom.
pub fn frequencies() -> [f64; GRID_SIZE] {
    std::array::from_fn(frequency_for_row)
}

/// Returns a display name such as "C4" or "A6" for the voice on `row`.
///
/// # Panics
///
/// Panics if `row >= GRID_SIZE`.
pub fn note_name_for_row(row: usize) -> String {
    let note = BASE_MIDI_NOTE + SCALE_STEPS[row];
    let octave = note / 12 - 1; // MIDI octave convention
    format!("{}{}", NOTE_NAMES[(note % 12) as usize], octave)
}
