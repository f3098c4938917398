//! The tone matrix: a 16-step sequencer over sixteen plucked strings.
//!
//! Every [`STEP_SAMPLES`] samples the sequencer fires one column: each voice
//! whose light is on in that column is plucked, and the column advances.
//! All voices are then mixed into a single output sample, plucked or not.

use super::grid::{CellEdit, Grid, Painter};
use super::sample::Sample;
use super::scale::frequency_for_row;
use super::string::StringInstrument;
use super::SynthError;

/// Number of rows (voices) and columns (steps) in the matrix.
pub const GRID_SIZE: usize = 16;

/// Samples between two sequencer steps. Fixes the tempo: at 44.1 kHz one
/// step lasts about 186 ms and a full loop about 2.97 s.
pub const STEP_SAMPLES: u64 = 8192;

/// A step sequencer driving one string per row.
///
/// The first call to [`ToneMatrix::next_sample`] already fires column 0.
#[derive(Debug, Clone)]
pub struct ToneMatrix {
    /// Light states, row = voice, column = step.
    grid: Grid,
    /// One voice per row, tuned once at construction. Length is `GRID_SIZE`.
    instruments: Vec<StringInstrument>,
    /// Pointer stroke state for press/drag.
    painter: Painter,
    /// Samples produced so far.
    samples_elapsed: u64,
    /// Column fired by the next step, always in `0..GRID_SIZE`.
    active_column: usize,
    sample_rate: u32,
}

impl ToneMatrix {
    /// Creates a silent matrix with every light off.
    ///
    /// # Arguments
    ///
    /// * `light_size` - Size in pixels of one light, used to map pointer positions to cells
    /// * `sample_rate` - Output sample rate in Hz, fixed for the matrix's lifetime
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `light_size` is zero
    /// - The sample rate is too low for the highest voice to fit a delay line
    pub fn new(light_size: u32, sample_rate: u32) -> Result<Self, SynthError> {
        let painter = Painter::new(light_size)?;

        let instruments = (0..GRID_SIZE)
            .map(|row| StringInstrument::new(frequency_for_row(row), sample_rate))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            sample_rate,
            light_size,
            shortest_line = instruments[0].len(),
            longest_line = instruments[GRID_SIZE - 1].len(),
            "tone matrix voices tuned"
        );

        Ok(Self {
            grid: Grid::new(),
            instruments,
            painter,
            samples_elapsed: 0,
            active_column: 0,
            sample_rate,
        })
    }

    /// Reacts to a pointer press at pixel (`x`, `y`): toggles the light there
    /// and starts a paint stroke with its new state.
    pub fn on_press(&mut self, x: u32, y: u32) -> CellEdit {
        self.painter.press(&mut self.grid, x, y)
    }

    /// Reacts to a pointer drag at pixel (`x`, `y`): sets the light there to
    /// the state the last press produced.
    pub fn on_drag(&mut self, x: u32, y: u32) -> CellEdit {
        self.painter.drag(&mut self.grid, x, y)
    }

    /// Applies an absolute cell assignment.
    pub fn set_cell(&mut self, edit: CellEdit) {
        self.grid.apply(edit);
    }

    /// Switches every light off. Strings already ringing keep ringing.
    pub fn clear(&mut self) {
        self.grid.clear();
    }

    /// Returns the light states for drawing.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Returns a copy of the pointer-stroke state, for front ends that keep
    /// their own mirror of the grid.
    pub fn painter(&self) -> Painter {
        self.painter
    }

    /// Returns the voice on `row`.
    pub fn instrument(&self, row: usize) -> &StringInstrument {
        &self.instruments[row]
    }

    /// Returns the column the next step will fire.
    pub fn active_column(&self) -> usize {
        self.active_column
    }

    /// Returns the column fired most recently (15 before the first step).
    pub fn current_step(&self) -> usize {
        (self.active_column + GRID_SIZE - 1) % GRID_SIZE
    }

    /// Returns true if the next call to `next_sample` fires a step.
    pub fn at_step_boundary(&self) -> bool {
        self.samples_elapsed % STEP_SAMPLES == 0
    }

    /// Returns the number of samples produced so far.
    pub fn samples_elapsed(&self) -> u64 {
        self.samples_elapsed
    }

    /// Returns the sample rate the voices were tuned for.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Produces the next mixed sample.
    ///
    /// On a step boundary the voices lit in the active column are plucked
    /// before mixing, so the boundary sample already carries the new notes.
    /// Real-time safe: no allocation, no locking.
    pub fn next_sample(&mut self) -> Sample {
        if self.at_step_boundary() {
            self.fire_step();
        }
        self.samples_elapsed += 1;

        self.instruments
            .iter_mut()
            .map(StringInstrument::next_sample)
            .sum()
    }

    /// Fills `buffer` with consecutive samples.
    pub fn fill(&mut self, buffer: &mut [f32]) {
        for slot in buffer.iter_mut() {
            *slot = self.next_sample().to_f32();
        }
    }

    fn fire_step(&mut self) {
        let col = self.active_column;
        for (row, instrument) in self.instruments.iter_mut().enumerate() {
            if self.grid.is_on(row, col) {
                instrument.pluck();
            }
        }
        self.active_column = (col + 1) % GRID_SIZE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{PLUCK_AMPLITUDE, SCALE_STEPS};

    const SAMPLE_RATE: u32 = 44100;

    fn matrix() -> ToneMatrix {
        ToneMatrix::new(10, SAMPLE_RATE).unwrap()
    }

    #[test]
    fn test_construction() {
        let matrix = matrix();
        assert_eq!(matrix.active_column(), 0);
        assert_eq!(matrix.samples_elapsed(), 0);
        assert_eq!(matrix.grid().active_count(), 0);
        assert!(matrix.at_step_boundary());

        // Row 0 is the highest voice, so it has the shortest delay line.
        assert_eq!(matrix.instrument(0).len(), 21);
        assert_eq!(matrix.instrument(GRID_SIZE - 1).len(), 168);
        for row in 0..GRID_SIZE {
            let expected = frequency_for_row(row);
            assert_eq!(matrix.instrument(row).frequency(), expected);
        }
        assert_eq!(SCALE_STEPS.len(), GRID_SIZE);
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            ToneMatrix::new(0, SAMPLE_RATE).unwrap_err(),
            SynthError::InvalidLightSize
        );
        // The top voice (~2093 Hz) needs at least ~4.2 kHz.
        assert!(matches!(
            ToneMatrix::new(10, 4000),
            Err(SynthError::DelayLineTooSmall { .. })
        ));
    }

    #[test]
    fn test_empty_matrix_is_silent_and_steps() {
        let mut matrix = matrix();

        for _ in 0..STEP_SAMPLES {
            assert_eq!(matrix.next_sample(), Sample::ZERO);
        }
        // Column 0 fired on the first sample.
        assert_eq!(matrix.active_column(), 1);
        assert!(matrix.at_step_boundary());

        matrix.next_sample();
        assert_eq!(matrix.active_column(), 2);
    }

    #[test]
    fn test_column_wraps_after_full_loop() {
        let mut matrix = matrix();
        let mut seen = Vec::new();

        for _ in 0..STEP_SAMPLES * GRID_SIZE as u64 {
            if matrix.at_step_boundary() {
                seen.push(matrix.active_column());
            }
            assert_eq!(matrix.next_sample(), Sample::ZERO);
        }

        assert_eq!(seen, (0..GRID_SIZE).collect::<Vec<_>>());
        assert_eq!(matrix.active_column(), 0);
        assert_eq!(matrix.samples_elapsed(), 131072);
    }

    #[test]
    fn test_press_and_drag() {
        let mut matrix = matrix();

        matrix.on_press(5, 5);
        assert!(matrix.grid().is_on(0, 0));
        matrix.on_press(5, 5);
        assert!(!matrix.grid().is_on(0, 0));
        matrix.on_press(5, 5);
        assert!(matrix.grid().is_on(0, 0));

        // Drag paints "on" regardless of what was there.
        matrix.set_cell(CellEdit { row: 0, col: 2, on: true });
        matrix.on_drag(15, 5);
        matrix.on_drag(25, 5);
        assert!(matrix.grid().is_on(0, 1));
        assert!(matrix.grid().is_on(0, 2));

        // A press that turns a light off makes the stroke erase.
        matrix.on_press(5, 5);
        matrix.on_drag(25, 5);
        assert!(!matrix.grid().is_on(0, 2));
        assert!(matrix.grid().is_on(0, 1));
    }

    #[test]
    fn test_single_light_plucks_once() {
        let mut matrix = matrix();
        matrix.set_cell(CellEdit { row: 0, col: 0, on: true });

        // A reference string plucked once must track the mix exactly,
        // since every other voice stays silent.
        let mut reference = StringInstrument::new(frequency_for_row(0), SAMPLE_RATE).unwrap();
        reference.pluck();

        let first = matrix.next_sample();
        assert_eq!(first, Sample::new(PLUCK_AMPLITUDE));
        assert_eq!(first, reference.next_sample());

        for _ in 1..STEP_SAMPLES {
            assert_eq!(matrix.next_sample(), reference.next_sample());
        }
        assert_eq!(matrix.active_column(), 1);
    }

    #[test]
    fn test_pluck_lands_on_boundary_sample() {
        let mut matrix = matrix();
        matrix.set_cell(CellEdit { row: 15, col: 1, on: true });

        for _ in 0..STEP_SAMPLES {
            assert_eq!(matrix.next_sample(), Sample::ZERO);
        }
        assert_eq!(matrix.next_sample(), Sample::new(PLUCK_AMPLITUDE));
        assert_eq!(matrix.current_step(), 1);
    }

    #[test]
    fn test_chord_sums_voices() {
        let mut matrix = matrix();
        for row in [0, 5, 15] {
            matrix.set_cell(CellEdit { row, col: 0, on: true });
        }
        assert_eq!(matrix.next_sample(), Sample::new(3.0 * PLUCK_AMPLITUDE));
    }

    #[test]
    fn test_voices_ring_after_light_cleared() {
        let mut matrix = matrix();
        matrix.set_cell(CellEdit { row: 15, col: 0, on: true });
        matrix.next_sample();
        matrix.clear();

        // 102 samples in, the C4 string (168 slots) is still in its negative half.
        for _ in 0..100 {
            matrix.next_sample();
        }
        assert_ne!(matrix.next_sample(), Sample::ZERO);
        assert_eq!(matrix.grid().active_count(), 0);
    }

    #[test]
    fn test_fill_matches_next_sample() {
        let mut a = matrix();
        let mut b = matrix();
        for m in [&mut a, &mut b] {
            m.set_cell(CellEdit { row: 3, col: 0, on: true });
            m.set_cell(CellEdit { row: 9, col: 1, on: true });
        }

        let mut buffer = vec![0.0f32; 20000];
        a.fill(&mut buffer);
        for value in buffer {
            assert_eq!(value, b.next_sample().to_f32());
        }
        assert_eq!(a.samples_elapsed(), 20000);
    }
}
