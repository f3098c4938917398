//! Karplus-Strong plucked string.
//!
//! A string is a delay line (circular buffer of samples) whose length sets
//! the pitch. Plucking seeds the line with a bipolar pulse; every read
//! replaces the slot with the damped average of itself and its neighbour,
//! so high harmonics die first and the whole tone decays.

use super::sample::Sample;
use super::SynthError;

/// Amplitude of the excitation pulse written by [`StringInstrument::pluck`].
pub const PLUCK_AMPLITUDE: f64 = 0.05;

/// Energy kept per delay-line step.
pub const DECAY_FACTOR: f64 = 0.995;

/// A single plucked-string voice at a fixed pitch.
///
/// Cloning copies the delay line; two instruments never share a buffer.
#[derive(Debug, Clone)]
pub struct StringInstrument {
    /// Requested pitch in Hz.
    frequency: f64,
    /// Delay line. Its length never changes after construction.
    waveform: Vec<Sample>,
    /// Read/write position, always in `0..waveform.len()`.
    cursor: usize,
}

impl StringInstrument {
    /// Creates a silent string tuned to `frequency` at `sample_rate`.
    ///
    /// The delay line holds `floor(sample_rate / frequency)` samples.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `frequency` is not a positive number
    /// - The delay line would hold fewer than two samples
    pub fn new(frequency: f64, sample_rate: u32) -> Result<Self, SynthError> {
        // Written as a negated comparison so NaN is rejected too.
        if !(frequency > 0.0) {
            return Err(SynthError::InvalidFrequency(frequency));
        }

        let length = (f64::from(sample_rate) / frequency).floor() as usize;
        if length <= 1 {
            return Err(SynthError::DelayLineTooSmall {
                frequency,
                sample_rate,
                length,
            });
        }

        Ok(Self {
            frequency,
            waveform: vec![Sample::ZERO; length],
            cursor: 0,
        })
    }

    /// Returns the pitch this string was tuned to.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Returns the delay-line length in samples.
    pub fn len(&self) -> usize {
        self.waveform.len()
    }

    /// Always false: construction guarantees at least two slots.
    pub fn is_empty(&self) -> bool {
        self.waveform.is_empty()
    }

    /// Returns the current read/write position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the delay-line contents.
    pub fn waveform(&self) -> &[Sample] {
        &self.waveform
    }

    /// Excites the string.
    ///
    /// The first half of the line (integer division) is set to
    /// `+PLUCK_AMPLITUDE`, the rest to `-PLUCK_AMPLITUDE`, and the cursor
    /// returns to the start.
    pub fn pluck(&mut self) {
        self.cursor = 0;
        let half = self.waveform.len() / 2;
        let (front, back) = self.waveform.split_at_mut(half);
        front.fill(Sample::new(PLUCK_AMPLITUDE));
        back.fill(Sample::new(-PLUCK_AMPLITUDE));
    }

    /// Produces the next output sample and advances the delay line.
    ///
    /// Real-time safe: no allocation, no locking.
    #[inline]
    pub fn next_sample(&mut self) -> Sample {
        let next = (self.cursor + 1) % self.waveform.len();
        let current = self.waveform[self.cursor];

        self.waveform[self.cursor] = (current + self.waveform[next]) / 2.0 * DECAY_FACTOR;
        self.cursor = next;

        current
    }
}
