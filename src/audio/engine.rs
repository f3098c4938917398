//! Real-time playback of a tone matrix.
//!
//! The matrix is split into two halves that never share a lock:
//! - [`MatrixController`] lives on the input/render thread. It keeps a mirror
//!   of the grid so edits show up immediately, and queues them for the audio
//!   thread through a lock-free single-producer/single-consumer ring.
//! - [`MatrixSource`] owns the [`ToneMatrix`] and runs inside the audio
//!   callback. Queued edits are drained only at step boundaries, right before
//!   the column is scanned.
//!
//! [`AudioEngine`] plays the source through rodio's default output device.

use crate::synth::{CellEdit, Grid, Painter, Sample, ToneMatrix};
use anyhow::{Context, Result};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use rodio::{OutputStream, OutputStreamHandle, Source};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Capacity of the edit queue between input and audio threads.
/// A full drag across the grid is well under this.
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// How long shutdown waits for the audio thread to drop the source.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Playhead value before the first step fires.
const NO_STEP: usize = usize::MAX;

/// Represents the current playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// The source is producing samples.
    Playing,
    /// Playback was stopped; the source ends its stream.
    Stopped,
}

/// A grid change sent from the input thread to the audio thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridCommand {
    /// Assign one light.
    Set(CellEdit),
    /// Switch every light off.
    Clear,
}

/// Shared state between the controller and the audio source.
/// Uses atomics for lock-free access from the audio thread.
struct SharedState {
    /// Cleared to end the audio stream.
    running: AtomicBool,
    /// Set once the source has been dropped by the audio backend.
    released: AtomicBool,
    /// Column fired most recently, or `NO_STEP`.
    playhead: AtomicUsize,
}

/// Splits a matrix into its input-side controller and its audio-side source.
///
/// # Arguments
///
/// * `matrix` - The matrix to play; its current grid seeds the controller's mirror
/// * `capacity` - Number of edits the lock-free queue holds before the
///   controller starts buffering them locally
pub fn split(matrix: ToneMatrix, capacity: usize) -> (MatrixController, MatrixSource) {
    let (producer, consumer) = HeapRb::<GridCommand>::new(capacity.max(1)).split();
    let shared = Arc::new(SharedState {
        running: AtomicBool::new(true),
        released: AtomicBool::new(false),
        playhead: AtomicUsize::new(NO_STEP),
    });

    let controller = MatrixController {
        grid: matrix.grid().clone(),
        painter: matrix.painter(),
        commands: producer,
        backlog: VecDeque::new(),
        shared: Arc::clone(&shared),
        sample_rate: matrix.sample_rate(),
    };
    let source = MatrixSource {
        matrix,
        commands: consumer,
        shared,
    };

    (controller, source)
}

/// Input-side handle: accepts pointer events and exposes drawable state.
pub struct MatrixController {
    /// What the grid will look like once queued edits land.
    grid: Grid,
    /// Stroke state, mirrors the matrix's own painter.
    painter: Painter,
    commands: HeapProd<GridCommand>,
    /// Edits that did not fit in the queue, oldest first.
    backlog: VecDeque<GridCommand>,
    shared: Arc<SharedState>,
    sample_rate: u32,
}

impl MatrixController {
    /// Toggles the light under pixel (`x`, `y`) and starts a paint stroke.
    pub fn on_press(&mut self, x: u32, y: u32) -> CellEdit {
        let edit = self.painter.press(&mut self.grid, x, y);
        self.send(GridCommand::Set(edit));
        edit
    }

    /// Paints the light under pixel (`x`, `y`) with the stroke value.
    pub fn on_drag(&mut self, x: u32, y: u32) -> CellEdit {
        let edit = self.painter.drag(&mut self.grid, x, y);
        self.send(GridCommand::Set(edit));
        edit
    }

    /// Switches every light off.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.send(GridCommand::Clear);
    }

    /// Returns the grid as the user sees it, including edits still in flight.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Returns the column the audio thread fired most recently.
    pub fn playhead(&self) -> Option<usize> {
        match self.shared.playhead.load(Ordering::Relaxed) {
            NO_STEP => None,
            col => Some(col),
        }
    }

    /// Returns the sample rate of the underlying matrix.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of edits not yet applied by the audio thread.
    pub fn pending(&self) -> usize {
        self.commands.occupied_len() + self.backlog.len()
    }

    /// Moves locally buffered edits into the queue as space allows.
    ///
    /// Returns the number of edits still waiting locally.
    pub fn flush(&mut self) -> usize {
        while let Some(command) = self.backlog.pop_front() {
            if let Err(command) = self.commands.try_push(command) {
                self.backlog.push_front(command);
                break;
            }
        }
        self.backlog.len()
    }

    /// Returns the current playback state.
    pub fn playback_state(&self) -> PlaybackState {
        if self.shared.running.load(Ordering::Acquire) {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        }
    }

    /// Ends the audio stream. The source returns `None` from its next call
    /// and the backend drops it.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
    }

    /// Returns true once the source (and the matrix it owns) has been dropped.
    pub fn is_released(&self) -> bool {
        self.shared.released.load(Ordering::Acquire)
    }

    fn send(&mut self, command: GridCommand) {
        // Preserve ordering: nothing jumps ahead of older buffered edits.
        if self.flush() > 0 {
            self.backlog.push_back(command);
            return;
        }
        if let Err(command) = self.commands.try_push(command) {
            tracing::warn!(
                capacity = self.commands.capacity().get(),
                "edit queue full, buffering edits until the audio thread catches up"
            );
            self.backlog.push_back(command);
        }
    }
}

/// Audio-side half: owns the matrix and produces samples.
pub struct MatrixSource {
    matrix: ToneMatrix,
    commands: HeapCons<GridCommand>,
    shared: Arc<SharedState>,
}

impl MatrixSource {
    /// Produces the next mixed sample.
    ///
    /// At a step boundary every queued edit is applied before the column is
    /// scanned, so the step sees the latest grid. Never allocates or blocks.
    pub fn next_sample(&mut self) -> Sample {
        let boundary = self.matrix.at_step_boundary();
        if boundary {
            while let Some(command) = self.commands.try_pop() {
                match command {
                    GridCommand::Set(edit) => self.matrix.set_cell(edit),
                    GridCommand::Clear => self.matrix.clear(),
                }
            }
        }

        let sample = self.matrix.next_sample();

        if boundary {
            self.shared
                .playhead
                .store(self.matrix.current_step(), Ordering::Relaxed);
        }
        sample
    }

    /// Returns the matrix as the audio thread sees it.
    pub fn matrix(&self) -> &ToneMatrix {
        &self.matrix
    }
}

impl Iterator for MatrixSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if !self.shared.running.load(Ordering::Acquire) {
            return None;
        }
        Some(self.next_sample().to_f32())
    }
}

impl Source for MatrixSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.matrix.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite stream
    }
}

impl Drop for MatrixSource {
    fn drop(&mut self) {
        self.shared.released.store(true, Ordering::Release);
    }
}

/// Plays a [`MatrixSource`] on the default audio output.
///
/// Dropping the engine stops the source and waits briefly for the backend to
/// release it before the output stream is closed.
pub struct AudioEngine {
    /// Shared with the source: stop flag and release barrier.
    shared: Arc<SharedState>,
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    /// Audio output handle for playback.
    _stream_handle: OutputStreamHandle,
}

impl AudioEngine {
    /// Splits `matrix` and starts playing its source.
    ///
    /// # Returns
    ///
    /// The running engine and the controller for feeding it edits
    ///
    /// # Errors
    ///
    /// Returns error if audio output cannot be initialized
    pub fn start(matrix: ToneMatrix) -> Result<(Self, MatrixController)> {
        let (controller, source) = split(matrix, COMMAND_QUEUE_CAPACITY);
        let engine = Self::play(source)?;
        Ok((engine, controller))
    }

    /// Opens the default output device and plays `source` on it.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No audio output device can be opened
    /// - The device refuses the stream
    pub fn play(source: MatrixSource) -> Result<Self> {
        let shared = Arc::clone(&source.shared);
        let sample_rate = source.matrix.sample_rate();

        let (stream, stream_handle) =
            OutputStream::try_default().context("Failed to open audio output")?;
        stream_handle
            .play_raw(source)
            .context("Failed to start audio playback")?;

        tracing::info!(sample_rate, "audio engine started");

        Ok(Self {
            shared,
            _stream: stream,
            _stream_handle: stream_handle,
        })
    }

    /// Stops playback and releases the audio device.
    pub fn shutdown(self) {
        drop(self);
    }

    /// Stops the source and waits until the backend has dropped it.
    fn stop_and_wait(&self) {
        self.shared.running.store(false, Ordering::Release);

        let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
        while !self.shared.released.load(Ordering::Acquire) {
            if Instant::now() >= deadline {
                // Closing the stream below drops the source anyway.
                tracing::warn!("audio source still alive after stop, closing stream");
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        tracing::info!("audio engine stopped");
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.stop_and_wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{PLUCK_AMPLITUDE, STEP_SAMPLES};

    fn split_matrix(capacity: usize) -> (MatrixController, MatrixSource) {
        split(ToneMatrix::new(10, 44100).unwrap(), capacity)
    }

    fn render(source: &mut MatrixSource, count: u64) {
        for _ in 0..count {
            source.next_sample();
        }
    }

    #[test]
    fn test_controller_mirror_updates_immediately() {
        let (mut controller, source) = split_matrix(16);

        let edit = controller.on_press(5, 5);
        assert_eq!(edit, CellEdit { row: 0, col: 0, on: true });
        assert!(controller.grid().is_on(0, 0));
        assert_eq!(controller.pending(), 1);

        // The audio side has not seen it yet.
        assert!(!source.matrix().grid().is_on(0, 0));
    }

    #[test]
    fn test_edit_applied_on_first_boundary() {
        let (mut controller, mut source) = split_matrix(16);
        controller.on_press(5, 5);

        // Sample 0 is a boundary: the edit lands and row 0 is plucked at once.
        assert_eq!(source.next_sample(), Sample::new(PLUCK_AMPLITUDE));
        assert!(source.matrix().grid().is_on(0, 0));
        assert_eq!(controller.pending(), 0);
        assert_eq!(controller.playhead(), Some(0));
    }

    #[test]
    fn test_edits_wait_for_step_boundary() {
        let (mut controller, mut source) = split_matrix(16);
        source.next_sample();
        assert_eq!(controller.playhead(), Some(0));

        // Light column 1 mid-step.
        controller.on_press(15, 155);
        render(&mut source, 100);
        assert!(!source.matrix().grid().is_on(15, 1));
        assert_eq!(controller.pending(), 1);

        render(&mut source, STEP_SAMPLES - 101);
        assert!(source.matrix().at_step_boundary());
        assert_eq!(source.next_sample(), Sample::new(PLUCK_AMPLITUDE));
        assert!(source.matrix().grid().is_on(15, 1));
        assert_eq!(controller.playhead(), Some(1));
    }

    #[test]
    fn test_drag_and_clear_are_forwarded_in_order() {
        let (mut controller, mut source) = split_matrix(16);
        controller.on_press(5, 5);
        controller.on_drag(15, 5);
        controller.on_drag(25, 5);
        controller.clear();
        controller.on_press(35, 5);

        source.next_sample();
        let grid = source.matrix().grid();
        assert_eq!(grid.active_count(), 1);
        assert!(grid.is_on(0, 3));
        assert_eq!(grid, controller.grid());
    }

    #[test]
    fn test_full_queue_buffers_without_loss() {
        let (mut controller, mut source) = split_matrix(2);
        for col in 0..5u32 {
            controller.on_press(col * 10, 0);
        }
        assert_eq!(controller.pending(), 5);
        assert_eq!(controller.flush(), 3);

        // Each boundary drains whatever fits; flush refills.
        source.next_sample();
        assert_eq!(controller.flush(), 1);
        render(&mut source, STEP_SAMPLES);
        assert_eq!(controller.flush(), 0);
        render(&mut source, STEP_SAMPLES);

        assert_eq!(controller.pending(), 0);
        assert_eq!(source.matrix().grid(), controller.grid());
        assert_eq!(source.matrix().grid().active_count(), 5);
    }

    #[test]
    fn test_stop_ends_stream_and_releases() {
        let (controller, mut source) = split_matrix(16);
        assert_eq!(controller.playback_state(), PlaybackState::Playing);
        assert_eq!(source.next(), Some(0.0));

        controller.stop();
        assert_eq!(controller.playback_state(), PlaybackState::Stopped);
        assert_eq!(source.next(), None);
        assert!(!controller.is_released());

        drop(source);
        assert!(controller.is_released());
    }

    #[test]
    fn test_source_format() {
        let (controller, source) = split_matrix(16);
        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), 44100);
        assert_eq!(controller.sample_rate(), 44100);
        assert!(source.total_duration().is_none());
        assert_eq!(controller.playhead(), None);
    }
}
