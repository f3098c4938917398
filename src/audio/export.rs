//! Audio export functionality.
//!
//! Renders a light pattern offline through a fresh tone matrix and writes
//! the result to a WAV file. Only audio is written; the pattern itself is
//! never saved.

use crate::synth::{CellEdit, Grid, ToneMatrix, GRID_SIZE, STEP_SAMPLES};
use anyhow::{ensure, Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Buffer size for rendering chunks.
const RENDER_BUFFER_SIZE: usize = 4096;

/// Light size for the offline matrix. Pointer input never reaches it.
const EXPORT_LIGHT_SIZE: u32 = 1;

/// Number of samples in one full pass over all sixteen columns.
pub const LOOP_SAMPLES: u64 = STEP_SAMPLES * GRID_SIZE as u64;

/// Exports a pattern to a mono 16-bit WAV file.
///
/// Voices start silent, so the file begins exactly on column 0.
///
/// # Arguments
///
/// * `grid` - The pattern to render
/// * `sample_rate` - Output sample rate in Hz
/// * `loops` - Number of full 16-step loops to render (at least 1)
/// * `output_path` - Path for the output WAV file
/// * `progress_callback` - Optional callback for progress updates (0.0 to 1.0)
///
/// # Returns
///
/// The number of samples written
///
/// # Errors
///
/// Returns error if:
/// - `loops` is zero or the sample rate cannot host the voices
/// - Output file cannot be created or written
pub fn export_to_wav<P, F>(
    grid: &Grid,
    sample_rate: u32,
    loops: u32,
    output_path: P,
    mut progress_callback: Option<F>,
) -> Result<u64>
where
    P: AsRef<Path>,
    F: FnMut(f32),
{
    ensure!(loops > 0, "Export needs at least one loop");

    let mut matrix = ToneMatrix::new(EXPORT_LIGHT_SIZE, sample_rate)
        .context("Failed to build tone matrix for export")?;
    for (row, cells) in grid.rows().iter().enumerate() {
        for (col, on) in cells.iter().enumerate() {
            matrix.set_cell(CellEdit { row, col, on: *on });
        }
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(output_path.as_ref(), spec).with_context(|| {
        format!(
            "Failed to create output WAV file: {}",
            output_path.as_ref().display()
        )
    })?;

    let total_samples = LOOP_SAMPLES * u64::from(loops);
    let mut buffer = vec![0.0f32; RENDER_BUFFER_SIZE];
    let mut current_sample = 0u64;

    tracing::info!(
        path = %output_path.as_ref().display(),
        loops,
        total_samples,
        lights = grid.active_count(),
        "exporting pattern"
    );

    while current_sample < total_samples {
        let samples_to_render =
            (total_samples - current_sample).min(RENDER_BUFFER_SIZE as u64) as usize;
        let chunk = &mut buffer[..samples_to_render];
        matrix.fill(chunk);

        for sample in chunk.iter() {
            // Convert f32 (-1.0 to 1.0) to i16
            let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(value)?;
        }

        current_sample += samples_to_render as u64;

        if let Some(ref mut callback) = progress_callback {
            callback(current_sample as f32 / total_samples as f32);
        }
    }

    writer.finalize().context("Failed to finalize WAV file")?;

    Ok(total_samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    #[test]
    fn test_export_empty_pattern_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silence.wav");

        let written = export_to_wav(&Grid::new(), 44100, 1, &path, None::<fn(f32)>).unwrap();
        assert_eq!(written, LOOP_SAMPLES);

        let mut reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.duration() as u64, LOOP_SAMPLES);
        assert!(reader.samples::<i16>().all(|s| s.unwrap() == 0));
    }

    #[test]
    fn test_export_plucks_on_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pattern.wav");

        let mut grid = Grid::new();
        grid.apply(CellEdit { row: 15, col: 2, on: true });

        let mut progress = Vec::new();
        export_to_wav(&grid, 44100, 2, &path, Some(|p: f32| progress.push(p))).unwrap();

        let samples: Vec<i16> = WavReader::open(&path)
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(samples.len() as u64, 2 * LOOP_SAMPLES);

        let step = STEP_SAMPLES as usize;
        assert!(samples[..2 * step].iter().all(|s| *s == 0));
        // 0.05 * 32767
        assert_eq!(samples[2 * step], 1638);
        assert_eq!(samples[2 * step + 84], -1638);

        // Second loop replays the pluck.
        let second = LOOP_SAMPLES as usize + 2 * step;
        assert_eq!(samples[second], 1638);

        assert_eq!(progress.last().copied(), Some(1.0));
        assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_export_rejects_zero_loops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.wav");
        assert!(export_to_wav(&Grid::new(), 44100, 0, &path, None::<fn(f32)>).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_export_rejects_low_sample_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("low.wav");
        assert!(export_to_wav(&Grid::new(), 2000, 1, &path, None::<fn(f32)>).is_err());
    }
}
