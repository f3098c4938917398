//! The 16x16 light grid and pointer painting.
//!
//! Rows are voices (row 0 is the highest pitch), columns are time steps.
//! A [`Painter`] turns pixel coordinates from a pointer into cell edits:
//! a press toggles the light under it and remembers the result, and every
//! drag after that paints the remembered value.

use super::matrix::GRID_SIZE;
use super::SynthError;

/// An absolute assignment of one light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellEdit {
    pub row: usize,
    pub col: usize,
    pub on: bool,
}

/// On/off state of every light.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    cells: [[bool; GRID_SIZE]; GRID_SIZE],
}

impl Grid {
    /// Creates a grid with every light off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the light at (`row`, `col`) is on.
    pub fn is_on(&self, row: usize, col: usize) -> bool {
        self.cells[row][col]
    }

    /// Switches the light at (`row`, `col`) on or off.
    pub fn set(&mut self, row: usize, col: usize, on: bool) {
        self.cells[row][col] = on;
    }

    /// Flips a light and returns its new state.
    pub fn toggle(&mut self, row: usize, col: usize) -> bool {
        let cell = &mut self.cells[row][col];
        *cell = !*cell;
        *cell
    }

    /// Applies an absolute edit.
    pub fn apply(&mut self, edit: CellEdit) {
        self.set(edit.row, edit.col, edit.on);
    }

    /// Switches every light off.
    pub fn clear(&mut self) {
        self.cells = [[false; GRID_SIZE]; GRID_SIZE];
    }

    /// Returns the rows of the grid, top to bottom.
    pub fn rows(&self) -> &[[bool; GRID_SIZE]; GRID_SIZE] {
        &self.cells
    }

    /// Returns the rows whose light is on in column `col`.
    pub fn column(&self, col: usize) -> impl Iterator<Item = usize> + '_ {
        (0..GRID_SIZE).filter(move |&row| self.cells[row][col])
    }

    /// Number of lights that are on.
    pub fn active_count(&self) -> usize {
        self.cells.iter().flatten().filter(|on| **on).count()
    }
}

/// Converts pointer positions into cell edits.
///
/// Coordinates are pixels relative to the top-left corner of the grid. They
/// must already be inside the grid; out-of-range positions panic on index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Painter {
    /// Width and height of one light in pixels. Never zero.
    light_size: u32,
    /// Value written by drags: the state the last press left its light in.
    paint: bool,
}

impl Painter {
    /// Creates a painter for lights of `light_size` pixels.
    ///
    /// # Errors
    ///
    /// Returns `SynthError::InvalidLightSize` if `light_size` is zero.
    pub fn new(light_size: u32) -> Result<Self, SynthError> {
        if light_size == 0 {
            return Err(SynthError::InvalidLightSize);
        }
        Ok(Self {
            light_size,
            paint: false,
        })
    }

    /// Returns the size of one light in pixels.
    pub fn light_size(&self) -> u32 {
        self.light_size
    }

    /// Returns the value the current stroke paints.
    pub fn paint_value(&self) -> bool {
        self.paint
    }

    /// Maps a pixel position to (row, col).
    pub fn cell_at(&self, x: u32, y: u32) -> (usize, usize) {
        ((y / self.light_size) as usize, (x / self.light_size) as usize)
    }

    /// Toggles the light under (`x`, `y`) and starts a stroke with its new state.
    pub fn press(&mut self, grid: &mut Grid, x: u32, y: u32) -> CellEdit {
        let (row, col) = self.cell_at(x, y);
        self.paint = grid.toggle(row, col);
        CellEdit {
            row,
            col,
            on: self.paint,
        }
    }

    /// Paints the light under (`x`, `y`) with the stroke value, whatever it was before.
    pub fn drag(&self, grid: &mut Grid, x: u32, y: u32) -> CellEdit {
        let (row, col) = self.cell_at(x, y);
        let edit = CellEdit {
            row,
            col,
            on: self.paint,
        };
        grid.apply(edit);
        edit
    }
}
