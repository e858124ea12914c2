//! Boolean step grid: rows are pitches or drum lanes, columns are steps.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// A rectangular grid of on/off cells.
///
/// Stored row-major: `cells[row * columns + column]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternGrid {
    rows: usize,
    columns: usize,
    cells: Vec<bool>,
}

impl PatternGrid {
    /// Create an empty (all off) grid.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![false; rows * columns],
        }
    }

    /// Number of rows (pitches or lanes).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of steps.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// True when the grid has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn index(&self, row: usize, column: usize) -> Option<usize> {
        (row < self.rows && column < self.columns).then(|| row * self.columns + column)
    }

    /// Read a cell. Out-of-range coordinates read as off.
    pub fn get(&self, row: usize, column: usize) -> bool {
        self.index(row, column)
            .map(|i| self.cells[i])
            .unwrap_or(false)
    }

    /// Write a cell. Returns false if the coordinates are out of range.
    pub fn set(&mut self, row: usize, column: usize, value: bool) -> bool {
        match self.index(row, column) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Flip a cell, returning its new state (`None` if out of range).
    pub fn toggle(&mut self, row: usize, column: usize) -> Option<bool> {
        let i = self.index(row, column)?;
        self.cells[i] = !self.cells[i];
        Some(self.cells[i])
    }

    /// Turn every cell off.
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// Turn every cell on.
    pub fn fill(&mut self) {
        self.cells.fill(true);
    }

    /// Cells of one step, top row first. Empty if `column` is out of range.
    pub fn column(&self, column: usize) -> impl Iterator<Item = bool> + '_ {
        let rows = if column < self.columns { self.rows } else { 0 };
        (0..rows).map(move |row| self.cells[row * self.columns + column])
    }

    /// Number of cells that are on.
    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Flat `'0'`/`'1'` string in row-major order.
    pub fn to_bit_string(&self) -> String {
        self.cells.iter().map(|&c| if c { '1' } else { '0' }).collect()
    }

    /// Build a grid from a flat `'0'`/`'1'` string.
    ///
    /// Cells are filled in row-major order. Characters other than `'1'`
    /// read as off, a short string leaves the trailing cells off and a long
    /// string is truncated.
    pub fn from_bit_str(rows: usize, columns: usize, bits: &str) -> Self {
        let mut grid = Self::new(rows, columns);
        for (cell, ch) in grid.cells.iter_mut().zip(bits.chars()) {
            *cell = ch == '1';
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_off() {
        let grid = PatternGrid::new(4, 16);
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.columns(), 16);
        assert_eq!(grid.active_count(), 0);
    }

    #[test]
    fn set_and_get() {
        let mut grid = PatternGrid::new(4, 4);
        assert!(grid.set(2, 3, true));
        assert!(grid.get(2, 3));
        assert!(!grid.get(3, 2));
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut grid = PatternGrid::new(2, 2);
        assert!(!grid.set(2, 0, true));
        assert!(!grid.set(0, 2, true));
        assert!(!grid.get(5, 5));
        assert_eq!(grid.toggle(9, 0), None);
        assert_eq!(grid.active_count(), 0);
    }

    #[test]
    fn toggle_flips() {
        let mut grid = PatternGrid::new(2, 2);
        assert_eq!(grid.toggle(0, 1), Some(true));
        assert_eq!(grid.toggle(0, 1), Some(false));
    }

    #[test]
    fn clear_and_fill() {
        let mut grid = PatternGrid::new(3, 3);
        grid.fill();
        assert_eq!(grid.active_count(), 9);
        grid.clear();
        assert_eq!(grid.active_count(), 0);
    }

    #[test]
    fn column_reads_top_down() {
        let mut grid = PatternGrid::new(3, 4);
        grid.set(0, 1, true);
        grid.set(2, 1, true);
        let col: Vec<bool> = grid.column(1).collect();
        assert_eq!(col, [true, false, true]);
        assert_eq!(grid.column(4).count(), 0);
    }

    #[test]
    fn bit_string_is_row_major() {
        let mut grid = PatternGrid::new(2, 3);
        grid.set(0, 0, true);
        grid.set(1, 2, true);
        assert_eq!(grid.to_bit_string(), "100001");
        assert_eq!(PatternGrid::from_bit_str(2, 3, "100001"), grid);
    }

    #[test]
    fn short_and_long_bit_strings() {
        let short = PatternGrid::from_bit_str(2, 2, "01");
        assert_eq!(short.to_bit_string(), "0100");

        let long = PatternGrid::from_bit_str(1, 1, "1000");
        assert!(long.get(0, 0));
        assert_eq!(long.to_bit_string(), "1");
    }

    #[test]
    fn foreign_characters_read_as_off() {
        let grid = PatternGrid::from_bit_str(1, 4, "1x2 ");
        assert_eq!(grid.to_bit_string(), "1000");
    }
}
