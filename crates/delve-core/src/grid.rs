use std::ops::Range;

use crate::types::CellCoord;

/// Row-major grid of density cells. Values at or above the air threshold are
/// open. Carving may push values above 1.0; smoothing output is 0.0 or 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    width: usize,
    height: usize,
    cells: Vec<f32>,
}

impl DensityGrid {
    /// A fully closed grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Flat index of a signed coordinate, or None when outside the grid.
    pub fn index_of(&self, pos: CellCoord) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    /// Density at a signed coordinate. None outside the grid.
    pub fn get(&self, pos: CellCoord) -> Option<f32> {
        self.index_of(pos).map(|i| self.cells[i])
    }

    /// Write a cell. Out-of-range writes are dropped; returns whether it landed.
    pub fn set(&mut self, pos: CellCoord, value: f32) -> bool {
        match self.index_of(pos) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Density at an in-range coordinate. Panics when out of range.
    pub fn at(&self, x: usize, y: usize) -> f32 {
        debug_assert!(x < self.width && y < self.height);
        self.cells[y * self.width + x]
    }

    pub fn at_mut(&mut self, x: usize, y: usize) -> &mut f32 {
        debug_assert!(x < self.width && y < self.height);
        &mut self.cells[y * self.width + x]
    }

    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [f32] {
        &mut self.cells
    }

    pub fn fill(&mut self, value: f32) {
        self.cells.fill(value);
    }

    /// One row of cells.
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.width;
        &self.cells[start..start + self.width]
    }

    /// Copy `src_rows` of `src` into this grid starting at row `dst_row`.
    /// Both grids must share a width.
    pub fn copy_rows_from(&mut self, dst_row: usize, src: &DensityGrid, src_rows: Range<usize>) {
        assert_eq!(self.width, src.width, "grid widths differ");
        let count = src_rows.len();
        let src_start = src_rows.start * src.width;
        let dst_start = dst_row * self.width;
        let len = count * self.width;
        self.cells[dst_start..dst_start + len]
            .copy_from_slice(&src.cells[src_start..src_start + len]);
    }

    /// New grid holding a contiguous band of rows.
    pub fn extract_rows(&self, rows: Range<usize>) -> DensityGrid {
        let mut out = DensityGrid::new(self.width, rows.len());
        out.copy_rows_from(0, self, rows);
        out
    }

    pub fn is_open(&self, x: usize, y: usize, air_threshold: f32) -> bool {
        self.at(x, y) >= air_threshold
    }

    /// Number of open cells.
    pub fn open_count(&self, air_threshold: f32) -> usize {
        self.cells.iter().filter(|&&c| c >= air_threshold).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;

    #[test]
    fn test_get_set_bounds() {
        let mut grid = DensityGrid::new(4, 3);
        assert!(grid.set(IVec2::new(3, 2), 1.0));
        assert_eq!(grid.get(IVec2::new(3, 2)), Some(1.0));
        assert!(!grid.set(IVec2::new(4, 0), 1.0));
        assert!(!grid.set(IVec2::new(-1, 0), 1.0));
        assert_eq!(grid.get(IVec2::new(0, 3)), None);
        assert_eq!(grid.open_count(0.5), 1);
    }

    #[test]
    fn test_row_major_layout() {
        let mut grid = DensityGrid::new(3, 2);
        *grid.at_mut(1, 1) = 0.7;
        assert_eq!(grid.row(1), &[0.0, 0.7, 0.0]);
        assert_eq!(grid.cells()[4], 0.7);
    }

    #[test]
    fn test_copy_and_extract_rows() {
        let mut src = DensityGrid::new(2, 4);
        for y in 0..4 {
            for x in 0..2 {
                *src.at_mut(x, y) = y as f32;
            }
        }
        let mut dst = DensityGrid::new(2, 3);
        dst.copy_rows_from(1, &src, 2..4);
        assert_eq!(dst.row(0), &[0.0, 0.0]);
        assert_eq!(dst.row(1), &[2.0, 2.0]);
        assert_eq!(dst.row(2), &[3.0, 3.0]);

        let band = src.extract_rows(1..3);
        assert_eq!(band.height(), 2);
        assert_eq!(band.row(0), &[1.0, 1.0]);
    }
}
