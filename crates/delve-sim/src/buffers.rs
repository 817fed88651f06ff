use delve_core::grid::DensityGrid;

/// Double-buffered density grids for the smoothing automaton.
///
/// Two grids alternate roles each pass: one is read-only (current state),
/// the other is written (next state). After a pass `swap()` flips the roles,
/// so no cell is ever copied between passes and no pass reads a cell it has
/// already written. Both grids are kept between chunks and only reallocated
/// when the window size changes.
pub(crate) struct GridPair {
    grids: [DensityGrid; 2],
    /// 0 or 1: index of the grid currently used for reading.
    read_index: usize,
}

impl GridPair {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grids: [
                DensityGrid::new(width, height),
                DensityGrid::new(width, height),
            ],
            read_index: 0,
        }
    }

    /// The grid holding the current state.
    pub fn read(&self) -> &DensityGrid {
        &self.grids[self.read_index]
    }

    /// Current state and next-state target, borrowed together.
    pub fn read_write(&mut self) -> (&DensityGrid, &mut DensityGrid) {
        let (a, b) = self.grids.split_at_mut(1);
        if self.read_index == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    /// Swap read/write roles. Call after each full pass.
    pub fn swap(&mut self) {
        self.read_index = 1 - self.read_index;
    }

    /// Move `grid` into the read slot by exchanging storage, then make sure
    /// the write slot matches its size.
    pub fn load(&mut self, grid: &mut DensityGrid) {
        std::mem::swap(&mut self.grids[self.read_index], grid);
        let (w, h) = (self.read().width(), self.read().height());
        let write_index = 1 - self.read_index;
        let write = &self.grids[write_index];
        if write.width() != w || write.height() != h {
            log::debug!("GridPair: resizing write buffer to {w}x{h}");
            self.grids[write_index] = DensityGrid::new(w, h);
        }
    }

    /// Move the current state back out into `grid` by exchanging storage.
    pub fn unload(&mut self, grid: &mut DensityGrid) {
        std::mem::swap(&mut self.grids[self.read_index], grid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_flips_roles() {
        let mut pair = GridPair::new(2, 2);
        {
            let (_, write) = pair.read_write();
            write.fill(1.0);
        }
        assert_eq!(pair.read().open_count(0.5), 0);
        pair.swap();
        assert_eq!(pair.read().open_count(0.5), 4);
    }

    #[test]
    fn test_load_unload_round_trip_and_resize() {
        let mut pair = GridPair::new(2, 2);
        let mut grid = DensityGrid::filled(3, 5, 1.0);
        pair.load(&mut grid);
        assert_eq!(pair.read().height(), 5);
        {
            let (read, write) = pair.read_write();
            assert_eq!(write.width(), read.width());
            assert_eq!(write.height(), read.height());
        }
        let mut out = DensityGrid::new(1, 1);
        pair.unload(&mut out);
        assert_eq!(out, DensityGrid::filled(3, 5, 1.0));
    }
}
