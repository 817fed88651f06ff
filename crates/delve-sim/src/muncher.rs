//! Cellular-automaton smoothing ("the muncher").
//!
//! Rock eats into air that has too few open neighbours and air eats into rock
//! that has many. Run on a padded window so the rows at a chunk seam see the
//! real neighbouring chunk instead of a synthetic boundary.

use delve_core::config::CaveConfig;
use delve_core::constants::{OPEN_DENSITY, ROCK_DENSITY};
use delve_core::direction::NEIGHBOUR_OFFSETS;
use delve_core::grid::DensityGrid;

use crate::buffers::GridPair;

/// Thresholds and pass count for the automaton.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuncherRules {
    pub iterations: u32,
    /// Open neighbours an open cell needs to stay open.
    pub air_neighbours_min: u32,
    /// Open neighbours a closed cell needs to open.
    pub rock_neighbours_min: u32,
    pub air_threshold: f32,
}

impl MuncherRules {
    pub fn from_config(config: &CaveConfig) -> Self {
        Self {
            iterations: config.muncher_iterations,
            air_neighbours_min: config.muncher_air_neighbours,
            rock_neighbours_min: config.muncher_rock_neighbours,
            air_threshold: config.air_threshold,
        }
    }
}

/// Count open cells among the 8 neighbours of `(x, y)`. Neighbours outside
/// the grid are not counted, which biases window edges toward rock.
pub fn count_open_neighbours(grid: &DensityGrid, x: usize, y: usize, air_threshold: f32) -> u32 {
    let (w, h) = (grid.width() as i32, grid.height() as i32);
    let mut open = 0;
    for (dx, dy) in NEIGHBOUR_OFFSETS {
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if nx < 0 || ny < 0 || nx >= w || ny >= h {
            continue;
        }
        if grid.at(nx as usize, ny as usize) >= air_threshold {
            open += 1;
        }
    }
    open
}

/// One automaton pass reading `src` and writing binary densities to `dst`.
pub fn munch_pass(src: &DensityGrid, dst: &mut DensityGrid, rules: &MuncherRules) {
    debug_assert_eq!(src.width(), dst.width());
    debug_assert_eq!(src.height(), dst.height());

    for y in 0..src.height() {
        for x in 0..src.width() {
            let open = count_open_neighbours(src, x, y, rules.air_threshold);
            let stays_open = if src.at(x, y) >= rules.air_threshold {
                open >= rules.air_neighbours_min
            } else {
                open >= rules.rock_neighbours_min
            };
            *dst.at_mut(x, y) = if stays_open { OPEN_DENSITY } else { ROCK_DENSITY };
        }
    }
}

/// Smoother owning its ping-pong buffers, reused from chunk to chunk.
pub struct Muncher {
    rules: MuncherRules,
    buffers: GridPair,
}

impl Muncher {
    pub fn new(rules: MuncherRules) -> Self {
        Self {
            rules,
            buffers: GridPair::new(0, 0),
        }
    }

    /// Run `iterations` passes over `window` in place. The window's storage
    /// is swapped into the buffer pair and the result swapped back out, so
    /// nothing is copied cell by cell.
    pub fn smooth(&mut self, window: &mut DensityGrid) {
        self.smooth_passes(window, self.rules.iterations);
    }

    /// Same as [`Muncher::smooth`] with an explicit pass count.
    pub fn smooth_passes(&mut self, window: &mut DensityGrid, passes: u32) {
        if passes == 0 {
            return;
        }

        self.buffers.load(window);
        for _ in 0..passes {
            let (src, dst) = self.buffers.read_write();
            munch_pass(src, dst, &self.rules);
            self.buffers.swap();
        }
        self.buffers.unload(window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(iterations: u32) -> MuncherRules {
        MuncherRules {
            iterations,
            air_neighbours_min: 4,
            rock_neighbours_min: 5,
            air_threshold: 0.5,
        }
    }

    #[test]
    fn test_open_interior_is_fixed_point() {
        let mut grid = DensityGrid::filled(32, 32, 1.0);
        let mut muncher = Muncher::new(rules(5));
        muncher.smooth(&mut grid);
        muncher.smooth_passes(&mut grid, 20);
        // Only the four window corners close; everything else saturates.
        assert_eq!(grid.open_count(0.5), 32 * 32 - 4);
        for y in 6..26 {
            for x in 6..26 {
                assert_eq!(grid.at(x, y), 1.0, "interior cell ({x},{y}) closed");
            }
        }
    }

    #[test]
    fn test_window_corners_close() {
        let mut grid = DensityGrid::filled(8, 8, 1.0);
        let mut muncher = Muncher::new(rules(1));
        muncher.smooth(&mut grid);
        // Corners see only 3 neighbours, edges see 5.
        assert_eq!(grid.at(0, 0), 0.0);
        assert_eq!(grid.at(7, 7), 0.0);
        assert_eq!(grid.at(3, 0), 1.0);
        assert_eq!(grid.at(0, 3), 1.0);
    }

    #[test]
    fn test_isolated_air_is_eaten() {
        let mut grid = DensityGrid::new(5, 5);
        *grid.at_mut(2, 2) = 1.0;
        let mut muncher = Muncher::new(rules(1));
        muncher.smooth(&mut grid);
        assert_eq!(grid.open_count(0.5), 0);
    }

    #[test]
    fn test_rock_pillar_in_air_is_eaten() {
        let mut grid = DensityGrid::filled(5, 5, 1.0);
        *grid.at_mut(2, 2) = 0.0;
        let mut muncher = Muncher::new(rules(1));
        muncher.smooth(&mut grid);
        assert_eq!(grid.at(2, 2), 1.0);
    }

    #[test]
    fn test_output_is_binary() {
        let mut grid = DensityGrid::new(6, 6);
        for (i, cell) in grid.cells_mut().iter_mut().enumerate() {
            *cell = (i % 7) as f32 * 0.37;
        }
        let mut muncher = Muncher::new(rules(1));
        muncher.smooth(&mut grid);
        assert!(grid.cells().iter().all(|&c| c == 0.0 || c == 1.0));
    }

    #[test]
    fn test_zero_iterations_leaves_window() {
        let mut grid = DensityGrid::filled(4, 4, 0.7);
        let mut muncher = Muncher::new(rules(0));
        muncher.smooth(&mut grid);
        assert_eq!(grid, DensityGrid::filled(4, 4, 0.7));
    }

    #[test]
    fn test_pass_reads_only_previous_state() {
        // A vertical 2-wide strip: inner strip cells have 5 open neighbours,
        // the end rows only 3. Updating in place would let the closing ends
        // cascade down the strip within a single pass.
        let mut grid = DensityGrid::new(4, 6);
        for y in 0..6 {
            *grid.at_mut(1, y) = 1.0;
            *grid.at_mut(2, y) = 1.0;
        }
        let mut muncher = Muncher::new(rules(1));
        muncher.smooth(&mut grid);
        for x in 1..3 {
            assert_eq!(grid.at(x, 0), 0.0, "end cell ({x},0) stayed open");
            assert_eq!(grid.at(x, 5), 0.0, "end cell ({x},5) stayed open");
            for y in 1..5 {
                assert_eq!(grid.at(x, y), 1.0, "strip cell ({x},{y}) closed");
            }
        }
    }

    #[test]
    fn test_count_open_neighbours_at_edges() {
        let grid = DensityGrid::filled(3, 3, 1.0);
        assert_eq!(count_open_neighbours(&grid, 1, 1, 0.5), 8);
        assert_eq!(count_open_neighbours(&grid, 0, 0, 0.5), 3);
        assert_eq!(count_open_neighbours(&grid, 1, 0, 0.5), 5);
    }

    #[test]
    fn test_rules_from_config() {
        let config = CaveConfig::default();
        let rules = MuncherRules::from_config(&config);
        assert_eq!(rules.iterations, config.muncher_iterations);
        assert_eq!(rules.air_neighbours_min, 4);
        assert_eq!(rules.rock_neighbours_min, 5);
    }
}
