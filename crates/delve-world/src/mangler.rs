//! Noise overlay ("the mangler") and side-margin fade.
//!
//! The mangler max-combines scaled coherent noise into a carved chunk so
//! tunnels grow irregular chambers. Noise is sampled in world rows, so the
//! field is continuous across chunk seams.

use delve_core::constants::ROCK_DENSITY;
use delve_core::grid::DensityGrid;
use delve_core::types::ChunkDepth;

use crate::rng::RandomSource;

/// Raise each cell to `noise * strength` where that is larger. Never closes
/// a cell. Columns are stretched 2x relative to rows.
pub fn mangle(grid: &mut DensityGrid, depth: ChunkDepth, strength: f32, source: &RandomSource) {
    let height = grid.height();
    let row_offset = depth * height as u64;
    for y in 0..height {
        let world_y = (row_offset + y as u64) as f64;
        for x in 0..grid.width() {
            let n = source.noise2d(x as f64 * 2.0, world_y) as f32 * strength;
            let cell = grid.at_mut(x, y);
            *cell = cell.max(n);
        }
    }
}

/// Fade the outermost `margin` columns on both sides toward rock. Column
/// `x` and its mirror are scaled by `x * fade * r` with a fresh `r` in
/// [0, 1) per cell, so column 0 always closes.
pub fn fade_side_margins(grid: &mut DensityGrid, margin: usize, fade: f32, source: &mut RandomSource) {
    let width = grid.width();
    let margin = margin.min(width / 2);
    for x in 0..margin {
        let mirror = width - 1 - x;
        for y in 0..grid.height() {
            *grid.at_mut(x, y) *= x as f32 * fade * source.randf();
            *grid.at_mut(mirror, y) *= x as f32 * fade * source.randf();
        }
    }
}

/// Force the outermost `margin` columns on both sides to rock. Run on the
/// smoothed chunk, since the automaton can reopen a faded column next to an
/// open one.
pub fn close_side_margins(grid: &mut DensityGrid, margin: usize) {
    let width = grid.width();
    let margin = margin.min(width / 2);
    for y in 0..grid.height() {
        for x in 0..margin {
            *grid.at_mut(x, y) = ROCK_DENSITY;
            *grid.at_mut(width - 1 - x, y) = ROCK_DENSITY;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::config::NoiseKind;

    fn source() -> RandomSource {
        RandomSource::new(1234, NoiseKind::Value, 0.2)
    }

    #[test]
    fn test_mangle_never_closes() {
        let mut grid = DensityGrid::filled(16, 16, 1.0);
        *grid.at_mut(3, 3) = 4.0;
        mangle(&mut grid, 2, 3.5, &source());
        assert!(grid.cells().iter().all(|&c| c >= 1.0));
        assert_eq!(grid.at(3, 3).max(4.0), grid.at(3, 3));
    }

    #[test]
    fn test_mangle_opens_some_rock() {
        let mut grid = DensityGrid::new(32, 32);
        mangle(&mut grid, 0, 3.5, &source());
        let open = grid.open_count(0.5);
        assert!(open > 0 && open < 32 * 32, "open cells: {open}");
    }

    #[test]
    fn test_mangle_is_continuous_across_seams() {
        let src = source();
        let mut tall = DensityGrid::new(8, 20);
        mangle(&mut tall, 0, 3.5, &src);

        let mut upper = DensityGrid::new(8, 10);
        let mut lower = DensityGrid::new(8, 10);
        mangle(&mut upper, 0, 3.5, &src);
        mangle(&mut lower, 1, 3.5, &src);

        assert_eq!(tall.extract_rows(0..10), upper);
        assert_eq!(tall.extract_rows(10..20), lower);
    }

    #[test]
    fn test_margin_closes_outer_columns() {
        let mut grid = DensityGrid::filled(16, 4, 1.0);
        fade_side_margins(&mut grid, 3, 0.1, &mut source());
        for y in 0..4 {
            assert_eq!(grid.at(0, y), 0.0);
            assert_eq!(grid.at(15, y), 0.0);
            assert!(grid.at(1, y) < 0.1);
            assert!(grid.at(14, y) < 0.1);
            assert!(grid.at(2, y) < 0.2);
            assert!(grid.at(13, y) < 0.2);
            for x in 3..13 {
                assert_eq!(grid.at(x, y), 1.0);
            }
        }
    }

    #[test]
    fn test_margin_wider_than_half_is_clamped() {
        let mut grid = DensityGrid::filled(4, 2, 1.0);
        fade_side_margins(&mut grid, 10, 0.1, &mut source());
        assert!(grid.cells().iter().all(|&c| c < 0.1));
    }

    #[test]
    fn test_close_side_margins() {
        let mut grid = DensityGrid::filled(10, 3, 1.0);
        close_side_margins(&mut grid, 3);
        for y in 0..3 {
            assert_eq!(grid.row(y), &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        }

        let mut narrow = DensityGrid::filled(3, 1, 1.0);
        close_side_margins(&mut narrow, 5);
        assert_eq!(narrow.row(0), &[0.0, 1.0, 0.0]);
    }
}
