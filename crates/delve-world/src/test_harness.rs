//! Whole-pipeline properties: determinism, reachability, seams and margins.

use delve_core::config::{CaveConfig, SurfaceKind};
use delve_core::grid::DensityGrid;
use delve_core::CaveChunk;
use delve_sim::{Muncher, MuncherRules};

use crate::stream::ChunkStream;

fn config(seed: u64) -> CaveConfig {
    CaveConfig {
        seed,
        ..CaveConfig::default()
    }
}

fn generate(config: CaveConfig, count: usize) -> Vec<CaveChunk> {
    let mut stream = ChunkStream::new(config);
    (0..count).map(|_| stream.advance()).collect()
}

/// Two chunks stacked into one grid, `upper` on top.
fn stack(upper: &CaveChunk, lower: &CaveChunk) -> DensityGrid {
    let (width, height) = (upper.width(), upper.height());
    let mut grid = DensityGrid::new(width, height * 2);
    grid.copy_rows_from(0, &upper.to_density(), 0..height);
    grid.copy_rows_from(height, &lower.to_density(), 0..height);
    grid
}

#[test]
fn test_first_chunks_are_deterministic() {
    for seed in [1, 12345, u64::MAX] {
        assert_eq!(generate(config(seed), 8), generate(config(seed), 8));
    }
}

#[test]
fn test_narrow_hole_scenario() {
    let cfg = CaveConfig {
        seed: 12345,
        chunk_width: 32,
        chunk_height: 32,
        chunk_pad: 8,
        mole_hole_width: 2,
        muncher_air_neighbours: 4,
        muncher_rock_neighbours: 5,
        muncher_iterations: 5,
        ..CaveConfig::default()
    };
    let a = generate(cfg.clone(), 1);
    let b = generate(cfg, 1);
    assert_eq!(a[0], b[0]);
    assert_eq!(a[0].depth(), 0);
    assert!(
        a[0].has_vertical_path(2),
        "no 2-wide path through chunk 0:\n{}",
        a[0].to_ascii()
    );
}

#[test]
fn test_moles_reach_the_bottom() {
    let chunks = generate(config(2024), 300);
    let reached = chunks
        .iter()
        .filter(|c| c.stats().reached_bottom > 0)
        .count();
    assert!(
        reached * 100 >= chunks.len() * 99,
        "only {reached}/{} chunks were carved to the bottom",
        chunks.len()
    );
    assert!(chunks.iter().all(|c| c.stats().forced_descents == 0));
}

#[test]
fn test_seams_are_continuous() {
    let chunks = generate(config(31337), 40);
    let rules = MuncherRules::from_config(&config(31337));
    let mut muncher = Muncher::new(rules);

    let height = chunks[0].height();
    let width = chunks[0].width();
    let mut changed = 0usize;
    let mut seams = 0usize;
    for pair in chunks.windows(2) {
        let before = stack(&pair[0], &pair[1]);
        let mut after = before.clone();
        muncher.smooth_passes(&mut after, 1);
        for y in [height - 1, height] {
            changed += before
                .row(y)
                .iter()
                .zip(after.row(y))
                .filter(|(a, b)| a != b)
                .count();
        }
        seams += 1;
    }
    let fraction = changed as f64 / (seams * 2 * width) as f64;
    assert!(fraction <= 0.25, "seam rows changed by {fraction:.3}");
}

#[test]
fn test_side_margins_never_open() {
    for surface in [SurfaceKind::Open, SurfaceKind::Closed] {
        for seed in 1..=12 {
            let cfg = CaveConfig {
                surface,
                ..config(seed)
            };
            let margin = cfg.side_margin;
            for chunk in generate(cfg, 12) {
                let w = chunk.width();
                for y in 0..chunk.height() {
                    for x in 0..margin {
                        assert!(
                            !chunk.is_open(x, y) && !chunk.is_open(w - 1 - x, y),
                            "seed {seed} {surface:?} chunk {} open in margin column {x} at row {y}",
                            chunk.depth()
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn test_tunnels_survive_smoothing() {
    for chunk in generate(config(4242), 10) {
        let open = chunk.stats().open_cells;
        let total = chunk.width() * chunk.height();
        assert!(open > 0, "chunk {} fully closed", chunk.depth());
        assert!(open < total, "chunk {} fully open", chunk.depth());
    }
}
