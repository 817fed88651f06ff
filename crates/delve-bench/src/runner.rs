use std::time::Instant;

use delve_core::{CaveChunk, ChunkStats};
use delve_world::ChunkStream;

use crate::scenes::SceneConfig;

/// Clearance used when checking that a chunk can be descended.
const PLAYER_CLEARANCE: usize = 2;

/// Timing data for a single benchmark run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimingSeries {
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Result of a single scene benchmark.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BenchmarkResult {
    pub scene_name: String,
    pub seed: u64,
    pub chunk_count: u32,
    /// Share of open cells over all chunks, in percent.
    pub open_pct: f64,
    /// Share of chunks where at least one mole reached the bottom row.
    pub bottom_reached_pct: f64,
    /// Share of chunks with a top-to-bottom path wide enough for the player.
    pub passable_pct: f64,
    pub merged: usize,
    pub spawned: usize,
    pub forced_descents: usize,
    pub timings: TimingSeries,
}

/// Generates chunks single-threaded, timing each one.
pub struct BenchmarkRunner {
    chunk_count: u32,
}

impl BenchmarkRunner {
    pub fn new(chunk_count: u32) -> Self {
        Self { chunk_count }
    }

    /// Run one scene. Also returns the last chunk for inspection.
    pub fn run_scene(&self, scene: &SceneConfig) -> (BenchmarkResult, Option<CaveChunk>) {
        log::info!(
            "Running scene '{}' ({} chunks)...",
            scene.name,
            self.chunk_count
        );

        let mut stream = ChunkStream::new(scene.config.clone());
        let mut chunk_times = Vec::with_capacity(self.chunk_count as usize);
        let mut tally = SceneTally::default();
        let mut last = None;

        for _ in 0..self.chunk_count {
            let start = Instant::now();
            let chunk = stream.advance();
            chunk_times.push(start.elapsed().as_secs_f64() * 1000.0);
            tally.add(&chunk);
            last = Some(chunk);
        }

        let timings = compute_timings(&chunk_times);
        log::info!(
            "  Done: mean={:.3}ms, p95={:.3}ms, bottom reached in {:.1}% of chunks",
            timings.mean_ms,
            timings.p95_ms,
            tally.pct(tally.bottom_reached),
        );
        if tally.totals.forced_descents > 0 {
            log::warn!(
                "  {} moles were forced down after exhausting their step budget",
                tally.totals.forced_descents
            );
        }

        let result = BenchmarkResult {
            scene_name: scene.name.to_string(),
            seed: stream.seed(),
            chunk_count: self.chunk_count,
            open_pct: if tally.cells == 0 {
                0.0
            } else {
                tally.open_cells as f64 / tally.cells as f64 * 100.0
            },
            bottom_reached_pct: tally.pct(tally.bottom_reached),
            passable_pct: tally.pct(tally.passable),
            merged: tally.totals.merged,
            spawned: tally.totals.spawned,
            forced_descents: tally.totals.forced_descents,
            timings,
        };
        (result, last)
    }
}

#[derive(Debug, Default)]
struct SceneTally {
    chunks: usize,
    cells: usize,
    open_cells: usize,
    bottom_reached: usize,
    passable: usize,
    totals: ChunkStats,
}

impl SceneTally {
    fn add(&mut self, chunk: &CaveChunk) {
        let stats = chunk.stats();
        self.chunks += 1;
        self.cells += chunk.width() * chunk.height();
        self.open_cells += stats.open_cells;
        self.bottom_reached += usize::from(stats.reached_bottom > 0);
        self.passable += usize::from(chunk.has_vertical_path(PLAYER_CLEARANCE));
        self.totals.absorb(stats);
    }

    fn pct(&self, count: usize) -> f64 {
        if self.chunks == 0 {
            0.0
        } else {
            count as f64 / self.chunks as f64 * 100.0
        }
    }
}

/// Compute timing statistics from a list of per-chunk times in milliseconds.
pub fn compute_timings(times: &[f64]) -> TimingSeries {
    if times.is_empty() {
        return TimingSeries {
            mean_ms: 0.0,
            median_ms: 0.0,
            p95_ms: 0.0,
            p99_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
        };
    }

    let mut sorted = times.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let p95_idx = ((n as f64) * 0.95).ceil() as usize;
    let p99_idx = ((n as f64) * 0.99).ceil() as usize;

    TimingSeries {
        mean_ms: mean,
        median_ms: median,
        p95_ms: sorted[p95_idx.min(n - 1)],
        p99_ms: sorted[p99_idx.min(n - 1)],
        min_ms: sorted[0],
        max_ms: sorted[n - 1],
    }
}
