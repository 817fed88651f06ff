//! Sequential chunk production over a sliding prev/curr/next window.
//!
//! Every emitted chunk is smoothed inside a window padded with the bottom
//! rows of the chunk above and the top rows of the chunk below, so the
//! automaton sees real neighbours at both seams.

use std::time::Instant;

use delve_core::config::{CaveConfig, SurfaceKind};
use delve_core::constants::{OPEN_DENSITY, ROCK_DENSITY};
use delve_core::grid::DensityGrid;
use delve_core::types::ChunkDepth;
use delve_core::{CaveChunk, ChunkStats};
use delve_sim::{Muncher, MuncherRules};

use crate::mangler::{close_side_margins, fade_side_margins, mangle};
use crate::mole::{MoleParams, MolePopulation};
use crate::rng::RandomSource;

/// A carved, not yet smoothed chunk waiting in the window.
struct PendingChunk {
    depth: ChunkDepth,
    grid: DensityGrid,
    stats: ChunkStats,
}

/// Produces chunks 0, 1, 2, ... in order. Single-threaded; the scheduler
/// owns one of these on its worker thread.
pub struct ChunkStream {
    config: CaveConfig,
    params: MoleParams,
    source: RandomSource,
    moles: MolePopulation,
    muncher: Muncher,
    prev: Option<DensityGrid>,
    curr: Option<PendingChunk>,
    next: Option<PendingChunk>,
    window: DensityGrid,
    depth: ChunkDepth,
}

impl ChunkStream {
    /// Build a stream positioned at depth 0. The config is sanitized first.
    pub fn new(config: CaveConfig) -> Self {
        let (config, _) = config.sanitize();
        let source = RandomSource::new(config.seed, config.noise_kind, config.noise_frequency);
        let mut stream = Self {
            params: MoleParams::from_config(&config),
            muncher: Muncher::new(MuncherRules::from_config(&config)),
            window: DensityGrid::new(config.chunk_width, config.padded_height()),
            config,
            source,
            moles: MolePopulation::new(),
            prev: None,
            curr: None,
            next: None,
            depth: 0,
        };
        stream.moles.populate(&stream.params, &mut stream.source);
        log::info!(
            "Chunk stream ready: seed {}, {}x{} chunks, pad {}",
            stream.source.seed(),
            stream.config.chunk_width,
            stream.config.chunk_height,
            stream.config.chunk_pad,
        );
        stream
    }

    /// Drop all state and start over from depth 0 with `config`.
    pub fn reset(&mut self, config: CaveConfig) {
        *self = Self::new(config);
    }

    /// Effective seed; never 0.
    pub fn seed(&self) -> u64 {
        self.source.seed()
    }

    /// Depth of the next chunk [`ChunkStream::advance`] will emit.
    pub fn depth(&self) -> ChunkDepth {
        self.depth
    }

    /// Produce the next chunk in sequence.
    pub fn advance(&mut self) -> CaveChunk {
        let started = Instant::now();

        // The old curr becomes prev after one more carve pass. Every mole has
        // already left it, so the pass only re-applies noise and deepens the
        // side margins.
        let prev = match self.curr.take() {
            Some(mut curr) => {
                self.carve(&mut curr.grid, curr.depth);
                curr.grid
            }
            None => self.surface(),
        };

        let curr = match self.next.take() {
            Some(next) => next,
            None => self.build(self.depth),
        };

        self.moles.rewind_to_top();
        let next = self.build(self.depth + 1);

        self.prev = Some(prev);
        self.curr = Some(curr);
        self.next = Some(next);

        self.assemble_window();
        self.muncher.smooth(&mut self.window);

        let pad = self.config.chunk_pad;
        let height = self.config.chunk_height;
        let mut finished = self.window.extract_rows(pad..pad + height);
        close_side_margins(&mut finished, self.config.side_margin);
        let stats = self.curr.as_ref().map(|c| c.stats).unwrap_or_default();
        let chunk = CaveChunk::from_density(self.depth, &finished, self.config.air_threshold, stats);

        log::debug!(
            "Chunk {} ready in {:.2}ms ({} moles, {} open cells)",
            self.depth,
            started.elapsed().as_secs_f64() * 1000.0,
            stats.agents,
            chunk.stats().open_cells,
        );
        self.depth += 1;
        chunk
    }

    /// A fresh closed grid carved, mangled and faded for `depth`.
    fn build(&mut self, depth: ChunkDepth) -> PendingChunk {
        let mut grid = DensityGrid::new(self.config.chunk_width, self.config.chunk_height);
        let stats = self.carve(&mut grid, depth);
        PendingChunk { depth, grid, stats }
    }

    /// One mole pass, then noise, then the side margins.
    fn carve(&mut self, grid: &mut DensityGrid, depth: ChunkDepth) -> ChunkStats {
        let stats = self
            .moles
            .dig_chunk(grid, &self.params, &mut self.source, depth);
        mangle(grid, depth, self.config.noise_strength, &self.source);
        fade_side_margins(
            grid,
            self.config.side_margin,
            self.config.side_margin_fade,
            &mut self.source,
        );
        stats
    }

    /// Stand-in for the chunk above depth 0.
    fn surface(&self) -> DensityGrid {
        let fill = match self.config.surface {
            SurfaceKind::Open => OPEN_DENSITY,
            SurfaceKind::Closed => ROCK_DENSITY,
        };
        DensityGrid::filled(self.config.chunk_width, self.config.chunk_height, fill)
    }

    /// Last `pad` rows of prev, all of curr, first `pad` rows of next.
    fn assemble_window(&mut self) {
        let (Some(prev), Some(curr), Some(next)) = (&self.prev, &self.curr, &self.next) else {
            return;
        };
        let pad = self.config.chunk_pad;
        let height = self.config.chunk_height;
        self.window.copy_rows_from(0, prev, height - pad..height);
        self.window.copy_rows_from(pad, &curr.grid, 0..height);
        self.window.copy_rows_from(pad + height, &next.grid, 0..pad);
    }
}
