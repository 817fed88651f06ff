pub mod error;
pub mod mangler;
pub mod mole;
pub mod rng;
pub mod scheduler;
pub mod stream;
pub mod streaming;

#[cfg(test)]
mod test_harness;

use std::collections::VecDeque;

use delve_core::config::CaveConfig;
use delve_core::constants::DEFAULT_RETAIN_CHUNKS;
use delve_core::types::ChunkDepth;
use delve_core::CaveChunk;

pub use error::SchedulerError;
pub use scheduler::Scheduler;
pub use stream::ChunkStream;
pub use streaming::StreamingPolicy;

/// Primary public struct for the delve-world crate.
/// Owns the generation worker, requests chunks as the player descends, and
/// keeps a window of received chunks around the player.
pub struct CaveWorld {
    scheduler: Scheduler,
    streaming: StreamingPolicy,
    chunks: VecDeque<CaveChunk>,
    /// Chunks kept above the player's chunk before they are dropped.
    retain_chunks: usize,
}

impl CaveWorld {
    /// Start generating a world with the default streaming policy.
    pub fn new(config: CaveConfig) -> Result<Self, SchedulerError> {
        let streaming = StreamingPolicy::with_defaults(config.chunk_height);
        Self::with_streaming(config, streaming, DEFAULT_RETAIN_CHUNKS)
    }

    pub fn with_streaming(
        config: CaveConfig,
        mut streaming: StreamingPolicy,
        retain_chunks: usize,
    ) -> Result<Self, SchedulerError> {
        let scheduler = Scheduler::spawn(config)?;
        scheduler.request_chunks(streaming.reset())?;
        Ok(Self {
            scheduler,
            streaming,
            chunks: VecDeque::new(),
            retain_chunks,
        })
    }

    /// Per-frame update: request chunks ahead of `player_row`, take whatever
    /// the worker has finished, and drop chunks far above the player.
    /// Returns how many chunks arrived.
    pub fn update(&mut self, player_row: f64) -> Result<usize, SchedulerError> {
        self.scheduler
            .request_chunks(self.streaming.update(player_row))?;

        let mut arrived = 0;
        while let Some(chunk) = self.scheduler.try_dequeue_finished() {
            self.chunks.push_back(chunk);
            arrived += 1;
        }

        let player_chunk = self.streaming.chunk_of_row(player_row);
        while let Some(front) = self.chunks.front() {
            if front.depth() + self.retain_chunks as u64 >= player_chunk {
                break;
            }
            self.chunks.pop_front();
        }
        Ok(arrived)
    }

    /// Chunks currently held, shallowest first.
    pub fn chunks(&self) -> impl Iterator<Item = &CaveChunk> {
        self.chunks.iter()
    }

    pub fn chunk(&self, depth: ChunkDepth) -> Option<&CaveChunk> {
        let first = self.chunks.front()?.depth();
        let offset = depth.checked_sub(first)?;
        self.chunks.get(offset as usize)
    }

    /// Whether the cell at column `x` of world row `row` is open. None when
    /// that chunk is not held.
    pub fn is_open(&self, x: usize, row: u64) -> Option<bool> {
        let height = self.scheduler.config().chunk_height as u64;
        let chunk = self.chunk(row / height)?;
        if x >= chunk.width() {
            return None;
        }
        Some(chunk.is_open(x, (row % height) as usize))
    }

    /// Depth of the next chunk expected from the worker.
    pub fn frontier(&self) -> ChunkDepth {
        self.chunks.back().map_or(0, |c| c.depth() + 1)
    }

    pub fn seed(&self) -> u64 {
        self.scheduler.seed()
    }

    pub fn config(&self) -> &CaveConfig {
        self.scheduler.config()
    }

    /// Throw the world away and start again with `seed` (0 for a random
    /// one). Returns the effective seed.
    pub fn reset(&mut self, seed: u64) -> Result<u64, SchedulerError> {
        let seed = self.scheduler.reset(seed)?;
        self.chunks.clear();
        self.scheduler.request_chunks(self.streaming.reset())?;
        Ok(seed)
    }

    /// Stop the worker and wait for it to exit.
    pub fn shutdown(mut self) -> Result<(), SchedulerError> {
        self.scheduler.shutdown()
    }
}
