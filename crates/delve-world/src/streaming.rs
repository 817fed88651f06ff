use delve_core::constants::{DEFAULT_INITIAL_CHUNKS, DEFAULT_LOOKAHEAD_CHUNKS};

/// Decides how many chunks to request as the player descends. The world
/// only grows downward, so the policy just tracks how far ahead of the
/// player the requested frontier sits.
#[derive(Debug, Clone)]
pub struct StreamingPolicy {
    initial_chunks: usize,
    lookahead_chunks: usize,
    chunk_height: usize,
    requested: u64,
}

impl StreamingPolicy {
    pub fn new(initial_chunks: usize, lookahead_chunks: usize, chunk_height: usize) -> Self {
        Self {
            initial_chunks,
            lookahead_chunks,
            chunk_height: chunk_height.max(1),
            requested: 0,
        }
    }

    pub fn with_defaults(chunk_height: usize) -> Self {
        Self::new(DEFAULT_INITIAL_CHUNKS, DEFAULT_LOOKAHEAD_CHUNKS, chunk_height)
    }

    /// Start over after a world reset. Returns the chunks to request up front.
    pub fn reset(&mut self) -> usize {
        self.requested = self.initial_chunks as u64;
        self.initial_chunks
    }

    /// Chunks requested since the last reset.
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Chunk index containing a world row. Rows above the surface count as
    /// chunk 0.
    pub fn chunk_of_row(&self, world_row: f64) -> u64 {
        (world_row.max(0.0) / self.chunk_height as f64).floor() as u64
    }

    /// How many more chunks to request now that the player is at
    /// `player_row`. Keeps at least `lookahead_chunks` requested past the
    /// player's chunk.
    pub fn update(&mut self, player_row: f64) -> usize {
        let wanted = self.chunk_of_row(player_row) + self.lookahead_chunks as u64;
        if wanted <= self.requested {
            return 0;
        }
        let more = wanted - self.requested;
        self.requested = wanted;
        more as usize
    }
}
