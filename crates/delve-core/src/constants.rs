//! Single source of truth for generation defaults.
//! `CaveConfig::default()` is assembled from these values.

/// Chunk width in cells.
pub const DEFAULT_CHUNK_WIDTH: usize = 32;

/// Chunk height in cells.
pub const DEFAULT_CHUNK_HEIGHT: usize = 32;

/// Rows borrowed from each neighbouring chunk while smoothing.
pub const DEFAULT_CHUNK_PAD: usize = 8;

/// Density at or above which a cell reads as open.
pub const DEFAULT_AIR_THRESHOLD: f32 = 0.5;

/// Fully open density written by the mole at the centre of its hole.
pub const OPEN_DENSITY: f32 = 1.0;

/// Fully closed density.
pub const ROCK_DENSITY: f32 = 0.0;

/// Columns on each edge that are faded toward rock after carving.
pub const DEFAULT_SIDE_MARGIN: usize = 3;

/// Per-column fade factor applied inside the side margin.
pub const DEFAULT_SIDE_MARGIN_FADE: f32 = 0.1;

/// Moles created on reset.
pub const DEFAULT_MOLE_START_COUNT: usize = 2;

/// Population cap. Spawns at the cap are silently declined.
pub const DEFAULT_MAX_MOLES: usize = 8;

pub const DEFAULT_MOLE_SPAWN_CHANCE: f32 = 0.01;

/// Merging always kills the late mole by default; lower values leave more
/// parallel shafts.
pub const DEFAULT_MOLE_MERGE_CHANCE: f32 = 1.0;

/// Half-width of a carved hole. Below 3 the player gets stuck in places.
pub const DEFAULT_MOLE_HOLE_WIDTH: i32 = 3;

pub const DEFAULT_MOLE_HOLE_FALLOFF: f32 = 0.1;

/// How much of the previous heading carries into the next step.
pub const DEFAULT_MOLE_PREVIOUS_DIR_MULT: f32 = 0.6;

pub const DEFAULT_MOLE_NORMAL_SIGMA: f32 = 1.0;

/// Steps one mole may take inside one chunk before it is forced downward.
pub const DEFAULT_MOLE_STEP_BUDGET: u32 = 4096;

/// Consecutive straight-down steps before a mole is nudged sideways.
pub const STRAIGHT_RUN_LIMIT: u32 = 10;

/// Straight-run counter decrement applied after a nudge.
pub const STRAIGHT_RUN_NUDGE_DECAY: u32 = 2;

/// Heading forced onto a mole clamped against a side wall.
pub const WALL_REBOUND_HEADING: f32 = 0.75;

pub const DEFAULT_NOISE_FREQUENCY: f64 = 0.2;

/// Multiplier on raw noise before it is max-combined into the density field.
pub const DEFAULT_NOISE_STRENGTH: f32 = 3.5;

/// More passes give smoother walls and dominate generation time.
pub const DEFAULT_MUNCHER_ITERATIONS: u32 = 5;

/// Open neighbours an open cell needs to stay open.
pub const DEFAULT_MUNCHER_AIR_NEIGHBOURS: u32 = 4;

/// Open neighbours a closed cell needs to open.
pub const DEFAULT_MUNCHER_ROCK_NEIGHBOURS: u32 = 5;

/// Chunks requested right after a reset.
pub const DEFAULT_INITIAL_CHUNKS: usize = 4;

/// Chunks kept generated below the player.
pub const DEFAULT_LOOKAHEAD_CHUNKS: usize = 4;

/// Chunks kept in memory above the player before they are dropped.
pub const DEFAULT_RETAIN_CHUNKS: usize = 4;
