pub mod chunk;
pub mod config;
pub mod constants;
pub mod direction;
pub mod error;
pub mod grid;
pub mod types;

pub use chunk::{CaveChunk, ChunkStats, Tile};
pub use config::{CaveConfig, ConfigIssue, NoiseKind, SurfaceKind};
pub use error::ConfigError;
pub use grid::DensityGrid;
