use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::constants::{OPEN_DENSITY, ROCK_DENSITY};
use crate::direction::FACE_DIRECTIONS;
use crate::grid::DensityGrid;
use crate::types::ChunkDepth;

/// Final binary cell state handed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Tile {
    #[default]
    Rock = 0,
    Air = 1,
}

impl Tile {
    pub fn is_open(self) -> bool {
        self == Tile::Air
    }
}

/// What happened while carving one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChunkStats {
    /// Live moles once carving finished.
    pub agents: usize,
    /// Moles that carved all the way to the bottom row.
    pub reached_bottom: usize,
    /// Moles that died after running into another tunnel.
    pub merged: usize,
    /// Moles spawned during carving.
    pub spawned: usize,
    /// Moles that blew their step budget and were forced straight down.
    pub forced_descents: usize,
    /// Open cells in the emitted grid.
    pub open_cells: usize,
}

impl ChunkStats {
    /// Fold another carving pass into these counts.
    pub fn absorb(&mut self, other: &ChunkStats) {
        self.reached_bottom += other.reached_bottom;
        self.merged += other.merged;
        self.spawned += other.spawned;
        self.forced_descents += other.forced_descents;
        self.agents = other.agents;
    }
}

/// A finished `width × height` chunk of binary terrain, tagged with its depth.
/// Immutable once emitted; ownership moves to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct CaveChunk {
    depth: ChunkDepth,
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
    stats: ChunkStats,
}

impl CaveChunk {
    /// Threshold a smoothed density grid into tiles.
    pub fn from_density(
        depth: ChunkDepth,
        grid: &DensityGrid,
        air_threshold: f32,
        mut stats: ChunkStats,
    ) -> Self {
        let tiles: Vec<Tile> = grid
            .cells()
            .iter()
            .map(|&d| if d >= air_threshold { Tile::Air } else { Tile::Rock })
            .collect();
        stats.open_cells = tiles.iter().filter(|t| t.is_open()).count();
        Self {
            depth,
            width: grid.width(),
            height: grid.height(),
            tiles,
            stats,
        }
    }

    pub fn depth(&self) -> ChunkDepth {
        self.depth
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stats(&self) -> &ChunkStats {
        &self.stats
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// World row of this chunk's first row.
    pub fn world_row_offset(&self) -> u64 {
        self.depth * self.height as u64
    }

    pub fn tile(&self, x: usize, y: usize) -> Tile {
        self.tiles[y * self.width + x]
    }

    pub fn is_open(&self, x: usize, y: usize) -> bool {
        self.tile(x, y).is_open()
    }

    pub fn row(&self, y: usize) -> &[Tile] {
        let start = y * self.width;
        &self.tiles[start..start + self.width]
    }

    /// Back to a 0/1 density grid, for re-smoothing or stitching checks.
    pub fn to_density(&self) -> DensityGrid {
        let mut grid = DensityGrid::new(self.width, self.height);
        for (cell, tile) in grid.cells_mut().iter_mut().zip(&self.tiles) {
            *cell = if tile.is_open() {
                OPEN_DENSITY
            } else {
                ROCK_DENSITY
            };
        }
        grid
    }

    /// `#` for rock, `.` for air, one line per row.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for tile in self.row(y) {
                out.push(if tile.is_open() { '.' } else { '#' });
            }
            out.push('\n');
        }
        out
    }

    /// Whether a `clearance × clearance` body can move from the top row to
    /// the bottom row through open cells using face steps.
    pub fn has_vertical_path(&self, clearance: usize) -> bool {
        let c = clearance.max(1);
        if c > self.width || c > self.height {
            return false;
        }
        let box_w = self.width - c + 1;
        let box_h = self.height - c + 1;

        let fits = |bx: usize, by: usize| -> bool {
            (by..by + c).all(|y| (bx..bx + c).all(|x| self.is_open(x, y)))
        };

        let mut visited = vec![false; box_w * box_h];
        let mut queue = VecDeque::new();
        for bx in 0..box_w {
            if fits(bx, 0) {
                visited[bx] = true;
                queue.push_back((bx, 0usize));
            }
        }

        while let Some((bx, by)) = queue.pop_front() {
            if by == box_h - 1 {
                return true;
            }
            for dir in FACE_DIRECTIONS {
                let off = dir.offset();
                let nx = bx as i32 + off.x;
                let ny = by as i32 + off.y;
                if nx < 0 || ny < 0 || nx >= box_w as i32 || ny >= box_h as i32 {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                let idx = ny * box_w + nx;
                if !visited[idx] && fits(nx, ny) {
                    visited[idx] = true;
                    queue.push_back((nx, ny));
                }
            }
        }

        false
    }
}
