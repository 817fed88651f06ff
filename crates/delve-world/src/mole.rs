//! Tunnel-digging agents ("moles").
//!
//! Each mole random-walks down through a chunk's density grid, carving a hole
//! as it goes. Moles may spawn children, die when they run into an existing
//! tunnel, and carry their column and heading from one chunk into the next.

use delve_core::config::CaveConfig;
use delve_core::constants::{
    OPEN_DENSITY, STRAIGHT_RUN_LIMIT, STRAIGHT_RUN_NUDGE_DECAY, WALL_REBOUND_HEADING,
};
use delve_core::grid::DensityGrid;
use delve_core::types::{CellCoord, ChunkDepth};
use delve_core::ChunkStats;

use crate::rng::RandomSource;

pub type MoleId = u64;

/// Mole tuning, resolved once from the config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoleParams {
    pub chunk_width: i32,
    pub chunk_height: i32,
    pub side_margin: i32,
    pub start_count: usize,
    pub max_moles: usize,
    pub spawn_chance: f32,
    pub merge_chance: f32,
    pub hole_width: i32,
    pub hole_falloff: f32,
    pub previous_dir_mult: f32,
    pub use_normal_dist: bool,
    pub normal_sigma: f32,
    pub step_budget: u32,
}

impl MoleParams {
    pub fn from_config(config: &CaveConfig) -> Self {
        Self {
            chunk_width: config.chunk_width as i32,
            chunk_height: config.chunk_height as i32,
            side_margin: config.side_margin as i32,
            start_count: config.mole_start_count,
            max_moles: config.max_moles,
            spawn_chance: config.mole_spawn_chance,
            merge_chance: config.mole_merge_chance,
            hole_width: config.mole_hole_width,
            hole_falloff: config.mole_hole_falloff,
            previous_dir_mult: config.mole_previous_dir_mult,
            use_normal_dist: config.mole_use_normal_dist,
            normal_sigma: config.mole_normal_sigma,
            step_budget: config.mole_step_budget,
        }
    }

    /// Leftmost column a mole centre may occupy.
    fn min_x(&self) -> i32 {
        self.side_margin + self.hole_width
    }

    /// Rightmost column a mole centre may occupy.
    fn max_x(&self) -> i32 {
        self.chunk_width - self.side_margin - self.hole_width - 1
    }

    /// Density written at distance 1..hole_width from the hole centre.
    fn falloff_density(&self) -> f32 {
        1.0 - self.hole_width as f32 * self.hole_falloff
    }
}

/// Which way a mole moved on one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Left,
    Down,
    Right,
    Stay,
}

impl Step {
    /// Bucket a heading. Boundaries are exclusive, so a heading of exactly
    /// ±0.5 or anything outside (-1, 1) does not move.
    pub fn from_heading(heading: f32) -> Self {
        if heading > -1.0 && heading < -0.5 {
            Step::Left
        } else if heading > -0.5 && heading < 0.5 {
            Step::Down
        } else if heading > 0.5 && heading < 1.0 {
            Step::Right
        } else {
            Step::Stay
        }
    }

    pub fn is_sideways(self) -> bool {
        matches!(self, Step::Left | Step::Right)
    }
}

/// One digging agent. `pos.y` is relative to the chunk being carved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mole {
    id: MoleId,
    pos: CellCoord,
    heading: f32,
    straight_run: u32,
}

impl Mole {
    fn new(id: MoleId, pos: CellCoord) -> Self {
        Self {
            id,
            pos,
            heading: 0.0,
            straight_run: 0,
        }
    }

    pub fn id(&self) -> MoleId {
        self.id
    }

    pub fn pos(&self) -> CellCoord {
        self.pos
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    /// Keep the whole hole inside the side margins, bouncing the heading
    /// back toward the middle on contact.
    fn clamp_to_walls(&mut self, params: &MoleParams) {
        if self.pos.x <= params.min_x() {
            self.pos.x = params.min_x();
            self.heading = WALL_REBOUND_HEADING;
        } else if self.pos.x >= params.max_x() {
            self.pos.x = params.max_x();
            self.heading = -WALL_REBOUND_HEADING;
        }
        if self.pos.y < 0 {
            self.pos.y = 0;
        }
    }

    /// Open the hole on the current row and the row above it.
    fn carve(&self, grid: &mut DensityGrid, params: &MoleParams) {
        carve_row(grid, self.pos.x, self.pos.y, params);
        if self.pos.y > 0 {
            carve_row(grid, self.pos.x, self.pos.y - 1, params);
        }
    }

    /// Whether the mole is about to run into an existing tunnel and loses
    /// the merge roll. The roll is only drawn when a tunnel is found.
    fn hits_tunnel(&self, grid: &DensityGrid, params: &MoleParams, rng: &mut RandomSource) -> bool {
        if self.pos.y >= params.chunk_height - 1 {
            return false;
        }
        let below = self.pos.y + 1;
        let found = [self.pos.x - params.hole_width, self.pos.x + params.hole_width]
            .into_iter()
            .any(|x| {
                grid.get(CellCoord::new(x, below))
                    .is_some_and(|d| d >= OPEN_DENSITY)
            });
        found && rng.randf() < params.merge_chance
    }

    /// Pick a heading and take one step.
    fn tunnel(&mut self, params: &MoleParams, rng: &mut RandomSource) -> Step {
        let sample = if params.use_normal_dist {
            rng.randfn(0.0, params.normal_sigma)
        } else {
            rng.randf() * 2.0 - 1.0
        };
        self.heading = sample + self.heading * params.previous_dir_mult;

        let step = Step::from_heading(self.heading);
        match step {
            Step::Left => {
                self.pos.x -= 1;
                self.straight_run = self.straight_run.saturating_sub(1);
            }
            Step::Right => {
                self.pos.x += 1;
                self.straight_run = self.straight_run.saturating_sub(1);
            }
            Step::Down => {
                self.pos.y += 1;
                self.straight_run += 1;
                if self.straight_run >= STRAIGHT_RUN_LIMIT {
                    // Break up long vertical shafts, drifting away from the
                    // nearer wall.
                    self.pos.x += if self.pos.x < params.chunk_width / 2 { 1 } else { -1 };
                    self.straight_run -= STRAIGHT_RUN_NUDGE_DECAY;
                }
            }
            Step::Stay => {}
        }
        step
    }
}

fn carve_row(grid: &mut DensityGrid, x: i32, y: i32, params: &MoleParams) {
    grid.set(CellCoord::new(x, y), OPEN_DENSITY);
    let edge = params.falloff_density();
    for i in 1..params.hole_width {
        grid.set(CellCoord::new(x - i, y), edge);
        grid.set(CellCoord::new(x + i, y), edge);
    }
}

/// The live moles. Order is creation order and decides processing order.
#[derive(Debug, Clone, Default)]
pub struct MolePopulation {
    moles: Vec<Mole>,
    next_id: MoleId,
}

impl MolePopulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.moles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mole> {
        self.moles.iter()
    }

    pub fn clear(&mut self) {
        self.moles.clear();
        self.next_id = 0;
    }

    /// Add the starting moles in the left half of the chunk.
    pub fn populate(&mut self, params: &MoleParams, rng: &mut RandomSource) {
        let half = (params.chunk_width / 2).max(1) as u32;
        for _ in 0..params.start_count {
            let x = (rng.randu32() % half) as i32;
            self.spawn(CellCoord::new(x, 0));
        }
    }

    /// Move every mole back to the top row before carving the next chunk.
    /// Columns and headings carry over.
    pub fn rewind_to_top(&mut self) {
        for mole in &mut self.moles {
            mole.pos.y = 0;
        }
    }

    /// Run every mole through `grid` once. Moles spawned along the way dig
    /// immediately and also carry into later chunks.
    pub fn dig_chunk(
        &mut self,
        grid: &mut DensityGrid,
        params: &MoleParams,
        rng: &mut RandomSource,
        depth: ChunkDepth,
    ) -> ChunkStats {
        let mut stats = ChunkStats::default();
        if params.hole_width <= 0 {
            stats.agents = self.len();
            return stats;
        }
        if self.moles.is_empty() && params.start_count > 0 {
            log::warn!("Mole population empty at chunk {depth}; repopulating");
            self.populate(params, rng);
        }

        let ids: Vec<MoleId> = self.moles.iter().map(|m| m.id).collect();
        for id in ids {
            self.dig(id, grid, params, rng, &mut stats, depth);
        }
        stats.agents = self.len();
        stats
    }

    fn spawn(&mut self, pos: CellCoord) -> MoleId {
        let id = self.next_id;
        self.next_id += 1;
        self.moles.push(Mole::new(id, pos));
        id
    }

    fn find(&self, id: MoleId) -> Option<usize> {
        self.moles.iter().position(|m| m.id == id)
    }

    fn store(&mut self, mole: Mole) {
        if let Some(index) = self.find(mole.id) {
            self.moles[index] = mole;
        }
    }

    /// Whether a mole that just carved may spawn a child. Never right after
    /// a sideways step, and never past the population cap.
    fn may_spawn(&self, roll: f32, last_step: Step, params: &MoleParams) -> bool {
        roll < params.spawn_chance && self.len() < params.max_moles && !last_step.is_sideways()
    }

    /// Dig one mole until it leaves the bottom of the chunk or dies.
    ///
    /// A spawned child digs to completion before its parent takes another
    /// step. Parked parents wait on an explicit stack, so a long spawn chain
    /// costs heap rather than call depth.
    fn dig(
        &mut self,
        id: MoleId,
        grid: &mut DensityGrid,
        params: &MoleParams,
        rng: &mut RandomSource,
        stats: &mut ChunkStats,
        depth: ChunkDepth,
    ) {
        let Some(index) = self.find(id) else {
            return;
        };
        let mut stack = vec![DigFrame::new(self.moles[index])];
        while let Some(mut frame) = stack.pop() {
            if let DigOutcome::Spawned(child) =
                self.run_frame(&mut frame, grid, params, rng, stats, depth)
            {
                stack.push(frame);
                if let Some(index) = self.find(child) {
                    stack.push(DigFrame::new(self.moles[index]));
                }
            }
        }
    }

    /// Advance one mole until it finishes, dies, or spawns a child.
    fn run_frame(
        &mut self,
        frame: &mut DigFrame,
        grid: &mut DensityGrid,
        params: &MoleParams,
        rng: &mut RandomSource,
        stats: &mut ChunkStats,
        depth: ChunkDepth,
    ) -> DigOutcome {
        let id = frame.mole.id;
        loop {
            if !frame.awaiting_child {
                frame.mole.clamp_to_walls(params);
                if frame.mole.pos.y >= params.chunk_height {
                    stats.reached_bottom += 1;
                    self.store(frame.mole);
                    return DigOutcome::Finished;
                }
                frame.mole.carve(grid, params);

                // The roll is drawn even when the spawn is then declined.
                let roll = rng.randf();
                if self.may_spawn(roll, frame.last_step, params) {
                    let x = (rng.randu32() % params.chunk_width.max(1) as u32) as i32;
                    let child = self.spawn(CellCoord::new(x, frame.mole.pos.y));
                    stats.spawned += 1;
                    log::trace!("Mole {id} spawned mole {child} at row {}", frame.mole.pos.y);
                    frame.awaiting_child = true;
                    return DigOutcome::Spawned(child);
                }
            }
            frame.awaiting_child = false;

            let mole = &mut frame.mole;
            if mole.hits_tunnel(grid, params, rng) {
                if let Some(index) = self.find(id) {
                    self.moles.remove(index);
                }
                stats.merged += 1;
                log::trace!("Mole {id} merged at ({}, {})", mole.pos.x, mole.pos.y);
                return DigOutcome::Finished;
            }

            if !frame.forced && frame.steps >= params.step_budget {
                frame.forced = true;
                stats.forced_descents += 1;
                log::warn!(
                    "Mole {id} used {} steps in chunk {depth}; forcing it down",
                    frame.steps,
                );
            }
            frame.last_step = if frame.forced {
                mole.pos.y += 1;
                Step::Down
            } else {
                mole.tunnel(params, rng)
            };
            frame.steps += 1;
        }
    }
}

/// A mole partway through a chunk. `awaiting_child` marks a frame parked
/// right after spawning; it resumes at the merge check.
struct DigFrame {
    mole: Mole,
    last_step: Step,
    steps: u32,
    forced: bool,
    awaiting_child: bool,
}

impl DigFrame {
    fn new(mole: Mole) -> Self {
        Self {
            mole,
            last_step: Step::Stay,
            steps: 0,
            forced: false,
            awaiting_child: false,
        }
    }
}

enum DigOutcome {
    Spawned(MoleId),
    Finished,
}
