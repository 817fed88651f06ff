use glam::IVec2;

/// One of 8 neighbour directions in a 2D grid (4 faces + 4 corners).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    // 4 face neighbours
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
    // 4 corner neighbours
    UpLeft = 4,
    UpRight = 5,
    DownLeft = 6,
    DownRight = 7,
}

/// All 8 directions.
pub const ALL_DIRECTIONS: [Direction; 8] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
    Direction::UpLeft,
    Direction::UpRight,
    Direction::DownLeft,
    Direction::DownRight,
];

/// Face directions used for walkability searches.
pub const FACE_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

/// Offsets of all 8 neighbours, in `ALL_DIRECTIONS` order.
/// Kept as a table so the automaton inner loop avoids the match.
pub const NEIGHBOUR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

impl Direction {
    /// Offset vector for this direction. Y-down convention: Down = (0, 1).
    pub fn offset(self) -> IVec2 {
        let (x, y) = NEIGHBOUR_OFFSETS[self as usize];
        IVec2::new(x, y)
    }
}
