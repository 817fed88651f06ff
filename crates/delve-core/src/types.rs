use glam::IVec2;

/// Cell coordinate inside a chunk or padded window. Y grows downward (depth).
pub type CellCoord = IVec2;

/// Zero-based index of a chunk along the descent. Chunk `d` covers world rows
/// `d * height .. (d + 1) * height`.
pub type ChunkDepth = u64;
