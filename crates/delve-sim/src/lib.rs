pub mod muncher;

mod buffers;

pub use muncher::{count_open_neighbours, munch_pass, Muncher, MuncherRules};
