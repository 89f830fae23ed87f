pub mod boxes;
pub mod pairpool;
pub mod universe;

pub use boxes::{dedup_boxes, normalize};
pub use pairpool::{distinct_permutations, generate_straights};
pub use universe::{enumerate_universe, universe, Universe, UNIVERSE_SIZE};
