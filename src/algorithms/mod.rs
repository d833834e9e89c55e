pub mod gravity;
pub mod pairs;

pub use gravity::Gravity;
pub use pairs::{combinations, PairSet};
