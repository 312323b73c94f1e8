/// Q-learning algorithm and trainer
pub mod algo;

/// Environment traits and episode statistics
pub mod env;

/// Grid map parsing and rendering
pub mod grid;

/// The grid world environment
pub mod gridworld;

mod util;
