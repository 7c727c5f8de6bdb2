//! Compute module - Ring-buffered grid, update rules, and the worker machinery.

mod grid;
mod pool;
mod rule;
mod scheduler;

pub use grid::*;
pub use pool::*;
pub use rule::*;
pub use scheduler::*;
