//! cellring - Ring-buffered 2-D cellular automaton engine.
//!
//! A grid of cells evolves continuously under a local update rule on a pool
//! of background workers while a separate consumer reads coherent snapshots
//! for rendering and an input actor injects localized erase edits. The ring
//! holds several temporally-staggered copies of the logical grid, giving
//! writers headroom to race ahead of the slowest reader; the
//! baseline/snapshot protocol keeps the reader one fully-elapsed generation
//! behind the write frontier without locks.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration types and validation
//! - `compute`: Ring-buffered grid, update rules, worker pool, scheduler
//!
//! # Example
//!
//! ```rust,no_run
//! use cellring::{
//!     compute::{GridStats, SimulationScheduler, ToroidalGrid},
//!     schema::EngineConfig,
//! };
//!
//! let config = EngineConfig::default();
//! let mut scheduler = SimulationScheduler::new(&config.workers);
//! scheduler.set_model(ToroidalGrid::new(&config).expect("valid config"));
//!
//! scheduler.start();
//! let stats = GridStats::from_cells(scheduler.snapshot());
//! println!("active cells: {}", stats.active_cells);
//! scheduler.terminate();
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{
    Cell, GridStats, SimulationScheduler, ThreadExecutor, ToroidalGrid, WorkerPool, GROUND, WALL,
};
pub use schema::{ConfigError, EngineConfig, RuleKind, WorkerConfig};
