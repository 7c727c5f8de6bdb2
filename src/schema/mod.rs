//! Schema module - Configuration types for the automaton engine.

mod config;

pub use config::*;
