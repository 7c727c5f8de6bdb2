//! Configuration types for the automaton engine.

use serde::{Deserialize, Serialize};

/// Default frozen border thickness.
fn default_edge() -> usize {
    1
}

/// Default ring depth: how many temporally-staggered copies of the logical
/// grid the ring holds. Bounds how far simulation workers may outrun the
/// render baseline.
fn default_frames_per_cycle() -> usize {
    8
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Logical grid height in cells.
    pub height: usize,
    /// Logical grid width in cells.
    pub width: usize,
    /// Frozen border thickness; the outer `edge` rows/columns stay walls.
    #[serde(default = "default_edge")]
    pub edge: usize,
    /// Ring depth multiplier (power of two, at least 2).
    #[serde(default = "default_frames_per_cycle")]
    pub frames_per_cycle: usize,
    /// Active update rule.
    #[serde(default)]
    pub rule: RuleKind,
    /// Deterministic seed for the initial grid contents. None = entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Simulation worker pool sizing.
    #[serde(default)]
    pub workers: WorkerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            height: 256,
            width: 256,
            edge: default_edge(),
            frames_per_cycle: default_frames_per_cycle(),
            rule: RuleKind::default(),
            seed: None,
            workers: WorkerConfig::default(),
        }
    }
}

/// Update rule selection. Dispatch is resolved once per grid instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RuleKind {
    /// Discrete infection-spread rule.
    #[default]
    Infection,
    /// Continuous three-channel reaction rule.
    Reaction,
    /// Non-functional extension point; always returns ground state.
    Placeholder,
}

/// Worker pool sizing. `threads` wins when set; otherwise the count is
/// derived as `floor(power * available_parallelism) - reserved`, floor 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Explicit thread count.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Fraction of available parallelism to use.
    #[serde(default = "default_power")]
    pub power: f32,
    /// Cores to leave free (for the consumer/render thread).
    #[serde(default = "default_reserved")]
    pub reserved: usize,
}

fn default_power() -> f32 {
    1.0
}

fn default_reserved() -> usize {
    1
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: None,
            power: default_power(),
            reserved: default_reserved(),
        }
    }
}

impl EngineConfig {
    /// Physical ring height: `height * frames_per_cycle` rows.
    #[inline]
    pub fn vertical(&self) -> usize {
        self.height * self.frames_per_cycle
    }

    /// Validate configuration parameters.
    ///
    /// The per-row hot path performs no validation of its own, so a grid
    /// must never be constructed from a config this rejects.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.height == 0 || self.width == 0 {
            return Err(ConfigError::InvalidDimensions {
                height: self.height,
                width: self.width,
            });
        }
        if self.edge == 0 {
            // Rules read a 3x3 neighborhood; the frozen border is what keeps
            // the unchecked hot path inside the ring.
            return Err(ConfigError::ZeroEdge);
        }
        if 2 * self.edge >= self.height || 2 * self.edge >= self.width {
            return Err(ConfigError::EdgeTooLarge {
                edge: self.edge,
                height: self.height,
                width: self.width,
            });
        }
        if self.frames_per_cycle < 2 || !self.frames_per_cycle.is_power_of_two() {
            return Err(ConfigError::InvalidFramesPerCycle(self.frames_per_cycle));
        }
        if self.workers.threads == Some(0) || self.workers.power <= 0.0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid dimensions must be positive (height={height}, width={width})")]
    InvalidDimensions { height: usize, width: usize },
    #[error("Edge must be at least 1")]
    ZeroEdge,
    #[error("Edge {edge} leaves no interior in a {height}x{width} grid")]
    EdgeTooLarge {
        edge: usize,
        height: usize,
        width: usize,
    },
    #[error("frames_per_cycle must be a power of two >= 2, got {0}")]
    InvalidFramesPerCycle(usize),
    #[error("Worker count must be positive")]
    InvalidWorkerCount,
}
