//! Simulation scheduler - Claim-based row scheduling over a worker pool,
//! plus the baseline/snapshot read protocol.
//!
//! Workers race ahead through the ring; the reader stays one fully-elapsed
//! generation behind the write frontier. The row cursor is the only atomic
//! carrying coordination duty; cell traffic stays relaxed and lock-free.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{trace, warn};

use super::{Cell, ToroidalGrid, WorkerPool, GROUND};
use crate::schema::WorkerConfig;

/// Log the claim counter once per this many ring cycles.
const PROGRESS_CYCLES: usize = 1000;

/// Drives a [`ToroidalGrid`] on a pool of row workers.
pub struct SimulationScheduler {
    pool: WorkerPool,
    line: Arc<AtomicUsize>,
    grid: Option<Arc<ToroidalGrid>>,
    scratch: Vec<Cell>,
}

impl SimulationScheduler {
    /// Scheduler with a pool sized per `config`.
    pub fn new(config: &WorkerConfig) -> Self {
        let pool = match config.threads {
            Some(threads) => WorkerPool::new(threads),
            None => WorkerPool::with_parallelism(config.power, config.reserved),
        };
        Self {
            pool,
            line: Arc::new(AtomicUsize::new(0)),
            grid: None,
            scratch: Vec::new(),
        }
    }

    /// Install the grid to drive and size the snapshot scratch buffer.
    ///
    /// Swapping the model while workers are running is undefined; terminate
    /// first.
    pub fn set_model(&mut self, grid: ToroidalGrid) {
        debug_assert!(!self.is_active(), "terminate before swapping grids");

        let size = grid.height * grid.width;
        if self.scratch.len() != size {
            self.scratch = vec![GROUND; size];
        }
        self.grid = Some(Arc::new(grid));
    }

    /// The grid currently driven, if any.
    pub fn model(&self) -> Option<&Arc<ToroidalGrid>> {
        self.grid.as_ref()
    }

    /// Spawn the row workers. Each worker claims rows by atomically
    /// incrementing the cursor; claims are race-free and gapless, while
    /// completion order across workers is unordered by design.
    pub fn start(&self) {
        let grid = match &self.grid {
            Some(grid) => Arc::clone(grid),
            None => {
                warn!("start called with no model installed");
                return;
            }
        };
        let line = Arc::clone(&self.line);
        let vertical = grid.vertical();
        let progress = vertical * PROGRESS_CYCLES;

        self.pool.start(move || {
            let claim = line.fetch_add(1, Ordering::Relaxed);
            grid.calculate(claim % vertical);

            if claim % progress == 0 {
                trace!("row claims: {claim}");
            }
        });
    }

    /// Start row of the most recent fully-elapsed generation behind the
    /// write frontier. Computed without synchronizing against in-flight
    /// writers; with `frames_per_cycle >= 2` the window is not targeted by
    /// the immediate next generation's workers.
    pub fn baseline(&self) -> usize {
        match &self.grid {
            Some(grid) => {
                let base = grid.frame(self.line.load(Ordering::Relaxed), -1);
                (base / grid.height) * grid.height
            }
            None => 0,
        }
    }

    /// Copy the baseline generation into the internal scratch buffer and
    /// return it: always exactly `height * width` cells. Lock-free; may
    /// observe the same benign per-cell races as any reader, but never a
    /// write from more than one generation in flight.
    pub fn snapshot(&mut self) -> &[Cell] {
        if let Some(grid) = &self.grid {
            let base = self.baseline() * grid.width;
            for (offset, slot) in self.scratch.iter_mut().enumerate() {
                *slot = grid.cell(base + offset);
            }
        }
        &self.scratch
    }

    /// Copy the baseline generation into a caller-owned buffer, for readers
    /// that share the scheduler behind an `Arc`. Resizes the buffer to
    /// `height * width` once.
    pub fn snapshot_into(&self, buffer: &mut Vec<Cell>) {
        if let Some(grid) = &self.grid {
            let size = grid.height * grid.width;
            if buffer.len() != size {
                buffer.resize(size, GROUND);
            }
            let base = self.baseline() * grid.width;
            for (offset, slot) in buffer.iter_mut().enumerate() {
                *slot = grid.cell(base + offset);
            }
        }
    }

    /// Total rows claimed so far.
    pub fn claims(&self) -> usize {
        self.line.load(Ordering::Relaxed)
    }

    /// Signal the workers and block until they return. Idempotent,
    /// best-effort.
    pub fn terminate(&self) {
        self.pool.terminate();
    }

    pub fn is_active(&self) -> bool {
        self.pool.is_active()
    }
}
