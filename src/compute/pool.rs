//! Worker pool - Fixed-size long-lived threads with cooperative shutdown.
//!
//! Workers repeat a unit of work in a loop until `terminate` clears the
//! active flag. Cancellation is flag-based and checked once per iteration;
//! the loop body must not block, or shutdown will hang on the join.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

/// Fixed-size pool of long-lived worker threads.
pub struct WorkerPool {
    handles: Mutex<Vec<JoinHandle<()>>>,
    active: Arc<AtomicBool>,
    size: usize,
}

impl WorkerPool {
    /// Pool of exactly `threads` workers (floor 1).
    pub fn new(threads: usize) -> Self {
        Self {
            handles: Mutex::new(Vec::new()),
            active: Arc::new(AtomicBool::new(false)),
            size: threads.max(1),
        }
    }

    /// Pool sized as `floor(power * available_parallelism) - reserved`,
    /// floor 1.
    pub fn with_parallelism(power: f32, reserved: usize) -> Self {
        let available = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let threads = ((power * available as f32) as usize).saturating_sub(reserved);
        Self::new(threads)
    }

    /// Spawn the workers, each looping `work()` until terminated.
    /// Idempotent; a second call while active does nothing.
    pub fn start<F>(&self, work: F)
    where
        F: Fn() + Send + Clone + 'static,
    {
        if self.active.swap(true, Ordering::Relaxed) {
            return;
        }

        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        debug!("starting {} workers", self.size);
        for _ in 0..self.size {
            let active = Arc::clone(&self.active);
            let work = work.clone();
            handles.push(thread::spawn(move || {
                while active.load(Ordering::Relaxed) {
                    work();
                }
            }));
        }
    }

    /// Signal the workers to stop and block until every one has returned.
    /// Idempotent; shutdown is best-effort and a panicked worker is logged
    /// and abandoned rather than retried.
    pub fn terminate(&self) {
        if !self.active.swap(false, Ordering::Relaxed) {
            return;
        }

        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        debug!("terminating {} workers", handles.len());
        for handle in handles.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked; abandoning join");
            }
        }
    }

    /// Whether the pool is currently running.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Number of worker threads this pool spawns.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Hosts a caller-supplied loop body on a pool of its own, independent of
/// the simulation workers. Used to run the render/consumer loop as a
/// cancellable background actor.
pub struct ThreadExecutor<F>
where
    F: Fn() + Send + Clone + 'static,
{
    pool: WorkerPool,
    body: F,
}

impl<F> ThreadExecutor<F>
where
    F: Fn() + Send + Clone + 'static,
{
    pub fn new(body: F, threads: usize) -> Self {
        Self {
            pool: WorkerPool::new(threads),
            body,
        }
    }

    pub fn start(&self) {
        self.pool.start(self.body.clone());
    }

    pub fn terminate(&self) {
        self.pool.terminate();
    }

    pub fn is_active(&self) -> bool {
        self.pool.is_active()
    }
}
