// ============================================================
// Layer 6 — Task Spawners
// ============================================================
// Where detached diagnostic tasks run.
//
//   DetachedPool  — a dedicated rayon pool; spawn returns at
//                   once and nobody ever joins the task. Queued
//                   or running tasks may outlive the epoch, the
//                   training loop and even the process.
//   InlineSpawner — runs the task on the caller's thread before
//                   returning, so its effects are observable.
//
// A panic inside a pooled task is caught and logged by the
// pool's panic handler; the training loop never sees it.

use anyhow::{Context, Result};

use crate::domain::traits::{Task, TaskSpawner};

pub struct DetachedPool {
    pool: rayon::ThreadPool,
}

impl DetachedPool {
    pub fn new(num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("diagnostics-{i}"))
            .panic_handler(|_| tracing::warn!("Diagnostic task panicked"))
            .build()
            .context("Cannot start diagnostic worker pool")?;
        Ok(Self { pool })
    }
}

impl TaskSpawner for DetachedPool {
    fn spawn(&self, task: Task) {
        self.pool.spawn(task);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InlineSpawner;

impl TaskSpawner for InlineSpawner {
    fn spawn(&self, task: Task) {
        task();
    }
}
