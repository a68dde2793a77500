// ============================================================
// Layer 3 — Core Traits (Collaborator Seams)
// ============================================================
// The training orchestrator never touches tensors, files of
// model weights, or decoding loops directly. It talks to four
// collaborators through these traits:
//
//   ComputeGraph    — one parameter update per batch
//   CheckpointStore — single-slot snapshot of parameters
//   Scorer          — loss of a saved checkpoint on held-out data
//   Translator      — translations from a saved checkpoint
//
// A fifth trait, TaskSpawner, decides where detached work runs.
//
// The burn-backed implementations live in Layer 5 (ml) and
// Layer 6 (infra); tests substitute in-memory stubs.

use std::path::Path;

use anyhow::Result;

use crate::data::batcher::Batch;

// ─── ComputeGraph ─────────────────────────────────────────────────────────────
/// A trainable model that is built once and reused for every batch.
pub trait ComputeGraph {
    /// Snapshot of the trainable parameters handed to a CheckpointStore
    type Params;

    /// Run forward, backward and one optimiser step on `batch`.
    /// Returns the scalar training loss of the batch.
    fn update(&mut self, batch: &Batch) -> Result<f64>;

    /// Current parameters, detached from further updates
    fn params(&self) -> Self::Params;
}

/// Shape information a ComputeGraph is constructed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphSpec {
    pub source_vocab_size: usize,
    pub target_vocab_size: usize,
    pub batch_size:        usize,
}

// ─── CheckpointStore ──────────────────────────────────────────────────────────
/// Persists parameters to a single slot. Every save at the same
/// path overwrites the previous snapshot.
pub trait CheckpointStore<P> {
    fn save(&self, params: &P, path: &Path) -> Result<()>;

    fn restore(&self, path: &Path) -> Result<P>;
}

// ─── Scorer ───────────────────────────────────────────────────────────────────
/// Computes the loss of the checkpoint at `checkpoint` on a
/// line-aligned held-out corpus.
pub trait Scorer {
    fn score(&self, source: &Path, target: &Path, checkpoint: &Path) -> Result<f64>;
}

// ─── Translator ───────────────────────────────────────────────────────────────
/// Translates whitespace-tokenised lines with a saved checkpoint.
///
/// Send + Sync because the diagnostic sampler calls it from a
/// detached worker.
pub trait Translator: Send + Sync {
    fn translate(&self, checkpoint: &Path, lines: &[String]) -> Result<Vec<String>>;
}

// ─── TaskSpawner ──────────────────────────────────────────────────────────────
/// A fire-and-forget unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs detached tasks. Implementations never report the task's
/// outcome back to the caller.
pub trait TaskSpawner {
    fn spawn(&self, task: Task);
}
