// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Concerns shared by several layers:
//
//   checkpoint.rs — single-slot model persistence
//                   CompactRecorder weights plus the model
//                   config as JSON, so scoring and translation
//                   can rebuild the architecture.
//
//   metrics.rs    — one CSV row per finished epoch
//
//   spawner.rs    — where detached diagnostic tasks run
//                   (rayon pool, or inline for tests)
//
//   logging.rs    — tracing subscriber for the binary:
//                   stderr plus <log_to>/training.log
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Detached task execution
pub mod spawner;

/// Global tracing subscriber setup
pub mod logging;
