// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that define the vocabulary of
// the system:
//
//   constants    — reserved ids, file names, defaults
//   aligned_pair — one source/target id-sequence pair
//   traits       — seams to the model, checkpoints, scoring,
//                  translation and background workers
//
// No burn types and no file I/O in this layer.

pub mod constants;

pub mod aligned_pair;

pub mod traits;
