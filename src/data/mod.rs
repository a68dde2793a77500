// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw parallel text files and padded id
// matrices:
//
//   raw .src / .tgt files
//       │
//       ▼
//   Vocabulary      → word ↔ id table per side (built once)
//       │
//       ▼
//   reader          → line-aligned encoding + length filter
//       │
//       ▼
//   Vec<AlignedPair> (materialised once, read-only afterwards)
//       │
//       ▼
//   batcher         → shuffled, padded Batch per step
//
// Nothing here knows about burn; the ML layer turns a Batch
// into tensors.

/// Word ↔ id table with reserved special ids
pub mod vocab;

/// Reads line-aligned parallel files into id pairs
pub mod reader;

/// Builds padded teacher-forcing batches
pub mod batcher;
