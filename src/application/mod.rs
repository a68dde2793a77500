// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case wires concrete collaborators together for one
// command. No tensor math and no printing here.
//
//   train_use_case     — burn collaborators + Trainer
//   translate_use_case — greedy translation with a saved model
//   score_use_case     — held-out loss of a saved model
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Translation with a trained model
pub mod translate_use_case;

// Held-out scoring of a trained model
pub mod score_use_case;
