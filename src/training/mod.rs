// ============================================================
// Layer 5 — Training Core
// ============================================================
// The backend-agnostic training control process. It drives
// the collaborators declared in domain::traits and never
// imports burn:
//
//   config         — TrainConfig, defaults and validation
//   early_stopping — best-loss / patience bookkeeping
//   sampler        — detached post-epoch translation samples
//   orchestrator   — the INIT → EPOCH* → DONE/TERMINATED loop

pub mod config;

pub mod early_stopping;

pub mod sampler;

pub mod orchestrator;
