// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor code lives here and in infra::checkpoint. The
// training core only sees the traits these types implement.
//
//   model.rs      — encoder-decoder transformer
//                   • source / target / position embeddings
//                   • encoder self-attention blocks
//                   • decoder blocks: causal self-attention,
//                     cross-attention over encoder states
//                   • GELU feed-forward, post-norm residuals
//                   • pad-masked cross-entropy loss
//
//   graph.rs      — ComputeGraph: forward, backward and
//                   optimiser step on an autodiff backend
//
//   scorer.rs     — Scorer: mean loss of a saved checkpoint on
//                   a held-out corpus
//
//   inferencer.rs — Translator: greedy decoding with a saved
//                   checkpoint
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Encoder-decoder transformer architecture
pub mod model;

/// Per-batch parameter updates
pub mod graph;

/// Held-out loss of a checkpoint
pub mod scorer;

/// Greedy translation with a checkpoint
pub mod inferencer;
