// ============================================================
// Layer 3 — AlignedPair Domain Type
// ============================================================
// One training example: the id sequence of a source sentence
// and the id sequence of its translation. Neither side carries
// an end marker; the batcher adds start/end markers when it
// builds decoder inputs and targets.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedPair {
    pub source: Vec<u32>,
    pub target: Vec<u32>,
}

impl AlignedPair {
    pub fn new(source: Vec<u32>, target: Vec<u32>) -> Self {
        Self { source, target }
    }

    /// True when both sides have at most `max_len` tokens
    pub fn fits(&self, max_len: usize) -> bool {
        self.source.len() <= max_len && self.target.len() <= max_len
    }
}
