// ============================================================
// Layer 2 — ScoreUseCase
// ============================================================
// Loss and perplexity of a trained model on a parallel corpus,
// using the same scorer that drives validation during training.

use std::path::{Path, PathBuf};

use anyhow::Result;
use burn::prelude::Backend;

use crate::domain::constants::MODEL_FILENAME;
use crate::ml::scorer::score_checkpoint;

type InferBackend = burn::backend::Wgpu;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreReport {
    pub loss:       f64,
    pub perplexity: f64,
}

pub struct ScoreUseCase {
    load_from:  PathBuf,
    batch_size: usize,
}

impl ScoreUseCase {
    pub fn new(load_from: PathBuf, batch_size: usize) -> Self {
        Self { load_from, batch_size }
    }

    pub fn execute(&self, source: &Path, target: &Path) -> Result<ScoreReport> {
        self.score_on::<InferBackend>(Default::default(), source, target)
    }

    pub fn score_on<B: Backend>(
        &self,
        device: B::Device,
        source: &Path,
        target: &Path,
    ) -> Result<ScoreReport> {
        let slot = self.load_from.join(MODEL_FILENAME);
        let loss = score_checkpoint::<B>(device, self.batch_size, source, target, &slot)?;
        Ok(ScoreReport { loss, perplexity: loss.exp() })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untrained_directory_cannot_be_scored() {
        let dir  = tempfile::tempdir().unwrap();
        let data = dir.path().join("val.txt");
        std::fs::write(&data, "a\n").unwrap();

        let use_case = ScoreUseCase::new(dir.path().to_path_buf(), 8);
        assert!(use_case
            .score_on::<burn::backend::NdArray>(Default::default(), &data, &data)
            .is_err());
    }
}
