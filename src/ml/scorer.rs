// ============================================================
// Layer 5 — Scorer
// ============================================================
// Loss of a saved checkpoint on a held-out parallel corpus.
//
//   1. load the vocabularies stored next to the checkpoint
//   2. restore the model on the (non-autodiff) scoring backend
//   3. read the corpus, truncating each side instead of
//      dropping long pairs, so every line counts
//   4. mean cross-entropy over unshuffled batches
//
// Dropout is inactive here: burn only applies it on autodiff
// backends.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use burn::prelude::*;

use crate::data::{batcher::iterate, reader::read_truncated};
use crate::domain::constants::SCORE_MAX_LEN;
use crate::domain::traits::{CheckpointStore, Scorer};
use crate::infra::checkpoint::{slot_vocabularies, CheckpointManager};

pub struct BurnScorer<B: Backend> {
    store:      CheckpointManager<B>,
    batch_size: usize,
}

impl<B: Backend> BurnScorer<B> {
    pub fn new(device: B::Device, batch_size: usize) -> Self {
        Self { store: CheckpointManager::new(device), batch_size }
    }
}

impl<B: Backend> Scorer for BurnScorer<B> {
    fn score(&self, source: &Path, target: &Path, checkpoint: &Path) -> Result<f64> {
        ensure!(self.batch_size > 0, "Scoring batch size must be at least 1");
        let (source_vocab, target_vocab) = slot_vocabularies(checkpoint)?;
        let restored = self.store.restore(checkpoint)?;

        // target gets one extra position for <bos>/<eos>
        let max_len = SCORE_MAX_LEN.min(restored.config.max_positions.saturating_sub(1));
        let pairs = read_truncated(source, target, &source_vocab, &target_vocab, max_len)?;
        ensure!(
            !pairs.is_empty(),
            "No sentence pairs to score in '{}' / '{}'",
            source.display(),
            target.display()
        );

        let device = self.store.device();
        let mut rng = rand::thread_rng();
        let mut total_loss = 0.0f64;
        let mut batches    = 0usize;
        for batch in iterate(&pairs, self.batch_size, false, &mut rng) {
            let loss: f64 = restored
                .model
                .batch_loss(&batch, device)
                .into_scalar()
                .elem::<f64>();
            total_loss += loss;
            batches    += 1;
        }

        let mean = total_loss / batches as f64;
        tracing::debug!(
            "Scored {} pairs in {} batches from '{}': loss {:.4}",
            pairs.len(), batches, checkpoint.display(), mean
        );
        Ok(mean)
    }
}

/// Score a checkpoint from the command line.
pub fn score_checkpoint<B: Backend>(
    device:     B::Device,
    batch_size: usize,
    source:     &Path,
    target:     &Path,
    checkpoint: &Path,
) -> Result<f64> {
    BurnScorer::<B>::new(device, batch_size)
        .score(source, target, checkpoint)
        .with_context(|| format!("Cannot score checkpoint '{}'", checkpoint.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::data::vocab::Vocabulary;
    use crate::domain::constants::{SOURCE_VOCAB_FILENAME, TARGET_VOCAB_FILENAME};
    use crate::ml::model::{Seq2SeqCheckpoint, Seq2SeqConfig};

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_scores_saved_checkpoint() {
        let dir  = tempfile::tempdir().unwrap();
        let src  = dir.path().join("val.src");
        let tgt  = dir.path().join("val.tgt");
        fs::write(&src, "a b\nb a c\n").unwrap();
        fs::write(&tgt, "x y\ny\n").unwrap();

        let source_vocab = Vocabulary::build(["a b c"], 10);
        let target_vocab = Vocabulary::build(["x y"], 10);
        source_vocab.save(&dir.path().join(SOURCE_VOCAB_FILENAME)).unwrap();
        target_vocab.save(&dir.path().join(TARGET_VOCAB_FILENAME)).unwrap();

        let slot   = dir.path().join("model");
        let store  = CheckpointManager::<TestBackend>::new(Default::default());
        let config = Seq2SeqConfig::new(source_vocab.size(), target_vocab.size())
            .with_d_model(8)
            .with_num_heads(2)
            .with_num_layers(1)
            .with_d_ff(16)
            .with_max_positions(8);
        let model = config.init::<TestBackend>(store.device());
        store.save(&Seq2SeqCheckpoint { config, model }, &slot).unwrap();

        let loss = score_checkpoint::<TestBackend>(Default::default(), 1, &src, &tgt, &slot).unwrap();
        assert!(loss.is_finite() && loss > 0.0);
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let scorer = BurnScorer::<TestBackend>::new(Default::default(), 4);
        let slot = dir.path().join("model");
        assert!(scorer.score(&slot, &slot, &slot).is_err());
    }

    #[test]
    fn test_zero_batch_size_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let slot = dir.path().join("model");
        let err  = score_checkpoint::<TestBackend>(Default::default(), 0, &slot, &slot, &slot)
            .unwrap_err();
        assert!(format!("{err:#}").contains("batch size must be at least 1"));
    }
}
