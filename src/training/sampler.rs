// ============================================================
// Diagnostic Sampler
// ============================================================
// After an epoch, picks a few random training pairs, renders
// them back to text, translates the source side with the
// freshly saved checkpoint and logs
//
//   input / predicted output / actual output
//
// The sampler only holds read-only data (Arc'd corpus and
// vocabularies) plus a checkpoint path, so a task built from
// it can run on another thread while training continues.
// Failures are logged and swallowed.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::data::vocab::Vocabulary;
use crate::domain::aligned_pair::AlignedPair;
use crate::domain::traits::{Task, Translator};

/// One sampled pair with the model's translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleTriple {
    pub input:      String,
    pub reference:  String,
    pub prediction: String,
}

#[derive(Clone)]
pub struct DiagnosticSampler {
    pairs:        Arc<[AlignedPair]>,
    source_vocab: Arc<Vocabulary>,
    target_vocab: Arc<Vocabulary>,
    translator:   Arc<dyn Translator>,
    sample_size:  usize,
}

impl DiagnosticSampler {
    pub fn new(
        pairs:        Arc<[AlignedPair]>,
        source_vocab: Arc<Vocabulary>,
        target_vocab: Arc<Vocabulary>,
        translator:   Arc<dyn Translator>,
        sample_size:  usize,
    ) -> Self {
        Self { pairs, source_vocab, target_vocab, translator, sample_size }
    }

    /// Draw up to `sample_size` distinct pairs and translate them.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        checkpoint: &Path,
        rng:        &mut R,
    ) -> Result<Vec<SampleTriple>> {
        let picked: Vec<&AlignedPair> = self
            .pairs
            .choose_multiple(rng, self.sample_size)
            .collect();

        let inputs: Vec<String> = picked
            .iter()
            .map(|p| self.source_vocab.decode_line(&p.source))
            .collect();
        let references: Vec<String> = picked
            .iter()
            .map(|p| self.target_vocab.decode_line(&p.target))
            .collect();

        let predictions = self.translator.translate(checkpoint, &inputs)?;
        ensure!(
            predictions.len() == inputs.len(),
            "translator returned {} lines for {} inputs",
            predictions.len(),
            inputs.len()
        );

        Ok(inputs
            .into_iter()
            .zip(references)
            .zip(predictions)
            .map(|((input, reference), prediction)| SampleTriple { input, reference, prediction })
            .collect())
    }

    /// Sample, log the result, and swallow any failure.
    pub fn sample_and_log<R: Rng + ?Sized>(&self, checkpoint: &Path, epoch: usize, rng: &mut R) {
        match self.sample(checkpoint, rng) {
            Ok(triples) => {
                tracing::info!("Sampled translations after epoch {}.", epoch);
                for t in &triples {
                    tracing::info!("{}", "-".repeat(30));
                    tracing::info!("Input:\t\t{}", t.input);
                    tracing::info!("Predicted output:\t{}", t.prediction);
                    tracing::info!("Actual output:\t{}", t.reference);
                }
                tracing::info!("{}", "-".repeat(30));
            }
            Err(e) => {
                tracing::warn!("Sampling translations after epoch {} failed: {:#}", epoch, e);
            }
        }
    }

    /// Package one sampling round as a detached task.
    pub fn task(&self, checkpoint: PathBuf, epoch: usize, seed: u64) -> Task {
        let sampler = self.clone();
        Box::new(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            sampler.sample_and_log(&checkpoint, epoch, &mut rng);
        })
    }
}
