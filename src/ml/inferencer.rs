// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Greedy translation with a saved checkpoint:
//
//   source ids ─► encode once
//   <bos> ─► decode ─► argmax of last position ─► append ─► …
//   stop at <eos>, at TRANSLATION_MAX_LEN words, or when the
//   decoder input would outgrow the position table.
//
// Sources longer than the position table keep their first
// max_positions words.

use std::path::Path;

use anyhow::Result;
use burn::prelude::*;

use crate::domain::constants::{BOS_ID, EOS_ID, PAD_ID, TRANSLATION_MAX_LEN};
use crate::domain::traits::{CheckpointStore, Translator};
use crate::infra::checkpoint::{slot_vocabularies, CheckpointManager};
use crate::ml::model::Seq2SeqModel;

pub struct Inferencer<B: Backend> {
    store: CheckpointManager<B>,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(device: B::Device) -> Self {
        Self { store: CheckpointManager::new(device) }
    }
}

impl<B: Backend> Translator for Inferencer<B> {
    fn translate(&self, checkpoint: &Path, lines: &[String]) -> Result<Vec<String>> {
        let (source_vocab, target_vocab) = slot_vocabularies(checkpoint)?;
        let restored = self.store.restore(checkpoint)?;
        let max_positions = restored.config.max_positions;

        let translations = lines
            .iter()
            .map(|line| {
                let mut source = source_vocab.encode_line(line);
                source.truncate(max_positions);
                let output = greedy_decode(
                    &restored.model,
                    &source,
                    TRANSLATION_MAX_LEN,
                    max_positions,
                    self.store.device(),
                );
                target_vocab.decode_line(&output)
            })
            .collect();
        Ok(translations)
    }
}

/// Translate one id sequence. Returns the generated target ids
/// without <bos> and <eos>.
pub fn greedy_decode<B: Backend>(
    model:         &Seq2SeqModel<B>,
    source:        &[u32],
    max_len:       usize,
    max_positions: usize,
    device:        &B::Device,
) -> Vec<u32> {
    // An empty source is encoded as a single, fully masked pad.
    let source: Vec<i32> = if source.is_empty() {
        vec![PAD_ID as i32]
    } else {
        source.iter().map(|&x| x as i32).collect()
    };
    let source_tensor = Tensor::<B, 1, Int>::from_ints(source.as_slice(), device).unsqueeze::<2>();
    let encoded = model.encode(source_tensor);

    let mut decoded: Vec<i32> = vec![BOS_ID as i32];
    while decoded.len() <= max_len && decoded.len() <= max_positions {
        let input  = Tensor::<B, 1, Int>::from_ints(decoded.as_slice(), device).unsqueeze::<2>();
        let logits = model.decode(input, &encoded);
        let [_, len, vocab] = logits.dims();

        let next = logits
            .slice([0..1, len - 1..len, 0..vocab])
            .reshape([vocab])
            .argmax(0)
            .into_scalar()
            .elem::<i64>() as i32;
        if next == EOS_ID as i32 {
            break;
        }
        decoded.push(next);
    }

    decoded[1..].iter().map(|&x| x as u32).collect()
}
