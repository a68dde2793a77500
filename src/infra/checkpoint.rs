// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores a Seq2SeqCheckpoint using Burn's
// CompactRecorder. A checkpoint slot is a path stem; each save
// overwrites both files of the slot:
//
//   <slot>.mpk   — model weights (MessagePack, half precision)
//   <slot>.json  — Seq2SeqConfig the weights were built from
//
// The config travels with the weights so a scorer or
// translator can rebuild the exact architecture before
// loading the record into it. Records are backend-agnostic:
// a slot written from the autodiff backend restores on the
// plain inference backend.
//
//   save_to/
//     model.mpk  model.json     ← main slot
//     val/
//       model.mpk  model.json   ← validation probe slot

use std::{
    fs,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::data::vocab::Vocabulary;
use crate::domain::constants::{SOURCE_VOCAB_FILENAME, TARGET_VOCAB_FILENAME};
use crate::domain::traits::CheckpointStore;
use crate::ml::model::{Seq2SeqCheckpoint, Seq2SeqConfig};

/// Single-slot checkpoint persistence for backend `B`.
pub struct CheckpointManager<B: Backend> {
    device:   B::Device,
    _backend: PhantomData<B>,
}

impl<B: Backend> CheckpointManager<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device, _backend: PhantomData }
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Path of the architecture config belonging to `slot`
    pub fn config_path(slot: &Path) -> PathBuf {
        slot.with_extension("json")
    }

    pub fn load_config(slot: &Path) -> Result<Seq2SeqConfig> {
        let path = Self::config_path(slot);
        Seq2SeqConfig::load(&path).map_err(|e| {
            anyhow::anyhow!(
                "Cannot read model config '{}': {e}. Has a model been trained into this slot?",
                path.display()
            )
        })
    }
}

/// Load the (source, target) vocabularies stored next to `slot`.
pub fn slot_vocabularies(slot: &Path) -> Result<(Vocabulary, Vocabulary)> {
    let dir = slot.parent().unwrap_or_else(|| Path::new(""));
    let source = Vocabulary::load(&dir.join(SOURCE_VOCAB_FILENAME))?;
    let target = Vocabulary::load(&dir.join(TARGET_VOCAB_FILENAME))?;
    Ok((source, target))
}

impl<B: Backend> CheckpointStore<Seq2SeqCheckpoint<B>> for CheckpointManager<B> {
    fn save(&self, params: &Seq2SeqCheckpoint<B>, slot: &Path) -> Result<()> {
        if let Some(dir) = slot.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        }

        CompactRecorder::new()
            .record(params.model.clone().into_record(), slot.to_path_buf())
            .with_context(|| format!("Failed to save checkpoint to '{}'", slot.display()))?;

        let config_path = Self::config_path(slot);
        params
            .config
            .save(&config_path)
            .with_context(|| format!("Cannot write model config to '{}'", config_path.display()))?;

        tracing::debug!("Saved checkpoint '{}'", slot.display());
        Ok(())
    }

    fn restore(&self, slot: &Path) -> Result<Seq2SeqCheckpoint<B>> {
        let config = Self::load_config(slot)?;

        let record = CompactRecorder::new()
            .load(slot.to_path_buf(), &self.device)
            .with_context(|| format!("Cannot load checkpoint '{}'", slot.display()))?;
        let model = config.init::<B>(&self.device).load_record(record);

        tracing::debug!("Restored checkpoint '{}'", slot.display());
        Ok(Seq2SeqCheckpoint { config, model })
    }
}
