// ============================================================
// Training Configuration
// ============================================================
// All parameters of one training run. Serialisable so the run
// can be recorded next to the model it produced.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::constants::{
    LOGGING_INTERVAL, MAX_LEN, NUM_RESERVED, PATIENCE, SAMPLE_SIZE, SOURCE_VOCAB_SIZE,
    TARGET_VOCAB_SIZE, VAL_EPOCHS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub source_data:           PathBuf,
    pub target_data:           PathBuf,
    pub epochs:                usize,
    pub batch_size:            usize,
    pub source_vocab_max_size: usize,
    pub target_vocab_max_size: usize,
    /// Model directory: vocabularies, main checkpoint, `val/` probe slot
    pub save_to:               PathBuf,
    /// Log directory: training.log and metrics.csv
    pub log_to:                PathBuf,
    pub sample_after_epoch:    bool,
    pub source_val_data:       Option<PathBuf>,
    pub target_val_data:       Option<PathBuf>,
    /// Validate every `val_epochs` epochs
    pub val_epochs:            usize,
    /// Consecutive non-improving validation rounds before stopping
    pub patience:              usize,
    /// Pairs with more tokens than this on either side are dropped
    pub max_len:               usize,
    /// Emit a throughput line every `logging_interval` batches
    pub logging_interval:      usize,
    /// Pairs translated by the diagnostic sampler
    pub sample_size:           usize,
    /// Fixed seed for batch shuffling and sampling; random when None
    pub seed:                  Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            source_data:           PathBuf::from("train.src"),
            target_data:           PathBuf::from("train.tgt"),
            epochs:                10,
            batch_size:            64,
            source_vocab_max_size: SOURCE_VOCAB_SIZE,
            target_vocab_max_size: TARGET_VOCAB_SIZE,
            save_to:               PathBuf::from("model"),
            log_to:                PathBuf::from("logs"),
            sample_after_epoch:    false,
            source_val_data:       None,
            target_val_data:       None,
            val_epochs:            VAL_EPOCHS,
            patience:              PATIENCE,
            max_len:               MAX_LEN,
            logging_interval:      LOGGING_INTERVAL,
            sample_size:           SAMPLE_SIZE,
            seed:                  None,
        }
    }
}

impl TrainConfig {
    /// Held-out corpora, when both sides were supplied
    pub fn validation_data(&self) -> Option<(&Path, &Path)> {
        match (&self.source_val_data, &self.target_val_data) {
            (Some(src), Some(tgt)) => Some((src.as_path(), tgt.as_path())),
            _ => None,
        }
    }

    /// Reject settings the training loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            bail!("epochs must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.val_epochs == 0 {
            bail!("val_epochs must be at least 1");
        }
        if self.patience == 0 {
            bail!("patience must be at least 1");
        }
        if self.max_len == 0 {
            bail!("max_len must be at least 1");
        }
        if self.logging_interval == 0 {
            bail!("logging_interval must be at least 1");
        }
        for (side, size) in [
            ("source", self.source_vocab_max_size),
            ("target", self.target_vocab_max_size),
        ] {
            if size < NUM_RESERVED {
                bail!("{side} vocabulary max size {size} cannot hold the {NUM_RESERVED} reserved symbols");
            }
        }
        if self.source_val_data.is_some() != self.target_val_data.is_some() {
            bail!("validation needs both a source and a target file");
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}
