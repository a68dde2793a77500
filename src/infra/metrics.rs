// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per finished epoch to <log_to>/metrics.csv
//
//   epoch,batches,train_loss,perplexity,val_loss,promoted
//   1,5,2.310000,10.074425,2.250000,true
//   2,5,1.980000,7.242743,2.400000,false
//   3,5,1.710000,5.528961,,true
//
// val_loss is empty on epochs without validation. The file
// is appended to across runs; the header is written only when
// the file is new.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::domain::constants::METRICS_FILENAME;
use crate::training::orchestrator::EpochSummary;

const HEADER: &str = "epoch,batches,train_loss,perplexity,val_loss,promoted";

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Open (or create) the metrics file inside `dir`.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create log directory '{}'", dir.display()))?;

        let csv_path = dir.join(METRICS_FILENAME);
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochSummary) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let val_loss = m
            .validation
            .map(|v| format!("{:.6}", v.loss))
            .unwrap_or_default();

        writeln!(
            f,
            "{},{},{:.6},{:.6},{},{}",
            m.epoch, m.batches, m.mean_loss, m.perplexity, val_loss, m.promoted,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
