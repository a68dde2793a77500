// ============================================================
// Layer 6 — Logging Setup
// ============================================================
// Installs the process-wide tracing subscriber. Only the binary
// calls `init`; library code just emits tracing events and spans.
//
//   stderr               — coloured, filtered by RUST_LOG
//                          (default: nmt_trainer=info)
//   <log_dir>/training.log — same events without ANSI codes,
//                          appended across runs
//
// At the default level training.log holds every batch report
// (iteration/total, samples/second), the epoch perplexities,
// validation outcomes and sampled translations.

use std::{fs, path::Path, sync::Mutex};

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::domain::constants::TRAINING_LOG_FILENAME;

pub fn init(log_dir: Option<&Path>) -> Result<()> {
    let file_layer = log_dir.map(file_layer).transpose()?;

    tracing_subscriber::registry()
        .with(default_filter()?)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;
    Ok(())
}

/// RUST_LOG directives plus `nmt_trainer=info`
pub fn default_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::from_default_env().add_directive("nmt_trainer=info".parse()?))
}

/// Non-ANSI fmt layer appending to `<dir>/training.log`.
pub fn file_layer<S>(dir: &Path) -> Result<impl Layer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create log directory '{}'", dir.display()))?;
    let path = dir.join(TRAINING_LOG_FILENAME);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Cannot open log file '{}'", path.display()))?;
    Ok(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
}
