// ============================================================
// Training Orchestrator
// ============================================================
// Drives one training run through its states:
//
//   INIT ─► EPOCH(1) ─► EPOCH(2) ─► … ─► EPOCH(epochs) ─► DONE
//              │            │
//              └────────────┴─► TERMINATED   (patience used up)
//
// INIT
//   - create the model, log and (with validation) `val/` dirs
//   - build + save both vocabularies; copy them into `val/`
//   - read and filter the training corpus once
//   - build the compute graph from the vocabulary sizes
//
// EPOCH(k)
//   - one shuffled pass over the corpus, one update per batch
//   - perplexity = exp(mean batch loss)
//   - on validation epochs: save to the probe slot, score it,
//     feed the loss to EarlyStopping
//   - save to the main slot unless this was a validation epoch
//     that did not improve
//   - optionally hand a DiagnosticSampler task to the spawner
//
// The main slot therefore always holds the most recent state
// that either was not validated or beat every earlier
// validation loss.
//
// Sampler tasks read the main slot without holding a lock. On a
// detached spawner a later epoch may overwrite the slot while a
// task is reading it; the task then logs a warning and skips
// that round. Training itself never depends on the sampler.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{ensure, Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::{batcher::iterate, reader::read_parallel, vocab::Vocabulary};
use crate::domain::aligned_pair::AlignedPair;
use crate::domain::constants::{
    MODEL_FILENAME, SOURCE_VOCAB_FILENAME, TARGET_VOCAB_FILENAME, TRAIN_CONFIG_FILENAME,
    VALIDATION_MODEL_DIR,
};
use crate::domain::traits::{
    CheckpointStore, ComputeGraph, GraphSpec, Scorer, TaskSpawner, Translator,
};
use crate::infra::metrics::MetricsLogger;
use crate::training::config::TrainConfig;
use crate::training::early_stopping::{EarlyStopping, Verdict};
use crate::training::sampler::DiagnosticSampler;

// ─── Report types ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationRound {
    pub loss:     f64,
    pub improved: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochSummary {
    pub epoch:      usize,
    /// Batches actually consumed, trailing partial batch included
    pub batches:    usize,
    pub mean_loss:  f64,
    pub perplexity: f64,
    pub validation: Option<ValidationRound>,
    /// Whether the main checkpoint slot was written this epoch
    pub promoted:   bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    EarlyStopped { epoch: usize },
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub epochs:         Vec<EpochSummary>,
    pub outcome:        Outcome,
    pub training_pairs: usize,
    pub dropped_pairs:  usize,
    pub elapsed:        Duration,
}

/// Format a duration as `H:MM:SS`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (m, s) = (secs / 60, secs % 60);
    let (h, m) = (m / 60, m % 60);
    format!("{h}:{m:02}:{s:02}")
}

// ─── INIT output ──────────────────────────────────────────────────────────────
struct Validation {
    source: PathBuf,
    target: PathBuf,
    /// `<save_to>/val`, holds the probe slot and vocabulary copies
    dir:    PathBuf,
    /// Probe slot, `<save_to>/val/model`
    probe:  PathBuf,
}

struct Prepared {
    source_vocab: Arc<Vocabulary>,
    target_vocab: Arc<Vocabulary>,
    pairs:        Arc<[AlignedPair]>,
    dropped:      usize,
    validation:   Option<Validation>,
    /// Main slot, `<save_to>/model`
    model_path:   PathBuf,
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
/// Owns the run configuration and the collaborators; `run` performs
/// one complete training run.
pub struct Trainer<P> {
    config:     TrainConfig,
    store:      Box<dyn CheckpointStore<P>>,
    scorer:     Box<dyn Scorer>,
    translator: Arc<dyn Translator>,
    spawner:    Box<dyn TaskSpawner>,
}

impl<P> Trainer<P> {
    pub fn new(
        config:     TrainConfig,
        store:      Box<dyn CheckpointStore<P>>,
        scorer:     Box<dyn Scorer>,
        translator: Arc<dyn Translator>,
        spawner:    Box<dyn TaskSpawner>,
    ) -> Self {
        Self { config, store, scorer, translator, spawner }
    }

    /// Run INIT and the epoch loop. `build_graph` is called once,
    /// after the vocabularies exist.
    pub fn run<G, F>(&self, build_graph: F) -> Result<TrainingReport>
    where
        G: ComputeGraph<Params = P>,
        F: FnOnce(GraphSpec) -> Result<G>,
    {
        let cfg = &self.config;
        cfg.validate()?;

        let span = tracing::info_span!("train", save_to = %cfg.save_to.display());
        let _enter = span.enter();
        let tic = Instant::now();

        let prepared = self.prepare()?;

        tracing::info!("Building computation graph.");
        let mut graph = build_graph(GraphSpec {
            source_vocab_size: prepared.source_vocab.size(),
            target_vocab_size: prepared.target_vocab.size(),
            batch_size:        cfg.batch_size,
        })
        .context("Cannot build computation graph")?;

        let metrics = MetricsLogger::new(&cfg.log_to)?;
        let mut shuffle_rng = seeded_rng(cfg.seed);
        let mut sample_rng  = seeded_rng(cfg.seed.map(|s| s.wrapping_add(1)));

        let sampler = cfg.sample_after_epoch.then(|| {
            DiagnosticSampler::new(
                prepared.pairs.clone(),
                prepared.source_vocab.clone(),
                prepared.target_vocab.clone(),
                self.translator.clone(),
                cfg.sample_size,
            )
        });
        let mut early_stopping = prepared
            .validation
            .as_ref()
            .map(|_| EarlyStopping::new(cfg.patience));

        let mut epochs  = Vec::with_capacity(cfg.epochs);
        let mut outcome = Outcome::Completed;

        tracing::info!("Starting training.");
        for epoch in 1..=cfg.epochs {
            let epoch_span = tracing::info_span!("epoch", epoch);
            let _enter = epoch_span.enter();

            let (batches, mean_loss) =
                self.train_epoch(&mut graph, &prepared.pairs, epoch, &mut shuffle_rng)?;
            let perplexity = mean_loss.exp();
            tracing::info!("Perplexity on training data after epoch {}: {:.2}", epoch, perplexity);

            // ── Validation & early stopping ─────────────────────────────────
            let mut validation = None;
            let mut exhausted  = false;
            if let (Some(val), Some(stopping)) = (&prepared.validation, early_stopping.as_mut()) {
                if epoch % cfg.val_epochs == 0 {
                    let (round, verdict) = self.validate(&graph, val, stopping)?;
                    exhausted  = verdict == Verdict::Exhausted;
                    validation = Some(round);
                }
            }

            // ── Checkpoint promotion ────────────────────────────────────────
            let promoted = validation.map_or(true, |v| v.improved);
            if promoted {
                self.store
                    .save(&graph.params(), &prepared.model_path)
                    .with_context(|| format!("Cannot save checkpoint after epoch {epoch}"))?;
            }

            let summary = EpochSummary { epoch, batches, mean_loss, perplexity, validation, promoted };
            metrics.log(&summary)?;
            epochs.push(summary);

            if exhausted {
                tracing::info!(
                    "No improvement in validation data perplexity for {} epochs: terminating training",
                    cfg.patience
                );
                outcome = Outcome::EarlyStopped { epoch };
                break;
            }

            // ── Diagnostics ─────────────────────────────────────────────────
            if let Some(sampler) = &sampler {
                let task = sampler.task(prepared.model_path.clone(), epoch, sample_rng.gen());
                self.spawner.spawn(task);
            }
        }

        let elapsed = tic.elapsed();
        tracing::info!(
            "Training finished. Overall time taken to train: {}",
            format_elapsed(elapsed)
        );

        Ok(TrainingReport {
            epochs,
            outcome,
            training_pairs: prepared.pairs.len(),
            dropped_pairs:  prepared.dropped,
            elapsed,
        })
    }

    /// INIT: directories, vocabularies, corpus.
    fn prepare(&self) -> Result<Prepared> {
        let cfg = &self.config;

        for dir in [&cfg.save_to, &cfg.log_to] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create directory '{}'", dir.display()))?;
        }

        let validation = match cfg.validation_data() {
            Some((source, target)) => {
                let val_dir = cfg.save_to.join(VALIDATION_MODEL_DIR);
                fs::create_dir_all(&val_dir)
                    .with_context(|| format!("Cannot create directory '{}'", val_dir.display()))?;
                Some(Validation {
                    source: source.to_path_buf(),
                    target: target.to_path_buf(),
                    probe:  val_dir.join(MODEL_FILENAME),
                    dir:    val_dir,
                })
            }
            None => None,
        };

        tracing::info!("Creating vocabularies.");
        let source_vocab = create_vocab(&cfg.source_data, cfg.source_vocab_max_size, &cfg.save_to, SOURCE_VOCAB_FILENAME)?;
        let target_vocab = create_vocab(&cfg.target_data, cfg.target_vocab_max_size, &cfg.save_to, TARGET_VOCAB_FILENAME)?;
        tracing::info!("Source vocabulary: {}", source_vocab);
        tracing::info!("Target vocabulary: {}", target_vocab);

        if let Some(val) = &validation {
            // the scorer loads vocabularies from the probe slot's directory
            source_vocab.save(&val.dir.join(SOURCE_VOCAB_FILENAME))?;
            target_vocab.save(&val.dir.join(TARGET_VOCAB_FILENAME))?;
        }

        cfg.save(&cfg.save_to.join(TRAIN_CONFIG_FILENAME))?;

        tracing::info!("Reading training data.");
        let corpus = read_parallel(
            &cfg.source_data,
            &cfg.target_data,
            &source_vocab,
            &target_vocab,
            cfg.max_len,
        )?;
        ensure!(
            !corpus.pairs.is_empty(),
            "No sentence pair in '{}' / '{}' has at most {} tokens per side",
            cfg.source_data.display(),
            cfg.target_data.display(),
            cfg.max_len
        );
        tracing::info!("Training on {} sentence pairs", corpus.pairs.len());

        Ok(Prepared {
            source_vocab: Arc::new(source_vocab),
            target_vocab: Arc::new(target_vocab),
            pairs:        corpus.pairs.into(),
            dropped:      corpus.dropped,
            validation,
            model_path:   cfg.save_to.join(MODEL_FILENAME),
        })
    }

    /// One pass over the corpus. Returns (batches, mean batch loss).
    fn train_epoch<G, R>(
        &self,
        graph: &mut G,
        pairs: &[AlignedPair],
        epoch: usize,
        rng:   &mut R,
    ) -> Result<(usize, f64)>
    where
        G: ComputeGraph<Params = P>,
        R: Rng,
    {
        let cfg         = &self.config;
        let batches     = iterate(pairs, cfg.batch_size, true, rng);
        let num_batches = batches.len();

        let mut total_loss    = 0.0f64;
        let mut total_iter    = 0usize;
        let mut samples_since = 0usize;
        let mut iter_tic      = Instant::now();

        for batch in batches {
            let loss = graph
                .update(&batch)
                .with_context(|| format!("Update failed at epoch {epoch}, iteration {}", total_iter + 1))?;
            total_loss    += loss;
            total_iter    += 1;
            samples_since += batch.len();

            if total_iter % cfg.logging_interval == 0 || total_iter == num_batches {
                let secs = iter_tic.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Epoch {}, iteration {}/{}: {:.2} samples/second",
                    epoch,
                    total_iter,
                    num_batches,
                    samples_since as f64 / secs
                );
                iter_tic      = Instant::now();
                samples_since = 0;
            }
        }

        Ok((total_iter, total_loss / total_iter as f64))
    }

    /// Save the probe slot, score it, and update early stopping.
    fn validate<G>(
        &self,
        graph:    &G,
        val:      &Validation,
        stopping: &mut EarlyStopping,
    ) -> Result<(ValidationRound, Verdict)>
    where
        G: ComputeGraph<Params = P>,
    {
        self.store
            .save(&graph.params(), &val.probe)
            .context("Cannot save validation checkpoint")?;

        let loss = self
            .scorer
            .score(&val.source, &val.target, &val.probe)
            .context("Scoring validation data failed")?;
        tracing::info!("Current model perplexity on validation data: {:.2}", loss.exp());

        let verdict = stopping.observe(loss);
        if verdict.improved() {
            tracing::info!("Lowest perplexity on validation data achieved");
        } else {
            tracing::info!(
                "No improvement for {} of {} validation rounds; keeping previous checkpoint",
                stopping.rounds_without_improvement(),
                self.config.patience
            );
        }

        Ok((ValidationRound { loss, improved: verdict.improved() }, verdict))
    }
}

/// Build a vocabulary from `data` and save it as `save_to/filename`.
fn create_vocab(data: &Path, max_size: usize, save_to: &Path, filename: &str) -> Result<Vocabulary> {
    let vocab = Vocabulary::build_from_file(data, max_size)?;
    vocab.save(&save_to.join(filename))?;
    Ok(vocab)
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use anyhow::anyhow;

    use crate::data::batcher::Batch;
    use crate::infra::spawner::InlineSpawner;

    // ── Stub collaborators ───────────────────────────────────────────────────

    /// Parameters are the number of updates applied so far. The k-th
    /// update (from 0) reports `loss + k * step`.
    struct CountingGraph {
        updates: u64,
        loss:    f64,
        step:    f64,
        seen:    Arc<Mutex<Vec<u32>>>,
    }

    impl ComputeGraph for CountingGraph {
        type Params = u64;

        fn update(&mut self, batch: &Batch) -> Result<f64> {
            assert!(!batch.is_empty());
            self.seen.lock().unwrap().extend_from_slice(batch.encoder_inputs.as_slice());
            let loss = self.loss + self.step * self.updates as f64;
            self.updates += 1;
            Ok(loss)
        }

        fn params(&self) -> u64 {
            self.updates
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStore {
        slots:  Arc<Mutex<HashMap<PathBuf, u64>>>,
        writes: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl CheckpointStore<u64> for MemoryStore {
        fn save(&self, params: &u64, path: &Path) -> Result<()> {
            self.slots.lock().unwrap().insert(path.to_path_buf(), *params);
            self.writes.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }

        fn restore(&self, path: &Path) -> Result<u64> {
            self.slots
                .lock()
                .unwrap()
                .get(path)
                .copied()
                .ok_or_else(|| anyhow!("empty slot '{}'", path.display()))
        }
    }

    /// Returns the scripted losses in order; fails when they run out
    struct ScriptedScorer {
        losses: Mutex<VecDeque<f64>>,
        calls:  Arc<Mutex<Vec<PathBuf>>>,
    }

    impl ScriptedScorer {
        fn new(losses: &[f64]) -> Self {
            Self {
                losses: Mutex::new(losses.iter().copied().collect()),
                calls:  Arc::default(),
            }
        }
    }

    impl Scorer for ScriptedScorer {
        fn score(&self, _source: &Path, _target: &Path, checkpoint: &Path) -> Result<f64> {
            self.calls.lock().unwrap().push(checkpoint.to_path_buf());
            self.losses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow!("validation files are corrupt"))
        }
    }

    #[derive(Default)]
    struct RecordingTranslator {
        calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
        fail:  bool,
    }

    impl Translator for RecordingTranslator {
        fn translate(&self, checkpoint: &Path, lines: &[String]) -> Result<Vec<String>> {
            self.calls.lock().unwrap().push((checkpoint.to_path_buf(), lines.to_vec()));
            if self.fail {
                return Err(anyhow!("decoder blew up"));
            }
            Ok(lines.iter().map(|_| "translation".to_string()).collect())
        }
    }

    // ── Fixtures ─────────────────────────────────────────────────────────────

    struct Fixture {
        dir:        tempfile::TempDir,
        store:      MemoryStore,
        translator: Arc<RecordingTranslator>,
        seen:       Arc<Mutex<Vec<u32>>>,
    }

    impl Fixture {
        /// Ten short aligned pairs on disk
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let src: Vec<String> = (0..10).map(|i| format!("w{i} w{} common", i + 1)).collect();
            let tgt: Vec<String> = (0..10).map(|i| format!("x{i} common")).collect();
            fs::write(dir.path().join("train.src"), src.join("\n")).unwrap();
            fs::write(dir.path().join("train.tgt"), tgt.join("\n")).unwrap();
            fs::write(dir.path().join("dev.src"), "w1 common\nw2 common").unwrap();
            fs::write(dir.path().join("dev.tgt"), "x1 common\nx2 common").unwrap();
            Self {
                dir,
                store:      MemoryStore::default(),
                translator: Arc::new(RecordingTranslator::default()),
                seen:       Arc::default(),
            }
        }

        /// Replace the training corpus with `n` pairs
        fn with_pairs(self, n: usize) -> Self {
            let src: Vec<String> = (0..n).map(|i| format!("w{i} common")).collect();
            let tgt: Vec<String> = (0..n).map(|i| format!("x{i} common")).collect();
            fs::write(self.path("train.src"), src.join("\n")).unwrap();
            fs::write(self.path("train.tgt"), tgt.join("\n")).unwrap();
            self
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn config(&self, epochs: usize) -> TrainConfig {
            TrainConfig {
                source_data: self.path("train.src"),
                target_data: self.path("train.tgt"),
                epochs,
                batch_size:  2,
                save_to:     self.path("out/model"),
                log_to:      self.path("out/logs"),
                seed:        Some(42),
                ..TrainConfig::default()
            }
        }

        fn with_validation(&self, mut cfg: TrainConfig, patience: usize) -> TrainConfig {
            cfg.source_val_data = Some(self.path("dev.src"));
            cfg.target_val_data = Some(self.path("dev.tgt"));
            cfg.val_epochs      = 1;
            cfg.patience        = patience;
            cfg
        }

        fn run(&self, cfg: TrainConfig, scorer: ScriptedScorer) -> Result<TrainingReport> {
            self.run_with_losses(cfg, scorer, 0.7, 0.0)
        }

        fn run_with_losses(
            &self,
            cfg:    TrainConfig,
            scorer: ScriptedScorer,
            loss:   f64,
            step:   f64,
        ) -> Result<TrainingReport> {
            let batch_size = cfg.batch_size;
            let trainer: Trainer<u64> = Trainer::new(
                cfg,
                Box::new(self.store.clone()),
                Box::new(scorer),
                self.translator.clone(),
                Box::new(InlineSpawner),
            );
            let seen = self.seen.clone();
            trainer.run(|spec| {
                assert_eq!(spec.batch_size, batch_size);
                Ok(CountingGraph { updates: 0, loss, step, seen })
            })
        }

        fn main_slot(&self) -> Option<u64> {
            self.store.restore(&self.path("out/model/model")).ok()
        }
    }

    // ── Tests ────────────────────────────────────────────────────────────────

    #[test]
    fn test_completes_all_epochs_without_validation() {
        let fx     = Fixture::new();
        let report = fx.run(fx.config(3), ScriptedScorer::new(&[])).unwrap();

        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!(report.epochs.len(), 3);
        assert_eq!(report.training_pairs, 10);
        for summary in &report.epochs {
            assert_eq!(summary.batches, 5);
            assert!(summary.perplexity.is_finite() && summary.perplexity > 0.0);
            assert!((summary.perplexity - 0.7f64.exp()).abs() < 1e-9);
            assert!(summary.promoted);
            assert!(summary.validation.is_none());
        }

        // a single main slot, overwritten every epoch
        let slots = fx.store.slots.lock().unwrap().clone();
        assert_eq!(slots.len(), 1);
        assert_eq!(fx.main_slot(), Some(15));

        assert!(fx.path("out/model/vocab.source.json").exists());
        assert!(fx.path("out/model/vocab.target.json").exists());
        assert!(fx.path("out/model/train_config.json").exists());
        assert!(!fx.path("out/model/val").exists());

        let csv = fs::read_to_string(fx.path("out/logs/metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_early_stop_with_increasing_validation_loss() {
        let fx     = Fixture::new();
        let cfg    = fx.with_validation(fx.config(10), 2);
        let scorer = ScriptedScorer::new(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let calls  = scorer.calls.clone();

        let report = fx.run(cfg, scorer).unwrap();

        assert_eq!(report.outcome, Outcome::EarlyStopped { epoch: 3 });
        assert_eq!(report.epochs.len(), 3);
        // main slot still holds the epoch-1 parameters (5 updates)
        assert_eq!(fx.main_slot(), Some(5));
        // the probe slot saw the last scored state
        assert_eq!(fx.store.restore(&fx.path("out/model/val/model")).unwrap(), 15);

        let probe = fx.path("out/model/val/model");
        assert_eq!(*calls.lock().unwrap(), vec![probe.clone(), probe.clone(), probe]);

        assert!(fx.path("out/model/val/vocab.source.json").exists());
        assert!(fx.path("out/model/val/vocab.target.json").exists());
    }

    #[test]
    fn test_stops_after_exactly_patience_rounds() {
        let fx     = Fixture::new();
        let cfg    = fx.with_validation(fx.config(10), 3);
        let scorer = ScriptedScorer::new(&[1.0; 10]);
        let calls  = scorer.calls.clone();

        let report = fx.run(cfg, scorer).unwrap();

        // one improving round, then exactly three flat ones
        assert_eq!(report.outcome, Outcome::EarlyStopped { epoch: 4 });
        assert_eq!(calls.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_main_slot_keeps_last_improving_epoch() {
        let fx     = Fixture::new();
        let cfg    = fx.with_validation(fx.config(5), 3);
        let report = fx.run(cfg, ScriptedScorer::new(&[3.0, 4.0, 2.0, 5.0, 6.0])).unwrap();

        assert_eq!(report.outcome, Outcome::Completed);
        let promoted: Vec<bool> = report.epochs.iter().map(|e| e.promoted).collect();
        assert_eq!(promoted, vec![true, false, true, false, false]);
        // epoch 3 → 15 updates
        assert_eq!(fx.main_slot(), Some(15));
    }

    #[test]
    fn test_non_validation_epochs_always_promote() {
        let fx  = Fixture::new();
        let mut cfg = fx.with_validation(fx.config(4), 5);
        cfg.val_epochs = 2;
        let scorer = ScriptedScorer::new(&[1.0, 2.0]);
        let calls  = scorer.calls.clone();

        let report = fx.run(cfg, scorer).unwrap();

        assert_eq!(calls.lock().unwrap().len(), 2);
        let validated: Vec<bool> = report.epochs.iter().map(|e| e.validation.is_some()).collect();
        assert_eq!(validated, vec![false, true, false, true]);
        // epoch 4 did not improve, so epoch 3's state (15) stays
        assert_eq!(fx.main_slot(), Some(15));
    }

    #[test]
    fn test_sampler_runs_after_every_epoch() {
        let fx  = Fixture::new();
        let cfg = TrainConfig { sample_after_epoch: true, ..fx.config(3) };

        fx.run(cfg, ScriptedScorer::new(&[])).unwrap();

        let calls = fx.translator.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        for (checkpoint, lines) in calls.iter() {
            assert_eq!(checkpoint, &fx.path("out/model/model"));
            assert_eq!(lines.len(), 3);
        }
    }

    #[test]
    fn test_failing_sampler_does_not_stop_training() {
        let mut fx = Fixture::new();
        fx.translator = Arc::new(RecordingTranslator { fail: true, ..Default::default() });
        let cfg = TrainConfig { sample_after_epoch: true, ..fx.config(2) };

        let report = fx.run(cfg, ScriptedScorer::new(&[])).unwrap();
        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!(fx.translator.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_trailing_partial_batch_counts_towards_perplexity() {
        let fx  = Fixture::new().with_pairs(7);
        let cfg = TrainConfig { batch_size: 3, ..fx.config(1) };

        // batches of 3, 3 and 1 report 0.5, 1.0 and 1.5
        let report = fx.run_with_losses(cfg, ScriptedScorer::new(&[]), 0.5, 0.5).unwrap();

        let summary = &report.epochs[0];
        assert_eq!(summary.batches, 3);
        assert!((summary.mean_loss - 1.0).abs() < 1e-12);
        assert!((summary.perplexity - ((0.5 + 1.0 + 1.5) / 3.0f64).exp()).abs() < 1e-12);
        assert_eq!(fx.seen.lock().unwrap().len(), 7 * 3, "every pair trained once");
    }

    /// Lines of `<log_dir>/training.log` written while `body` runs
    fn captured_log(log_dir: &Path, body: impl FnOnce()) -> String {
        use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new("nmt_trainer=info"))
            .with(crate::infra::logging::file_layer(log_dir).unwrap());
        tracing::subscriber::with_default(subscriber, body);
        fs::read_to_string(log_dir.join(crate::domain::constants::TRAINING_LOG_FILENAME)).unwrap()
    }

    #[test]
    fn test_training_log_holds_throughput_and_samples_at_default_level() {
        let fx  = Fixture::new();
        let cfg = TrainConfig { sample_after_epoch: true, logging_interval: 1, ..fx.config(2) };

        let log = captured_log(&fx.path("out/logs"), || {
            fx.run(cfg, ScriptedScorer::new(&[])).unwrap();
        });

        assert!(log.contains("Perplexity on training data after epoch 2"));
        assert!(log.contains("Epoch 2, iteration 5/5"));
        assert!(log.contains("samples/second"));
        assert!(log.contains("Sampled translations after epoch 2."));
        assert!(log.contains("Input:"));
        assert!(log.contains("Predicted output:\ttranslation"));
        assert!(log.contains("Actual output:"));
    }

    #[test]
    fn test_throughput_reported_every_interval_and_on_last_batch() {
        let fx  = Fixture::new().with_pairs(7);
        let cfg = TrainConfig { batch_size: 1, logging_interval: 3, ..fx.config(1) };

        let log = captured_log(&fx.path("out/logs"), || {
            fx.run(cfg, ScriptedScorer::new(&[])).unwrap();
        });

        let reports: Vec<&str> = log.lines().filter(|l| l.contains("samples/second")).collect();
        assert_eq!(reports.len(), 3, "{reports:?}");
        assert!(reports[0].contains("iteration 3/7"));
        assert!(reports[1].contains("iteration 6/7"));
        assert!(reports[2].contains("iteration 7/7"));
    }

    #[test]
    fn test_scoring_failure_is_fatal() {
        let fx  = Fixture::new();
        let cfg = fx.with_validation(fx.config(3), 2);
        // one scripted loss, the second round fails
        let err = fx.run(cfg, ScriptedScorer::new(&[1.0])).unwrap_err();
        assert!(format!("{err:#}").contains("validation"));
        assert_eq!(fx.main_slot(), Some(5));
    }

    #[test]
    fn test_same_seed_gives_same_batch_order() {
        let first = Fixture::new();
        first.run(first.config(2), ScriptedScorer::new(&[])).unwrap();

        let second = Fixture::new();
        second.run(second.config(2), ScriptedScorer::new(&[])).unwrap();

        assert_eq!(*first.seen.lock().unwrap(), *second.seen.lock().unwrap());
    }

    #[test]
    fn test_misaligned_corpus_fails_init() {
        let fx = Fixture::new();
        fs::write(fx.path("train.tgt"), "only one line").unwrap();
        assert!(fx.run(fx.config(1), ScriptedScorer::new(&[])).is_err());
    }

    #[test]
    fn test_everything_filtered_fails_init() {
        let fx  = Fixture::new();
        let cfg = TrainConfig { max_len: 1, ..fx.config(1) };
        let err = fx.run(cfg, ScriptedScorer::new(&[])).unwrap_err();
        assert!(err.to_string().contains("at most 1 tokens"));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(3 * 3600 + 7 * 60 + 9)), "3:07:09");
    }
}
