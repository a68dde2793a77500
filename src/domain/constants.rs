// ============================================================
// Layer 3 — Fixed Protocol Constants
// ============================================================
// Reserved vocabulary ids, their string forms, artifact file
// names, and the training defaults shared by every layer.
//
// Every vocabulary reserves ids 0..3 for the special symbols
// before any learned word receives an id. The decoder's
// start-of-sequence marker reuses the end-of-sequence id.

/// Padding id — fills every sequence up to the batch width
pub const PAD_ID: u32 = 0;
/// End-of-sequence id
pub const EOS_ID: u32 = 1;
/// Start-of-sequence id (shared with end-of-sequence)
pub const BOS_ID: u32 = EOS_ID;
/// Out-of-vocabulary id
pub const UNK_ID: u32 = 2;

pub const PAD: &str = "<pad>";
pub const EOS: &str = "<eos>";
pub const UNK: &str = "<unk>";

/// Number of ids reserved before learned words
pub const NUM_RESERVED: usize = 3;

// ─── Artifact names ───────────────────────────────────────────────────────────
pub const MODEL_FILENAME:        &str = "model";
pub const SOURCE_VOCAB_FILENAME: &str = "vocab.source.json";
pub const TARGET_VOCAB_FILENAME: &str = "vocab.target.json";
pub const TRAIN_CONFIG_FILENAME: &str = "train_config.json";
pub const TRAINING_LOG_FILENAME: &str = "training.log";
pub const METRICS_FILENAME:      &str = "metrics.csv";

/// Subdirectory of the model directory that holds the probe slot
pub const VALIDATION_MODEL_DIR: &str = "val";

// ─── Length limits ────────────────────────────────────────────────────────────
/// Training pairs with more tokens than this on either side are dropped
pub const MAX_LEN: usize = 50;
/// Only the first SCORE_MAX_LEN tokens of a side are scored
pub const SCORE_MAX_LEN: usize = 1000;
/// Upper bound on the length of a produced translation
pub const TRANSLATION_MAX_LEN: usize = MAX_LEN * 2;

// ─── Training defaults ────────────────────────────────────────────────────────
pub const SOURCE_VOCAB_SIZE: usize = 50_000;
pub const TARGET_VOCAB_SIZE: usize = 50_000;
pub const VAL_EPOCHS:        usize = 1;
pub const PATIENCE:          usize = 5;
pub const LOGGING_INTERVAL:  usize = 1000;
/// Pairs translated by the diagnostic sampler after each epoch
pub const SAMPLE_SIZE:       usize = 3;
pub const LEARNING_RATE:     f64   = 1e-4;
