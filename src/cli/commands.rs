// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `translate` and
// `score`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, PathBuf, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::train_use_case::ModelOptions;
use crate::domain::constants::{
    LEARNING_RATE, LOGGING_INTERVAL, MAX_LEN, PATIENCE, SAMPLE_SIZE, SOURCE_VOCAB_SIZE,
    TARGET_VOCAB_SIZE, VAL_EPOCHS,
};
use crate::training::config::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a translation model on a line-aligned parallel corpus
    Train(TrainArgs),

    /// Translate lines with a trained model
    Translate(TranslateArgs),

    /// Compute loss and perplexity of a trained model on a parallel corpus
    Score(ScoreArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Source side of the training corpus, one sentence per line
    #[arg(long)]
    pub source: PathBuf,

    /// Target side of the training corpus, line-aligned with --source
    #[arg(long)]
    pub target: PathBuf,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Sentence pairs per parameter update
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Source vocabulary size, including the three reserved symbols
    #[arg(long, default_value_t = SOURCE_VOCAB_SIZE)]
    pub source_vocab_size: usize,

    /// Target vocabulary size, including the three reserved symbols
    #[arg(long, default_value_t = TARGET_VOCAB_SIZE)]
    pub target_vocab_size: usize,

    /// Directory for vocabularies and checkpoints
    #[arg(long, default_value = "model")]
    pub save_to: PathBuf,

    /// Directory for training.log and metrics.csv
    #[arg(long, default_value = "logs")]
    pub log_to: PathBuf,

    /// Log a few sample translations after every epoch
    #[arg(long)]
    pub sample_after_epoch: bool,

    /// Source side of the validation corpus
    #[arg(long, requires = "target_val")]
    pub source_val: Option<PathBuf>,

    /// Target side of the validation corpus
    #[arg(long, requires = "source_val")]
    pub target_val: Option<PathBuf>,

    /// Validate every N epochs
    #[arg(long, default_value_t = VAL_EPOCHS)]
    pub val_epochs: usize,

    /// Stop after this many validation rounds without improvement
    #[arg(long, default_value_t = PATIENCE)]
    pub patience: usize,

    /// Drop training pairs with more tokens than this on either side
    #[arg(long, default_value_t = MAX_LEN)]
    pub max_len: usize,

    /// Log throughput every N batches
    #[arg(long, default_value_t = LOGGING_INTERVAL)]
    pub logging_interval: usize,

    /// Sentences translated after each epoch with --sample-after-epoch
    #[arg(long, default_value_t = SAMPLE_SIZE)]
    pub sample_size: usize,

    /// Seed for shuffling and sampling; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Architecture and optimiser flags
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Hidden dimension of the transformer (d_model in the paper)
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// Number of attention heads; d_model must be divisible by it
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Number of encoder layers, and of decoder layers
    #[arg(long, default_value_t = 3)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    /// Dropout probability during training
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Adam learning rate
    #[arg(long, default_value_t = LEARNING_RATE)]
    pub lr: f64,
}

/// Convert CLI TrainArgs into the training-core TrainConfig.
/// The training core never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            source_data:           a.source,
            target_data:           a.target,
            epochs:                a.epochs,
            batch_size:            a.batch_size,
            source_vocab_max_size: a.source_vocab_size,
            target_vocab_max_size: a.target_vocab_size,
            save_to:               a.save_to,
            log_to:                a.log_to,
            sample_after_epoch:    a.sample_after_epoch,
            source_val_data:       a.source_val,
            target_val_data:       a.target_val,
            val_epochs:            a.val_epochs,
            patience:              a.patience,
            max_len:               a.max_len,
            logging_interval:      a.logging_interval,
            sample_size:           a.sample_size,
            seed:                  a.seed,
        }
    }
}

impl From<ModelArgs> for ModelOptions {
    fn from(a: ModelArgs) -> Self {
        ModelOptions {
            d_model:    a.d_model,
            num_heads:  a.num_heads,
            num_layers: a.num_layers,
            d_ff:       a.d_ff,
            dropout:    a.dropout,
            lr:         a.lr,
        }
    }
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Model directory written by `train`
    #[arg(long, default_value = "model")]
    pub load_from: PathBuf,

    /// File with one tokenised sentence per line; stdin when omitted
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Model directory written by `train`
    #[arg(long, default_value = "model")]
    pub load_from: PathBuf,

    /// Source side of the corpus to score
    #[arg(long)]
    pub source: PathBuf,

    /// Target side of the corpus to score
    #[arg(long)]
    pub target: PathBuf,

    /// Sentence pairs per scoring batch
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,
}
