// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, hands off to Layer 2, and prints results to stdout.
//
//   1. `train`     — train a model on a parallel corpus
//   2. `translate` — translate lines with a trained model
//   3. `score`     — held-out loss / perplexity of a model
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ScoreArgs, TrainArgs, TranslateArgs};

use crate::training::orchestrator::{format_elapsed, Outcome};

#[derive(Parser, Debug)]
#[command(
    name = "nmt-trainer",
    version,
    about = "Train a sequence-to-sequence translation model on a parallel corpus."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Directory the `training.log` file layer writes to, if any
    pub fn log_dir(&self) -> Option<&Path> {
        match &self.command {
            Commands::Train(args) => Some(args.log_to.as_path()),
            _ => None,
        }
    }

    /// Dispatch to the matching use case. Only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Translate(args) => run_translate(args),
            Commands::Score(args)     => run_score(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let model    = args.model.clone().into();
    let use_case = TrainUseCase::new(args.into(), model);
    let report   = use_case.execute()?;

    match report.outcome {
        Outcome::Completed => println!(
            "Training complete: {} epochs in {}.",
            report.epochs.len(),
            format_elapsed(report.elapsed)
        ),
        Outcome::EarlyStopped { epoch } => println!(
            "Training stopped early after epoch {} in {}.",
            epoch,
            format_elapsed(report.elapsed)
        ),
    }
    if let Some(last) = report.epochs.last() {
        println!("Final training perplexity: {:.2}", last.perplexity);
    }
    Ok(())
}

fn run_translate(args: TranslateArgs) -> Result<()> {
    use crate::application::translate_use_case::TranslateUseCase;

    let use_case = TranslateUseCase::new(args.load_from);
    for line in use_case.execute(args.input.as_deref())? {
        println!("{line}");
    }
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<()> {
    use crate::application::score_use_case::ScoreUseCase;

    let use_case = ScoreUseCase::new(args.load_from, args.batch_size);
    let report   = use_case.execute(&args.source, &args.target)?;
    println!("Loss: {:.4}", report.loss);
    println!("Perplexity: {:.2}", report.perplexity);
    Ok(())
}
