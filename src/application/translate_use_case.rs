// ============================================================
// Layer 2 — TranslateUseCase
// ============================================================
// Translates whitespace-tokenised lines with the main
// checkpoint slot of a model directory:
//
//   <load_from>/model.{mpk,json}   weights + architecture
//   <load_from>/vocab.*.json       vocabularies
//
// One output line per input line, in input order.

use std::{
    fs,
    io::{self, BufRead},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use burn::prelude::Backend;

use crate::domain::constants::MODEL_FILENAME;
use crate::domain::traits::Translator;
use crate::ml::inferencer::Inferencer;

type InferBackend = burn::backend::Wgpu;

pub struct TranslateUseCase {
    load_from: PathBuf,
}

impl TranslateUseCase {
    pub fn new(load_from: PathBuf) -> Self {
        Self { load_from }
    }

    /// Read lines from `input` (stdin when None) and translate them
    /// on the default WGPU device.
    pub fn execute(&self, input: Option<&Path>) -> Result<Vec<String>> {
        let lines = match input {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Cannot read '{}'", path.display()))?
                .lines()
                .map(str::to_string)
                .collect(),
            None => io::stdin()
                .lock()
                .lines()
                .collect::<io::Result<Vec<_>>>()
                .context("Cannot read standard input")?,
        };
        self.translate_on::<InferBackend>(Default::default(), &lines)
    }

    pub fn translate_on<B: Backend>(&self, device: B::Device, lines: &[String]) -> Result<Vec<String>> {
        let slot = self.load_from.join(MODEL_FILENAME);
        tracing::info!("Translating {} lines with '{}'", lines.len(), slot.display());
        Inferencer::<B>::new(device)
            .translate(&slot, lines)
            .with_context(|| format!("Cannot translate with '{}'", slot.display()))
    }
}
