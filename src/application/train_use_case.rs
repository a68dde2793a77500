// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Wires the burn collaborators into the training core and
// runs it:
//
//   CheckpointStore : CheckpointManager<Autodiff<Wgpu>>
//   Scorer          : BurnScorer<Wgpu>
//   Translator      : Inferencer<Wgpu>
//   TaskSpawner     : DetachedPool with one worker
//   ComputeGraph    : Seq2SeqGraph + Adam, built once the
//                     vocabulary sizes are known
//
// Everything else (vocabularies, corpus, epochs, validation,
// early stopping, checkpoint promotion) is the Trainer's job.
//
// Reference: Burn Book §5 (Training)

use std::sync::Arc;

use anyhow::{ensure, Result};
use burn::{optim::AdamConfig, tensor::backend::AutodiffBackend};
use serde::{Deserialize, Serialize};

use crate::domain::constants::LEARNING_RATE;
use crate::domain::traits::GraphSpec;
use crate::infra::{checkpoint::CheckpointManager, spawner::DetachedPool};
use crate::ml::{
    graph::Seq2SeqGraph,
    inferencer::Inferencer,
    model::{Seq2SeqCheckpoint, Seq2SeqConfig, Seq2SeqModel},
    scorer::BurnScorer,
};
use crate::training::{
    config::TrainConfig,
    orchestrator::{Trainer, TrainingReport},
};

type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

// ─── Model Options ────────────────────────────────────────────────────────────
// Architecture and optimiser settings. The vocabulary sizes are
// not known until INIT has built the vocabularies, so the full
// Seq2SeqConfig is only assembled inside the graph builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    pub d_model:    usize,
    pub num_heads:  usize,
    pub num_layers: usize,
    pub d_ff:       usize,
    pub dropout:    f64,
    pub lr:         f64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            d_model:    256,
            num_heads:  8,
            num_layers: 3,
            d_ff:       1024,
            dropout:    0.1,
            lr:         LEARNING_RATE,
        }
    }
}

impl ModelOptions {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.num_heads > 0, "num_heads must be at least 1");
        ensure!(
            self.d_model % self.num_heads == 0,
            "d_model ({}) must be divisible by num_heads ({})",
            self.d_model,
            self.num_heads
        );
        ensure!(self.num_layers > 0, "num_layers must be at least 1");
        ensure!((0.0..1.0).contains(&self.dropout), "dropout must be in [0, 1)");
        ensure!(self.lr > 0.0, "learning rate must be positive");
        Ok(())
    }

    pub fn model_config(&self, spec: GraphSpec) -> Seq2SeqConfig {
        Seq2SeqConfig::new(spec.source_vocab_size, spec.target_vocab_size)
            .with_d_model(self.d_model)
            .with_num_heads(self.num_heads)
            .with_num_layers(self.num_layers)
            .with_d_ff(self.d_ff)
            .with_dropout(self.dropout)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
    model:  ModelOptions,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig, model: ModelOptions) -> Self {
        Self { config, model }
    }

    /// Train on the default WGPU device.
    pub fn execute(&self) -> Result<TrainingReport> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        self.execute_on::<TrainBackend>(device)
    }

    /// Train on any autodiff backend. Scoring and translation run
    /// on its inner backend.
    pub fn execute_on<B: AutodiffBackend>(&self, device: B::Device) -> Result<TrainingReport> {
        self.model.validate()?;
        let max_positions = Seq2SeqConfig::new(0, 0).max_positions;
        // decoder rows carry one extra marker
        ensure!(
            self.config.max_len < max_positions,
            "max_len must be below {max_positions}"
        );

        let trainer: Trainer<Seq2SeqCheckpoint<B>> = Trainer::new(
            self.config.clone(),
            Box::new(CheckpointManager::<B>::new(device.clone())),
            Box::new(BurnScorer::<B::InnerBackend>::new(device.clone(), self.config.batch_size)),
            Arc::new(Inferencer::<B::InnerBackend>::new(device.clone())),
            Box::new(DetachedPool::new(1)?),
        );

        let options = self.model.clone();
        trainer.run(move |spec| {
            let optim = AdamConfig::new()
                .with_epsilon(1e-8)
                .init::<B, Seq2SeqModel<B>>();
            Ok(Seq2SeqGraph::new(options.model_config(spec), options.lr, optim, device))
        })
    }
}
