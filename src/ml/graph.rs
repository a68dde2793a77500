// ============================================================
// Layer 5 — Training Graph
// ============================================================
// The burn side of ComputeGraph: one model on an autodiff
// backend plus its optimiser, updated in place per batch.
//
//   update(batch)
//     loss  = cross-entropy(model(src, <bos> tgt), tgt <eos>)
//     grads = loss.backward()
//     model = optim.step(lr, model, grads)
//
// Adam (the optimiser the application wires in):
//   m = β1*m + (1-β1)*g        (mean)
//   v = β2*v + (1-β2)*g²       (variance)
//   θ = θ - lr * m / (√v + ε)  (update)

use anyhow::{ensure, Result};
use burn::{
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::Batch;
use crate::domain::traits::ComputeGraph;
use crate::ml::model::{Seq2SeqCheckpoint, Seq2SeqConfig, Seq2SeqModel};

pub struct Seq2SeqGraph<B: AutodiffBackend, O> {
    config: Seq2SeqConfig,
    model:  Seq2SeqModel<B>,
    optim:  O,
    lr:     f64,
    device: B::Device,
}

impl<B, O> Seq2SeqGraph<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Seq2SeqModel<B>, B>,
{
    /// Initialise fresh parameters for `config` on `device`.
    pub fn new(config: Seq2SeqConfig, lr: f64, optim: O, device: B::Device) -> Self {
        let model = config.init::<B>(&device);
        tracing::info!(
            "Model ready: {} layers, d_model={}, vocab {}→{}",
            config.num_layers, config.d_model,
            config.source_vocab_size, config.target_vocab_size,
        );
        Self { config, model, optim, lr, device }
    }
}

impl<B, O> ComputeGraph for Seq2SeqGraph<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Seq2SeqModel<B>, B>,
{
    type Params = Seq2SeqCheckpoint<B>;

    fn update(&mut self, batch: &Batch) -> Result<f64> {
        ensure!(
            batch.width() <= self.config.max_positions,
            "batch width {} exceeds the model's {} positions",
            batch.width(),
            self.config.max_positions
        );

        let loss = self.model.batch_loss(batch, &self.device);
        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

        // Backward pass + optimiser update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self.optim.step(self.lr, self.model.clone(), grads);

        Ok(loss_val)
    }

    fn params(&self) -> Seq2SeqCheckpoint<B> {
        Seq2SeqCheckpoint {
            config: self.config.clone(),
            model:  self.model.clone(),
        }
    }
}
