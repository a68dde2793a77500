use burn::{
    nn::{
        attention::{
            generate_autoregressive_mask, MhaInput, MultiHeadAttention, MultiHeadAttentionConfig,
        },
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::data::batcher::{Batch, Matrix};
use crate::domain::constants::PAD_ID;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; adding them again gives conflicting impls.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub source_vocab_size: usize,
    pub target_vocab_size: usize,
    #[config(default = 256)]
    pub d_model:       usize,
    #[config(default = 8)]
    pub num_heads:     usize,
    #[config(default = 3)]
    pub num_layers:    usize,
    #[config(default = 1024)]
    pub d_ff:          usize,
    #[config(default = 0.1)]
    pub dropout:       f64,
    /// Size of the learned position table. Covers the longest scored
    /// sequence (1000 tokens plus the start/end marker).
    #[config(default = 1001)]
    pub max_positions: usize,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2SeqModel<B> {
        let source_embedding   = EmbeddingConfig::new(self.source_vocab_size, self.d_model).init(device);
        let target_embedding   = EmbeddingConfig::new(self.target_vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_positions, self.d_model).init(device);
        let encoder = (0..self.num_layers).map(|_| self.build_encoder_block(device)).collect();
        let decoder = (0..self.num_layers).map(|_| self.build_decoder_block(device)).collect();
        let output  = LinearConfig::new(self.d_model, self.target_vocab_size).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        Seq2SeqModel {
            source_embedding, target_embedding, position_embedding,
            encoder, decoder, output, dropout,
        }
    }

    fn attention<B: Backend>(&self, device: &B::Device) -> MultiHeadAttention<B> {
        MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device)
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        EncoderBlock {
            self_attn:   self.attention(device),
            ffn_linear1: LinearConfig::new(self.d_model, self.d_ff).init(device),
            ffn_linear2: LinearConfig::new(self.d_ff, self.d_model).init(device),
            norm1:       LayerNormConfig::new(self.d_model).init(device),
            norm2:       LayerNormConfig::new(self.d_model).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
        }
    }

    fn build_decoder_block<B: Backend>(&self, device: &B::Device) -> DecoderBlock<B> {
        DecoderBlock {
            self_attn:   self.attention(device),
            cross_attn:  self.attention(device),
            ffn_linear1: LinearConfig::new(self.d_model, self.d_ff).init(device),
            ffn_linear2: LinearConfig::new(self.d_ff, self.d_model).init(device),
            norm1:       LayerNormConfig::new(self.d_model).init(device),
            norm2:       LayerNormConfig::new(self.d_model).init(device),
            norm3:       LayerNormConfig::new(self.d_model).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_output = self.self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_pad(pad_mask))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub cross_attn:  MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub norm3:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> DecoderBlock<B> {
    pub fn forward(
        &self,
        x:           Tensor<B, 3>,
        memory:      Tensor<B, 3>,
        causal_mask: Tensor<B, 3, Bool>,
        memory_pad:  Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        // Position t may only attend to positions ≤ t.
        let attn_output = self.self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_attn(causal_mask))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));

        let cross_output = self.cross_attn
            .forward(MhaInput::new(x.clone(), memory.clone(), memory).mask_pad(memory_pad))
            .context;
        let x = self.norm2.forward(x + self.dropout.forward(cross_output));

        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm3.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct Seq2SeqModel<B: Backend> {
    pub source_embedding:   Embedding<B>,
    pub target_embedding:   Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub encoder:            Vec<EncoderBlock<B>>,
    pub decoder:            Vec<DecoderBlock<B>>,
    pub output:             Linear<B>,
    pub dropout:            Dropout,
}

/// Encoder states plus the source padding mask the decoder needs
pub struct Encoded<B: Backend> {
    pub memory:   Tensor<B, 3>,
    pub pad_mask: Tensor<B, 2, Bool>,
}

impl<B: Backend> Seq2SeqModel<B> {
    fn embed(&self, ids: Tensor<B, 2, Int>, table: &Embedding<B>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = ids.dims();

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &ids.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);

        self.dropout.forward(table.forward(ids) + self.position_embedding.forward(positions))
    }

    /// source_ids: [batch, src_len] → memory: [batch, src_len, d_model]
    pub fn encode(&self, source_ids: Tensor<B, 2, Int>) -> Encoded<B> {
        let pad_mask = source_ids.clone().equal_elem(PAD_ID as i32);
        let mut x = self.embed(source_ids, &self.source_embedding);
        for layer in &self.encoder {
            x = layer.forward(x, pad_mask.clone());
        }
        Encoded { memory: x, pad_mask }
    }

    /// decoder_ids: [batch, tgt_len] → logits: [batch, tgt_len, target_vocab]
    pub fn decode(&self, decoder_ids: Tensor<B, 2, Int>, encoded: &Encoded<B>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = decoder_ids.dims();
        let causal = generate_autoregressive_mask::<B>(batch_size, seq_len, &decoder_ids.device());

        let mut x = self.embed(decoder_ids, &self.target_embedding);
        for layer in &self.decoder {
            x = layer.forward(
                x,
                encoded.memory.clone(),
                causal.clone(),
                encoded.pad_mask.clone(),
            );
        }
        self.output.forward(x)
    }

    pub fn forward(
        &self,
        source_ids:  Tensor<B, 2, Int>,
        decoder_ids: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let encoded = self.encode(source_ids);
        self.decode(decoder_ids, &encoded)
    }

    /// Mean cross-entropy over all non-pad target positions.
    pub fn forward_loss(
        &self,
        source_ids:  Tensor<B, 2, Int>,
        decoder_ids: Tensor<B, 2, Int>,
        targets:     Tensor<B, 2, Int>,
    ) -> Tensor<B, 1> {
        let logits = self.forward(source_ids, decoder_ids);
        let [batch_size, seq_len, vocab] = logits.dims();

        let ce = CrossEntropyLossConfig::new()
            .with_pad_tokens(Some(vec![PAD_ID as usize]))
            .init(&logits.device());
        ce.forward(
            logits.reshape([batch_size * seq_len, vocab]),
            targets.reshape([batch_size * seq_len]),
        )
    }

    pub fn batch_loss(&self, batch: &Batch, device: &B::Device) -> Tensor<B, 1> {
        self.forward_loss(
            id_tensor(&batch.encoder_inputs, device),
            id_tensor(&batch.decoder_inputs, device),
            id_tensor(&batch.decoder_targets, device),
        )
    }
}

/// A model together with the config it was built from
#[derive(Clone)]
pub struct Seq2SeqCheckpoint<B: Backend> {
    pub config: Seq2SeqConfig,
    pub model:  Seq2SeqModel<B>,
}

/// Copy an id matrix into a `[rows, cols]` Int tensor.
pub fn id_tensor<B: Backend>(matrix: &Matrix, device: &B::Device) -> Tensor<B, 2, Int> {
    let flat: Vec<i32> = matrix.as_slice().iter().map(|&x| x as i32).collect();
    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape(matrix.shape())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aligned_pair::AlignedPair;

    type TestBackend = burn::backend::NdArray;

    pub(crate) fn tiny_config() -> Seq2SeqConfig {
        Seq2SeqConfig::new(10, 12)
            .with_d_model(16)
            .with_num_heads(2)
            .with_num_layers(1)
            .with_d_ff(32)
            .with_max_positions(16)
    }

    #[test]
    fn test_logits_cover_every_decoder_position() {
        let device = Default::default();
        let model  = tiny_config().init::<TestBackend>(&device);
        let pairs  = vec![
            AlignedPair::new(vec![3, 4, 5], vec![6, 7]),
            AlignedPair::new(vec![3], vec![6, 7, 8, 9]),
        ];
        let batch = Batch::from_pairs(&pairs);

        let logits = model.forward(
            id_tensor(&batch.encoder_inputs, &device),
            id_tensor(&batch.decoder_inputs, &device),
        );
        assert_eq!(logits.dims(), [2, batch.width(), 12]);

        let loss: f64 = model.batch_loss(&batch, &device).into_scalar().elem::<f64>();
        assert!(loss.is_finite() && loss > 0.0);
    }
}
