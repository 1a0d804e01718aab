use burn::{
    nn::{
        attention::{generate_autoregressive_mask, MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
        loss::CrossEntropyLossConfig,
    },
    prelude::*,
};

use crate::data::batcher::LmBatch;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct ActorCriticConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
    #[config(default = 0)]
    pub pad_id:      usize,
}

impl ActorCriticConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ActorCriticModel<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm  = LayerNormConfig::new(self.d_model).init(device);
        let policy_head = LinearConfig::new(self.d_model, self.vocab_size).init(device);
        let value_head  = LinearConfig::new(self.d_model, 1).init(device);
        let dropout     = DropoutConfig::new(self.dropout).init();
        ActorCriticModel {
            token_embedding, position_embedding, layers,
            final_norm, policy_head, value_head, dropout,
            vocab_size:  self.vocab_size,
            max_seq_len: self.max_seq_len,
            pad_id:      self.pad_id,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
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
    /// Post-norm block. `causal` is [batch, seq, seq], `pad_mask` is [batch, seq].
    pub fn forward(
        &self,
        x:        Tensor<B, 3>,
        causal:   Tensor<B, 3, Bool>,
        pad_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let input = MhaInput::self_attn(x.clone())
            .mask_attn(causal)
            .mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

/// Causal transformer with two heads over a shared trunk:
/// the actor (next-token logits) and the critic (one scalar per position).
#[derive(Module, Debug)]
pub struct ActorCriticModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub policy_head:        Linear<B>,
    pub value_head:         Linear<B>,
    pub dropout:            Dropout,
    pub vocab_size:         usize,
    pub max_seq_len:        usize,
    pub pad_id:             usize,
}

pub struct ActorCriticOutput<B: Backend> {
    /// [batch, seq_len, vocab_size]
    pub logits: Tensor<B, 3>,
    /// [batch, seq_len]
    pub values: Tensor<B, 2>,
}

/// The joint loss and its two parts, each a single-element tensor.
pub struct LossBreakdown<B: Backend> {
    pub total:  Tensor<B, 1>,
    pub policy: Tensor<B, 1>,
    pub value:  Tensor<B, 1>,
    /// Greedy predictions that hit a real target
    pub correct: usize,
    /// Real (non-pad) target positions
    pub counted: usize,
}

impl<B: Backend> ActorCriticModel<B> {
    /// inputs, pad_mask: [batch, seq_len] with seq_len <= max_seq_len
    pub fn forward(
        &self,
        inputs:   Tensor<B, 2, Int>,
        pad_mask: Tensor<B, 2, Bool>,
    ) -> ActorCriticOutput<B> {
        let [batch_size, seq_len] = inputs.dims();
        let device = inputs.device();

        let tok_emb = self.token_embedding.forward(inputs);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        // Position i may only attend to positions <= i.
        let causal = generate_autoregressive_mask::<B>(batch_size, seq_len, &device);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, causal.clone(), pad_mask.clone());
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, d_model]

        let logits = self.policy_head.forward(x.clone());
        let values = self.value_head.forward(x).reshape([batch_size, seq_len]);

        ActorCriticOutput { logits, values }
    }

    /// Joint actor-critic loss for one batch.
    ///
    /// policy = CrossEntropyLoss(logits, targets), mean over non-pad targets
    /// value  = masked MSE(values, reward), reward = 1 where the greedy
    ///          token equals the target, else 0
    /// total  = policy + value_coef * value
    pub fn forward_loss(&self, batch: LmBatch<B>, value_coef: f64) -> LossBreakdown<B> {
        let [batch_size, seq_len] = batch.inputs.dims();
        let output = self.forward(batch.inputs, batch.pad_mask);

        let n            = batch_size * seq_len;
        let flat_logits  = output.logits.reshape([n, self.vocab_size]);
        let flat_targets = batch.targets.reshape([n]);

        let real   = flat_targets.clone().not_equal_elem(self.pad_id as i64);
        let real_f = real.clone().float();
        let counted: usize = real_f.clone().sum().into_scalar().elem::<f64>() as usize;
        let denom = counted.max(1) as f64;

        // Burn zeroes pad positions but still averages over all n of them;
        // rescale so the policy loss is the mean over real targets.
        let ce = CrossEntropyLossConfig::new()
            .with_pad_tokens(Some(vec![self.pad_id]))
            .init(&flat_logits.device());
        let policy = ce.forward(flat_logits.clone(), flat_targets.clone()) * (n as f64 / denom);

        // Reward is built from integer argmax, so it carries no gradient
        // back into the policy head.
        let greedy = flat_logits.argmax(1).reshape([n]);
        let hits   = greedy.equal(flat_targets).bool_and(real);
        let reward = hits.clone().float();
        let correct: usize = hits.int().sum().into_scalar().elem::<i64>() as usize;

        let values = output.values.reshape([n]);
        let value  = ((values - reward).powi_scalar(2) * real_f).sum() / denom;

        let total = policy.clone() + value.clone() * value_coef;

        LossBreakdown { total, policy, value, correct, counted }
    }
}
