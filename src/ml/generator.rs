// ============================================================
// Layer 5 — Generator
// ============================================================
// Autoregressive sampling from a trained actor-critic model.
//
// Each step feeds the last max_seq_len ids through the model,
// reads the policy logits and the critic value at the final
// position, and appends one sampled id. Generation stops at
// <eos> or after max_tokens new ids.
//
//   temperature == 0  → greedy (argmax)
//   temperature  > 0  → sample from softmax(logits / temperature)
//
// The critic's per-step estimate is averaged and returned with
// the ids; it is the model's own guess of how often its greedy
// choice is right on this text.

use anyhow::Result;
use burn::prelude::*;
use rand::{distributions::WeightedIndex, prelude::Distribution, Rng};

use crate::domain::window::{BOS_ID, EOS_ID};
use crate::infra::checkpoint::{CheckpointChoice, CheckpointManager};
use crate::ml::model::ActorCriticModel;

#[derive(Debug, Clone, Copy)]
pub struct SamplingOptions {
    pub max_tokens:  usize,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct Generation {
    /// Newly generated ids, prompt excluded, <eos> excluded
    pub ids:        Vec<u32>,
    /// Mean critic value over the sampling steps
    pub mean_value: f32,
}

pub struct Generator<B: Backend> {
    model:  ActorCriticModel<B>,
    device: B::Device,
}

impl<B: Backend> Generator<B> {
    pub fn new(model: ActorCriticModel<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Rebuild the model from the saved config and load its weights.
    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        choice:       CheckpointChoice,
        device:       B::Device,
    ) -> Result<Self> {
        let cfg   = ckpt_manager.load_config()?;
        let model = cfg.model_config().with_dropout(0.0).init::<B>(&device);
        let model = ckpt_manager.load_model(model, choice, &device)?;
        tracing::info!("Model loaded from '{}'", ckpt_manager.dir().display());
        Ok(Self::new(model, device))
    }

    pub fn generate_ids<R: Rng>(
        &self,
        prompt_ids: &[u32],
        opts:       SamplingOptions,
        rng:        &mut R,
    ) -> Result<Generation> {
        let mut context: Vec<u32> = if prompt_ids.is_empty() {
            vec![BOS_ID]
        } else {
            prompt_ids.to_vec()
        };

        let mut ids        = Vec::with_capacity(opts.max_tokens);
        let mut value_sum  = 0.0f32;
        let mut steps      = 0usize;

        for _ in 0..opts.max_tokens {
            let window_start = context.len().saturating_sub(self.model.max_seq_len);
            let (logits, value) = self.last_position(&context[window_start..])?;
            value_sum += value;
            steps     += 1;

            let next = pick_token(&logits, opts.temperature, rng)?;
            if next == EOS_ID {
                break;
            }
            ids.push(next);
            context.push(next);
        }

        let mean_value = if steps > 0 { value_sum / steps as f32 } else { 0.0 };
        tracing::debug!("Generated {} tokens, mean critic value {:.3}", ids.len(), mean_value);

        Ok(Generation { ids, mean_value })
    }

    /// Policy logits and critic value at the final position of `window`.
    fn last_position(&self, window: &[u32]) -> Result<(Vec<f32>, f32)> {
        let seq_len = window.len();
        let flat: Vec<i32> = window.iter().map(|&x| x as i32).collect();

        let inputs = Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([1, seq_len]);
        let pad_mask = Tensor::<B, 2, Int>::zeros([1, seq_len], &self.device).bool();

        let out   = self.model.forward(inputs, pad_mask);
        let vocab = self.model.vocab_size;

        let logits: Vec<f32> = out.logits
            .slice([0..1, seq_len - 1..seq_len, 0..vocab])
            .reshape([vocab])
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Cannot read logits: {e:?}"))?;

        let value: Vec<f32> = out.values
            .slice([0..1, seq_len - 1..seq_len])
            .reshape([1])
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Cannot read value: {e:?}"))?;

        Ok((logits, value[0]))
    }
}

fn pick_token<R: Rng>(logits: &[f32], temperature: f32, rng: &mut R) -> Result<u32> {
    if temperature <= 0.0 {
        let best = logits
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        return Ok(best as u32);
    }

    // Softmax on the host, shifted by the max for stability
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let weights: Vec<f32> = logits
        .iter()
        .map(|&l| ((l - max) / temperature).exp())
        .collect();

    let dist = WeightedIndex::new(&weights)
        .map_err(|e| anyhow::anyhow!("Cannot sample from logits: {e}"))?;
    Ok(dist.sample(rng) as u32)
}
