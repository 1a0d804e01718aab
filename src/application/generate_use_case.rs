// ============================================================
// Layer 2 — Generate Use Case
// ============================================================
// Loads the tokenizer and a checkpoint from a training output
// directory and continues a text prompt.
//
//   1. tokenizer.json      → same ids the model was trained on
//   2. train_config.json   → rebuild the architecture
//   3. model_*.mpk         → latest or best weights
//   4. sample, then decode the new ids back to text

use std::cell::RefCell;

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use tokenizers::Tokenizer;

use crate::domain::traits::TextGenerator;
use crate::infra::{
    checkpoint::{CheckpointChoice, CheckpointManager},
    tokenizer_store::{encode_ids, TokenizerStore},
};
use crate::ml::generator::{Generator, SamplingOptions};

type InferBackend = burn::backend::Wgpu;

pub struct GenerateUseCase {
    tokenizer: Tokenizer,
    generator: Generator<InferBackend>,
    options:   SamplingOptions,
    rng:       RefCell<StdRng>,
}

impl GenerateUseCase {
    pub fn new(
        output_dir: &str,
        choice:     CheckpointChoice,
        options:    SamplingOptions,
        seed:       u64,
    ) -> Result<Self> {
        let tokenizer = TokenizerStore::new(output_dir).load()?;
        let ckpt      = CheckpointManager::new(output_dir)?;
        let device    = burn::backend::wgpu::WgpuDevice::default();
        let generator = Generator::from_checkpoint(&ckpt, choice, device)?;

        Ok(Self {
            tokenizer,
            generator,
            options,
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        })
    }
}

impl TextGenerator for GenerateUseCase {
    fn generate(&self, prompt: &str) -> Result<String> {
        let prompt_ids = encode_ids(&self.tokenizer, prompt)?;
        tracing::debug!("Prompt encoded to {} tokens", prompt_ids.len());

        let generation = self.generator.generate_ids(
            &prompt_ids,
            self.options,
            &mut *self.rng.borrow_mut(),
        )?;
        tracing::info!(
            "Generated {} tokens (critic mean value {:.3})",
            generation.ids.len(),
            generation.mean_value
        );

        let text = self.tokenizer
            .decode(&generation.ids, true)
            .map_err(|e| anyhow::anyhow!("Decode: {e}"))?;
        Ok(text.trim().to_string())
    }
}
