// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load .txt corpus            (Layer 4 - data)
//   Step 2: Clean the text              (Layer 4 - data)
//   Step 3: Build / load tokenizer      (Layer 6 - infra)
//   Step 4: Encode one token stream     (Layer 6 - infra)
//   Step 5: Chunk into windows          (Layer 4 - data)
//   Step 6: Split train/validation      (Layer 4 - data)
//   Step 7: Build datasets              (Layer 4 - data)
//   Step 8: Save config                 (Layer 6 - infra)
//   Step 9: Run training loop           (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::data::{
    chunker::WindowChunker,
    dataset::LmDataset,
    loader::TextLoader,
    preprocessor::Preprocessor,
    splitter::split_train_val,
};
use crate::domain::traits::DocumentSource;
use crate::domain::window::{EOS_ID, PAD_ID, UNK_ID};
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{encode_ids, TokenizerKind, TokenizerStore},
};
use crate::ml::model::ActorCriticConfig;
use crate::ml::trainer::{run_training, TrainingSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved as JSON next to the weights so generation and resumed
// runs rebuild exactly the same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:    String,
    pub output_dir:   String,
    pub tokenizer:    TokenizerKind,
    /// Requested size; replaced by the tokenizer's actual size before saving
    pub vocab_size:   usize,
    pub seq_len:      usize,
    pub stride:       usize,
    pub batch_size:   usize,
    pub epochs:       usize,
    /// Peak learning rate, reached at the end of warmup
    pub lr:           f64,
    pub warmup_steps: usize,
    pub grad_clip:    f32,
    /// Weight of the critic's MSE in the joint loss
    pub value_coef:   f64,
    pub d_model:      usize,
    pub num_heads:    usize,
    pub num_layers:   usize,
    pub d_ff:         usize,
    pub dropout:      f64,
    /// Fraction of windows held out for validation
    pub val_fraction: f64,
    pub seed:         u64,
    pub num_workers:  usize,
    #[serde(default)]
    pub resume:       bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:    "data/corpus.txt".to_string(),
            output_dir:   "checkpoints".to_string(),
            tokenizer:    TokenizerKind::Word,
            vocab_size:   10_000,
            seq_len:      128,
            stride:       64,
            batch_size:   16,
            epochs:       10,
            lr:           5e-4,
            warmup_steps: 400,
            grad_clip:    1.0,
            value_coef:   0.5,
            d_model:      256,
            num_heads:    8,
            num_layers:   4,
            d_ff:         1024,
            dropout:      0.1,
            val_fraction: 0.1,
            seed:         42,
            num_workers:  2,
            resume:       false,
        }
    }
}

impl TrainConfig {
    /// Reject configurations that would fail deep inside Burn.
    pub fn validate(&self) -> Result<()> {
        if self.seq_len == 0 || self.stride == 0 {
            bail!("seq_len and stride must be at least 1");
        }
        if self.batch_size == 0 || self.epochs == 0 {
            bail!("batch_size and epochs must be at least 1");
        }
        if self.num_heads == 0 || self.d_model % self.num_heads != 0 {
            bail!("d_model ({}) must be divisible by num_heads ({})", self.d_model, self.num_heads);
        }
        if !(0.0..1.0).contains(&self.val_fraction) {
            bail!("val_fraction must be in [0, 1), got {}", self.val_fraction);
        }
        if self.lr <= 0.0 || self.grad_clip <= 0.0 {
            bail!("lr and grad_clip must be positive");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("dropout must be in [0, 1), got {}", self.dropout);
        }
        Ok(())
    }

    /// Burn model config for this run
    pub fn model_config(&self) -> ActorCriticConfig {
        ActorCriticConfig::new(
            self.vocab_size, self.seq_len, self.d_model,
            self.num_heads, self.num_layers, self.d_ff,
        )
        .with_dropout(self.dropout)
        .with_pad_id(PAD_ID as usize)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingSummary> {
        let mut cfg = self.config.clone();
        cfg.validate()?;

        // ── Step 1: Load the corpus ───────────────────────────────────────────
        let loader   = TextLoader::new(&cfg.data_path);
        let raw_docs = loader.load_all()?;
        if raw_docs.is_empty() {
            bail!("No .txt documents found at '{}'", cfg.data_path);
        }
        let words: usize = raw_docs.iter().map(|d| d.word_count()).sum();
        tracing::info!("Corpus: {} documents, {} words", raw_docs.len(), words);

        // ── Step 2: Clean / normalise text ────────────────────────────────────
        let texts = Preprocessor::new().clean_all(raw_docs.iter().map(|d| d.text.as_str()));

        // ── Step 3: Build / load tokenizer ────────────────────────────────────
        let tok_store = TokenizerStore::new(&cfg.output_dir);
        let tokenizer = tok_store.load_or_build(cfg.tokenizer, &texts, cfg.vocab_size)?;

        let effective_vocab = tokenizer.get_vocab_size(true);
        if effective_vocab != cfg.vocab_size {
            tracing::info!("Vocabulary size {} (requested {})", effective_vocab, cfg.vocab_size);
        }
        cfg.vocab_size = effective_vocab;

        // ── Step 4: Encode one continuous stream ──────────────────────────────
        let stream  = encode_stream(&tokenizer, &texts)?;
        let unknown = stream.iter().filter(|&&id| id == UNK_ID).count();
        tracing::info!("Encoded {} tokens ({} outside the vocabulary)", stream.len(), unknown);

        // ── Step 5: Chunk into shifted windows ────────────────────────────────
        let chunker = WindowChunker::new(cfg.seq_len, cfg.stride);
        let windows = chunker.chunk(&stream);
        tracing::info!(
            "Created {} windows (seq_len={}, stride={})",
            windows.len(), cfg.seq_len, cfg.stride
        );

        // ── Step 6: Train / validation split ──────────────────────────────────
        let (train_windows, val_windows) =
            split_train_val(windows, 1.0 - cfg.val_fraction, cfg.seed);
        tracing::info!(
            "Split: {} train, {} validation",
            train_windows.len(),
            val_windows.len()
        );

        // ── Step 7: Build Burn datasets ───────────────────────────────────────
        let train_dataset = LmDataset::new(train_windows);
        let val_dataset   = LmDataset::new(val_windows);
        tracing::debug!("{} training target tokens", train_dataset.target_tokens());

        // ── Step 8: Save config for generation / resume ───────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.output_dir)?;
        ckpt_manager.save_config(&cfg)?;

        // ── Step 9: Run training loop (Layer 5) ───────────────────────────────
        run_training(&cfg, train_dataset, val_dataset, &ckpt_manager)
    }
}

/// Encode every text and join them into one id stream, each followed
/// by <eos> so the model learns where one document ends instead of
/// blending it into the next.
pub fn encode_stream(tokenizer: &Tokenizer, texts: &[String]) -> Result<Vec<u32>> {
    let mut stream = Vec::new();
    for text in texts {
        stream.extend(encode_ids(tokenizer, text)?);
        stream.push(EOS_ID);
    }
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_heads_must_divide_d_model() {
        let cfg = TrainConfig { d_model: 100, num_heads: 8, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_val_fraction_range() {
        let cfg = TrainConfig { val_fraction: 1.0, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = TrainConfig { val_fraction: 0.0, ..TrainConfig::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_model_config_carries_pad_id_and_context() {
        let cfg   = TrainConfig { seq_len: 32, vocab_size: 500, ..TrainConfig::default() };
        let model = cfg.model_config();
        assert_eq!(model.max_seq_len, 32);
        assert_eq!(model.vocab_size, 500);
        assert_eq!(model.pad_id, PAD_ID as usize);
    }

    #[test]
    fn test_stream_ends_every_document_with_eos() {
        let dir   = tempfile::tempdir().unwrap();
        let texts = vec!["red green".to_string(), "blue".to_string(), String::new()];
        let tok   = TokenizerStore::new(dir.path())
            .load_or_build(TokenizerKind::Word, &texts, 10)
            .unwrap();

        let id = |w: &str| tok.token_to_id(w).unwrap();
        let stream = encode_stream(&tok, &texts).unwrap();

        assert_eq!(
            stream,
            vec![id("red"), id("green"), EOS_ID, id("blue"), EOS_ID, EOS_ID]
        );
    }

    #[test]
    fn test_missing_corpus_fails_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            data_path:  dir.path().join("missing.txt").to_string_lossy().into_owned(),
            output_dir: dir.path().join("out").to_string_lossy().into_owned(),
            ..TrainConfig::default()
        };
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }
}
