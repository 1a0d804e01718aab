// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `generate`, and all
// their flags. clap's derive macros generate --help text, error
// messages for missing args, and string → number conversion.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::infra::tokenizer_store::TokenizerKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the actor-critic language model on a text corpus
    Train(TrainArgs),

    /// Continue a prompt with a trained checkpoint
    Generate(GenerateArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// A single .txt corpus, or a directory of .txt files
    #[arg(long, default_value = "data/corpus.txt")]
    pub data: String,

    /// Where tokenizer, config, checkpoints and metrics are written
    #[arg(long, default_value = "checkpoints")]
    pub output_dir: String,

    /// Vocabulary kind: whole words by frequency, or learned BPE subwords
    #[arg(long, value_enum, default_value_t = TokenizerKind::Word)]
    pub tokenizer: TokenizerKind,

    /// Maximum vocabulary size, special tokens included
    #[arg(long, default_value_t = 10_000)]
    pub vocab_size: usize,

    /// Tokens per training window (model context length)
    #[arg(long, default_value_t = 128)]
    pub seq_len: usize,

    /// Step between consecutive windows; < seq_len makes them overlap
    #[arg(long, default_value_t = 64)]
    pub stride: usize,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Peak learning rate, reached after the warmup steps
    #[arg(long, default_value_t = 5e-4)]
    pub lr: f64,

    #[arg(long, default_value_t = 400)]
    pub warmup_steps: usize,

    /// Global gradient-norm clip
    #[arg(long, default_value_t = 1.0)]
    pub grad_clip: f32,

    /// Weight of the value-head MSE relative to the cross-entropy
    #[arg(long, default_value_t = 0.5)]
    pub value_coef: f64,

    /// Hidden dimension of the transformer
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// Attention heads; must divide d_model
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 4)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Fraction of windows held out for validation
    #[arg(long, default_value_t = 0.1)]
    pub val_fraction: f64,

    /// Seed for the split and batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// DataLoader worker threads
    #[arg(long, default_value_t = 2)]
    pub num_workers: usize,

    /// Continue from the latest checkpoint in --output-dir
    #[arg(long)]
    pub resume: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:    a.data,
            output_dir:   a.output_dir,
            tokenizer:    a.tokenizer,
            vocab_size:   a.vocab_size,
            seq_len:      a.seq_len,
            stride:       a.stride,
            batch_size:   a.batch_size,
            epochs:       a.epochs,
            lr:           a.lr,
            warmup_steps: a.warmup_steps,
            grad_clip:    a.grad_clip,
            value_coef:   a.value_coef,
            d_model:      a.d_model,
            num_heads:    a.num_heads,
            num_layers:   a.num_layers,
            d_ff:         a.d_ff,
            dropout:      a.dropout,
            val_fraction: a.val_fraction,
            seed:         a.seed,
            num_workers:  a.num_workers,
            resume:       a.resume,
        }
    }
}

/// All arguments for the `generate` command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Text to continue
    #[arg(long)]
    pub prompt: String,

    /// Directory a previous `train` run wrote to
    #[arg(long, default_value = "checkpoints")]
    pub output_dir: String,

    #[arg(long, default_value_t = 50)]
    pub max_tokens: usize,

    /// 0 = greedy decoding
    #[arg(long, default_value_t = 0.8)]
    pub temperature: f32,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Use the best-validation weights instead of the latest epoch
    #[arg(long)]
    pub best: bool,
}
