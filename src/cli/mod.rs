// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses command line arguments with clap and hands off to the
// use cases in Layer 2. Printing to stdout happens here.
//
//   1. `train`    — build vocabulary, train, checkpoint
//   2. `generate` — load a checkpoint and continue a prompt
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GenerateArgs, TrainArgs};

use crate::domain::traits::TextGenerator;
use crate::infra::checkpoint::CheckpointChoice;
use crate::ml::generator::SamplingOptions;

#[derive(Parser, Debug)]
#[command(
    name = "actor-critic-lm",
    version,
    about = "Train a transformer language model with an auxiliary value head on local text."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Generate(args) => run_generate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.data);
    let output_dir = args.output_dir.clone();

    let summary = TrainUseCase::new(args.into()).execute()?;

    if summary.epochs_run == 0 {
        println!("Nothing to do: epoch {} already reached.", summary.last_epoch);
    } else {
        println!(
            "Training complete after epoch {}. train_loss={:.4}, best val_loss={:.4}. Artifacts in '{}'.",
            summary.last_epoch, summary.last_train_loss, summary.best_val_loss, output_dir
        );
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    use crate::application::generate_use_case::GenerateUseCase;

    let choice = if args.best { CheckpointChoice::Best } else { CheckpointChoice::Latest };
    let options = SamplingOptions {
        max_tokens:  args.max_tokens,
        temperature: args.temperature,
    };

    let use_case = GenerateUseCase::new(&args.output_dir, choice, options, args.seed)?;
    let text     = use_case.generate(&args.prompt)?;

    println!("\n{} {}", args.prompt, text);
    Ok(())
}
