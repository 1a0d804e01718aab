// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader, Adam with
// gradient clipping, and a Noam learning-rate schedule.
//
// Key Burn insight:
//   - Training runs on an AutodiffBackend (Autodiff<Wgpu> in the
//     binary, Autodiff<NdArray> in tests)
//   - model.valid() returns the model on B::InnerBackend, so the
//     validation loader must batch for the inner backend too
//   - Dropout is a no-op on the inner backend
//
// Per epoch:
//   1. forward_loss → backward → clip → Adam step, lr from Noam
//   2. validation loss / perplexity / token accuracy
//   3. CSV row, epoch checkpoint, best checkpoint on improvement
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam,
//            Vaswani et al. (2017) §5.3 (warmup schedule)

use std::sync::Arc;

use anyhow::{bail, Result};
use burn::{
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    grad_clipping::GradientClippingConfig,
    lr_scheduler::{noam::NoamLrSchedulerConfig, LrScheduler},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{LmBatch, LmBatcher},
    dataset::LmDataset,
};
use crate::infra::{
    checkpoint::{CheckpointChoice, CheckpointManager},
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::model::ActorCriticModel;

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Log a running loss every this many optimizer steps
const LOG_EVERY: usize = 50;

/// What a finished run reports back to the use case.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    /// Epochs actually run by this invocation (0 if already complete)
    pub epochs_run:     usize,
    pub last_epoch:     usize,
    pub best_val_loss:  f64,
    pub last_train_loss: f64,
}

/// Validation-pass aggregates, averaged per batch
struct EvalStats {
    loss:        f64,
    policy_loss: f64,
    value_loss:  f64,
    token_acc:   f64,
    batches:     usize,
}

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: LmDataset,
    val_dataset:   LmDataset,
    ckpt_manager:  &CheckpointManager,
) -> Result<TrainingSummary> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend>(cfg, train_dataset, val_dataset, ckpt_manager, device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: LmDataset,
    val_dataset:   LmDataset,
    ckpt_manager:  &CheckpointManager,
    device:        B::Device,
) -> Result<TrainingSummary> {
    if train_dataset.is_empty() {
        bail!("Not enough text to form a single training window");
    }
    let has_validation = !val_dataset.is_empty();
    if !has_validation {
        tracing::warn!("Validation set is empty; every epoch will overwrite the best checkpoint");
    }

    // ── Build (or restore) model ──────────────────────────────────────────────
    let mut model: ActorCriticModel<B> = cfg.model_config().init(&device);
    let mut start_epoch = 1;

    if cfg.resume {
        if let Some(latest) = ckpt_manager.latest_epoch()? {
            model = ckpt_manager.load_model(model, CheckpointChoice::Latest, &device)?;
            start_epoch = latest + 1;
            tracing::info!("Resuming after epoch {}", latest);
        } else {
            tracing::info!("Nothing to resume in '{}', starting fresh", ckpt_manager.dir().display());
        }
    }

    if start_epoch > cfg.epochs {
        tracing::info!("All {} epochs already trained", cfg.epochs);
        return Ok(TrainingSummary {
            epochs_run: 0, last_epoch: start_epoch - 1,
            best_val_loss: f64::NAN, last_train_loss: f64::NAN,
        });
    }

    tracing::info!(
        "Model ready: {} layers, d_model={}, vocab={}, {} parameters",
        cfg.num_layers, cfg.d_model, cfg.vocab_size, model.num_params()
    );

    // ── Adam optimiser with global-norm clipping ──────────────────────────────
    let optim_cfg = AdamConfig::new()
        .with_epsilon(1e-8)
        .with_grad_clipping(Some(GradientClippingConfig::Norm(cfg.grad_clip)));
    let mut optim = optim_cfg.init();

    // ── Noam schedule ─────────────────────────────────────────────────────────
    // Noam peaks at init_lr / sqrt(d_model * warmup) when step == warmup;
    // rescale so that peak equals cfg.lr.
    let warmup    = cfg.warmup_steps.max(1);
    let noam_init = cfg.lr * ((cfg.d_model * warmup) as f64).sqrt();
    let mut lr_scheduler = NoamLrSchedulerConfig::new(noam_init)
        .with_warmup_steps(warmup)
        .with_model_size(cfg.d_model)
        .init()
        .map_err(|e| anyhow::anyhow!("Invalid LR schedule: {e}"))?;

    // ── Data loaders ──────────────────────────────────────────────────────────
    let batches_per_epoch = train_dataset.len().div_ceil(cfg.batch_size);

    let train_loader: Arc<dyn DataLoader<B, LmBatch<B>>> = DataLoaderBuilder::new(LmBatcher::new())
        .batch_size(cfg.batch_size)
        .shuffle(shuffle_seed(cfg.seed, start_epoch))
        .num_workers(cfg.num_workers)
        .build(train_dataset);

    // Inner backend — no autodiff overhead
    let val_loader: Arc<dyn DataLoader<B::InnerBackend, LmBatch<B::InnerBackend>>> =
        DataLoaderBuilder::new(LmBatcher::new())
            .batch_size(cfg.batch_size)
            .num_workers(cfg.num_workers)
            .build(val_dataset);

    // A resumed run continues the schedule where it left off
    let mut lr = cfg.lr;
    for _ in 0..(start_epoch - 1) * batches_per_epoch {
        lr = lr_scheduler.step();
    }

    let metrics_logger = MetricsLogger::new(ckpt_manager.dir())?;
    tracing::info!("Logging metrics to '{}'", metrics_logger.csv_path().display());
    let mut best_val_loss = match metrics_logger.best_val_loss(start_epoch)? {
        Some(prior) if start_epoch > 1 => {
            tracing::info!("Best val_loss so far: {:.4}", prior);
            prior
        }
        _ => f64::INFINITY,
    };
    let mut last_train_loss = f64::NAN;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in start_epoch..=cfg.epochs {
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let loss = model.forward_loss(batch, cfg.value_coef);

            let loss_val: f64 = loss.total.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            lr = lr_scheduler.step();
            let grads = loss.total.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);

            if train_batches % LOG_EVERY == 0 {
                tracing::debug!(
                    "epoch {} step {}/{} loss={:.4} lr={:.2e}",
                    epoch, train_batches, batches_per_epoch,
                    train_loss_sum / train_batches as f64, lr
                );
            }
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };
        last_train_loss = avg_train_loss;

        // ── Validation phase ──────────────────────────────────────────────────
        let stats = evaluate(&model.valid(), val_loader.as_ref(), cfg.value_coef);

        let metrics = EpochMetrics {
            epoch,
            train_loss:  avg_train_loss,
            val_loss:    stats.loss,
            policy_loss: stats.policy_loss,
            value_loss:  stats.value_loss,
            perplexity:  stats.policy_loss.exp(),
            token_acc:   stats.token_acc,
            lr,
        };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | ppl={:.2} | value_mse={:.4} | acc={:.1}%",
            epoch, cfg.epochs, metrics.train_loss, metrics.val_loss,
            metrics.perplexity, metrics.value_loss, metrics.token_acc * 100.0,
        );
        metrics_logger.log(&metrics)?;

        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);

        if !has_validation || metrics.is_improvement(best_val_loss) {
            if stats.batches > 0 {
                best_val_loss = metrics.val_loss;
            }
            ckpt_manager.save_best(&model)?;
            tracing::info!("New best checkpoint (val_loss={:.4})", metrics.val_loss);
        }
    }

    tracing::info!("Training complete!");
    Ok(TrainingSummary {
        epochs_run: cfg.epochs + 1 - start_epoch,
        last_epoch: cfg.epochs,
        best_val_loss,
        last_train_loss,
    })
}

/// Shuffle seed for a loader that starts at `start_epoch`, so a resumed
/// run does not replay the batch order of epoch 1.
fn shuffle_seed(seed: u64, start_epoch: usize) -> u64 {
    seed.wrapping_add(start_epoch as u64 - 1)
}

fn evaluate<B: Backend>(
    model:      &ActorCriticModel<B>,
    loader:     &dyn DataLoader<B, LmBatch<B>>,
    value_coef: f64,
) -> EvalStats {
    let mut loss_sum   = 0.0f64;
    let mut policy_sum = 0.0f64;
    let mut value_sum  = 0.0f64;
    let mut correct    = 0usize;
    let mut counted    = 0usize;
    let mut batches    = 0usize;

    for batch in loader.iter() {
        let loss = model.forward_loss(batch, value_coef);
        loss_sum   += loss.total.into_scalar().elem::<f64>();
        policy_sum += loss.policy.into_scalar().elem::<f64>();
        value_sum  += loss.value.into_scalar().elem::<f64>();
        correct    += loss.correct;
        counted    += loss.counted;
        batches    += 1;
    }

    let mean = |sum: f64| if batches > 0 { sum / batches as f64 } else { f64::NAN };
    EvalStats {
        loss:        mean(loss_sum),
        policy_loss: mean(policy_sum),
        value_loss:  mean(value_sum),
        token_acc:   if counted > 0 { correct as f64 / counted as f64 } else { 0.0 },
        batches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::chunker::WindowChunker;

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    fn tiny_config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            output_dir:   dir.to_string_lossy().into_owned(),
            vocab_size:   16,
            seq_len:      8,
            stride:       4,
            batch_size:   4,
            epochs:       2,
            lr:           1e-3,
            warmup_steps: 2,
            d_model:      16,
            num_heads:    2,
            num_layers:   1,
            d_ff:         32,
            dropout:      0.0,
            num_workers:  1,
            ..TrainConfig::default()
        }
    }

    fn datasets() -> (LmDataset, LmDataset) {
        let stream: Vec<u32> = (0..120).map(|i| 4 + (i % 12)).collect();
        let windows = WindowChunker::new(8, 4).chunk(&stream);
        let val     = windows[..4].to_vec();
        (LmDataset::new(windows), LmDataset::new(val))
    }

    #[test]
    fn test_training_writes_checkpoints_and_metrics() {
        let dir  = tempfile::tempdir().unwrap();
        let cfg  = tiny_config(dir.path());
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let (train, val) = datasets();

        let summary = train_loop::<TestBackend>(&cfg, train, val, &ckpt, Default::default()).unwrap();

        assert_eq!(summary.epochs_run, 2);
        assert!(summary.last_train_loss.is_finite());
        assert!(summary.best_val_loss.is_finite());
        assert_eq!(ckpt.latest_epoch().unwrap(), Some(2));
        assert!(dir.path().join("model_best.mpk").exists());

        let csv = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_resume_continues_after_latest_epoch() {
        let dir  = tempfile::tempdir().unwrap();
        let mut cfg = tiny_config(dir.path());
        cfg.epochs  = 1;
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        let (train, val) = datasets();
        train_loop::<TestBackend>(&cfg, train, val, &ckpt, Default::default()).unwrap();

        cfg.epochs      = 2;
        cfg.resume      = true;
        cfg.num_workers = 2;
        let (train, val) = datasets();
        let summary = train_loop::<TestBackend>(&cfg, train, val, &ckpt, Default::default()).unwrap();

        assert_eq!(summary.epochs_run, 1);
        assert_eq!(ckpt.latest_epoch().unwrap(), Some(2));

        // Nothing left to do
        let (train, val) = datasets();
        let summary = train_loop::<TestBackend>(&cfg, train, val, &ckpt, Default::default()).unwrap();
        assert_eq!(summary.epochs_run, 0);
    }

    #[test]
    fn test_resume_keeps_earlier_best_when_val_loss_worsens() {
        let dir  = tempfile::tempdir().unwrap();
        let mut cfg = tiny_config(dir.path());
        cfg.epochs  = 1;
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        let (train, val) = datasets();
        let first = train_loop::<TestBackend>(&cfg, train, val, &ckpt, Default::default()).unwrap();
        let best_after_first = std::fs::read(dir.path().join("model_best.mpk")).unwrap();

        // A wildly large step size wrecks the weights in epoch 2
        cfg.epochs = 2;
        cfg.resume = true;
        cfg.lr     = 50.0;
        let (train, val) = datasets();
        let second = train_loop::<TestBackend>(&cfg, train, val, &ckpt, Default::default()).unwrap();

        assert_eq!(second.epochs_run, 1);
        // Restored from metrics.csv, which keeps six decimals
        assert!((second.best_val_loss - first.best_val_loss).abs() < 1e-5);
        assert_eq!(
            std::fs::read(dir.path().join("model_best.mpk")).unwrap(),
            best_after_first,
        );
        assert_eq!(
            std::fs::read(dir.path().join("model_epoch_1.mpk")).unwrap(),
            best_after_first,
        );
    }

    #[test]
    fn test_shuffle_seed_moves_with_start_epoch() {
        assert_eq!(shuffle_seed(42, 1), 42);
        assert_ne!(shuffle_seed(42, 1), shuffle_seed(42, 2));
        assert_eq!(shuffle_seed(u64::MAX, 2), 0);
    }

    #[test]
    fn test_empty_training_set_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let cfg  = tiny_config(dir.path());
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        let res = train_loop::<TestBackend>(
            &cfg, LmDataset::new(vec![]), LmDataset::new(vec![]), &ckpt, Default::default(),
        );
        assert!(res.is_err());
    }
}
