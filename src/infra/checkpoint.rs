// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights with Burn's CompactRecorder
// and the training config as JSON.
//
// File layout inside the output directory:
//     model_epoch_1.mpk    ← weights after epoch 1
//     model_epoch_2.mpk
//     ...
//     model_best.mpk       ← weights with the lowest validation loss
//     latest_epoch.json    ← number of the newest epoch file
//     train_config.json    ← hyperparameters used to build the model
//     metrics.csv          ← per-epoch losses (see infra::metrics)
//
// CompactRecorder stores half-precision weights, so a reload
// matches the saved model to about three decimal places.
//
// The config is needed to rebuild an identically-shaped model
// before weights can be loaded into it; CompactRecorder refuses
// records that don't match the module structure.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::ActorCriticModel;

const LATEST_FILE: &str = "latest_epoch.json";
const CONFIG_FILE: &str = "train_config.json";
const BEST_STEM:   &str = "model_best";

/// Which saved weights to restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointChoice {
    Latest,
    Best,
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a manager for `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Save weights for `epoch` and move the latest-epoch pointer to it.
    pub fn save_model<B: Backend>(&self, model: &ActorCriticModel<B>, epoch: usize) -> Result<()> {
        self.record(model, &format!("model_epoch_{epoch}"))?;

        let latest_path = self.dir.join(LATEST_FILE);
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", latest_path.display()))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Overwrite the best-so-far weights.
    pub fn save_best<B: Backend>(&self, model: &ActorCriticModel<B>) -> Result<()> {
        self.record(model, BEST_STEM)
    }

    fn record<B: Backend>(&self, model: &ActorCriticModel<B>, stem: &str) -> Result<()> {
        // The recorder appends its own extension
        let path = self.dir.join(stem);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))
    }

    /// Load weights into `model`, which must have the saved architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  ActorCriticModel<B>,
        choice: CheckpointChoice,
        device: &B::Device,
    ) -> Result<ActorCriticModel<B>> {
        let stem = match choice {
            CheckpointChoice::Latest => {
                let epoch = self.latest_epoch()?.with_context(|| {
                    format!("No checkpoint in '{}'. Have you run 'train' first?", self.dir.display())
                })?;
                tracing::info!("Loading checkpoint from epoch {}", epoch);
                format!("model_epoch_{epoch}")
            }
            CheckpointChoice::Best => {
                tracing::info!("Loading best checkpoint");
                BEST_STEM.to_string()
            }
        };

        let path   = self.dir.join(stem);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' first.",
                path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config '{}'", path.display()))
    }

    /// Newest saved epoch, or None if nothing has been saved yet.
    pub fn latest_epoch(&self) -> Result<Option<usize>> {
        let path = self.dir.join(LATEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        Ok(Some(serde_json::from_str::<usize>(s.trim())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::ActorCriticConfig;

    type TestBackend = burn::backend::NdArray;

    fn tiny_model(device: &<TestBackend as Backend>::Device) -> ActorCriticModel<TestBackend> {
        ActorCriticConfig::new(20, 8, 16, 2, 1, 32).init(device)
    }

    #[test]
    fn test_config_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        let mut cfg = TrainConfig::default();
        cfg.vocab_size = 1234;
        cfg.seed       = 99;
        ckpt.save_config(&cfg).unwrap();

        let back = ckpt.load_config().unwrap();
        assert_eq!(back.vocab_size, 1234);
        assert_eq!(back.seed, 99);
        assert_eq!(back.tokenizer, cfg.tokenizer);
    }

    #[test]
    fn test_latest_epoch_pointer() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let model  = tiny_model(&device);

        assert_eq!(ckpt.latest_epoch().unwrap(), None);
        ckpt.save_model(&model, 1).unwrap();
        ckpt.save_model(&model, 2).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), Some(2));
    }

    #[test]
    fn test_weights_round_trip() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();

        let saved = tiny_model(&device);
        ckpt.save_best(&saved).unwrap();

        let fresh  = tiny_model(&device);
        let loaded = ckpt.load_model(fresh, CheckpointChoice::Best, &device).unwrap();

        let a: Vec<f32> = saved.value_head.weight.val().into_data().to_vec().unwrap();
        let b: Vec<f32> = loaded.value_head.weight.val().into_data().to_vec().unwrap();
        assert_eq!(a.len(), b.len());
        // Half-precision storage
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-3, "{x} vs {y}");
        }
        assert!(dir.path().join("model_best.mpk").exists());
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        assert!(ckpt.load_model(tiny_model(&device), CheckpointChoice::Latest, &device).is_err());
        assert!(ckpt.load_config().is_err());
    }
}
