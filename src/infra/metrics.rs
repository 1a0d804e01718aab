// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per epoch to {output_dir}/metrics.csv.
//
// Columns:
//   epoch        epoch number (1-based, continues across resumes)
//   train_loss   mean total loss over training batches
//   val_loss     mean total loss on the validation set
//   policy_loss  validation cross-entropy (actor head)
//   value_loss   validation MSE (critic head)
//   perplexity   exp(policy_loss)
//   token_acc    greedy next-token accuracy on non-pad targets
//   lr           learning rate at the end of the epoch
//
// How to read it:
//   - policy_loss / perplexity should fall every epoch
//   - val_loss rising while train_loss falls → overfitting
//   - value_loss tracks how well the critic predicts whether the
//     actor's greedy guess is right; it drops fastest early on
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const CSV_HEADER: &str = "epoch,train_loss,val_loss,policy_loss,value_loss,perplexity,token_acc,lr";

#[derive(Debug, Clone)]
pub struct EpochMetrics {
    pub epoch:       usize,
    pub train_loss:  f64,
    pub val_loss:    f64,
    pub policy_loss: f64,
    pub value_loss:  f64,
    pub perplexity:  f64,
    pub token_acc:   f64,
    pub lr:          f64,
}

impl EpochMetrics {
    /// Returns true if this epoch beat the previous best validation loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss.is_finite() && self.val_loss < best_val_loss
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so resumed
    /// runs keep appending to the same log.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{CSV_HEADER}")?;
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.4},{:.6},{:.8}",
            m.epoch, m.train_loss, m.val_loss, m.policy_loss,
            m.value_loss, m.perplexity, m.token_acc, m.lr,
        )?;
        Ok(())
    }

    /// Lowest finite val_loss logged for an epoch before `before_epoch`.
    /// A resumed run starts from this instead of infinity so the best
    /// checkpoint is only replaced by a real improvement.
    pub fn best_val_loss(&self, before_epoch: usize) -> Result<Option<f64>> {
        let csv = fs::read_to_string(&self.csv_path)
            .with_context(|| format!("Cannot read '{}'", self.csv_path.display()))?;

        let best = csv
            .lines()
            .skip(1)
            .filter_map(|line| {
                let mut cols = line.split(',');
                let epoch: usize = cols.next()?.trim().parse().ok()?;
                let _train       = cols.next()?;
                let val: f64     = cols.next()?.trim().parse().ok()?;
                (epoch < before_epoch && val.is_finite()).then_some(val)
            })
            .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.min(v))));
        Ok(best)
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
