// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per training epoch to
// {checkpoint_dir}/metrics.csv:
//
//   epoch,train_loss,forward,reverse,cycle_structure,cycle_spectrum,val_loss,improved
//   1,1.204511,0.310022,0.402114,0.297501,0.289250,0.688310,true
//   ...
//
// The train_* columns are means over the epoch's mini-batches;
// val_loss is forward + reverse on the validation split.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::ml::loss::LossScalars;

const HEADER: &str = "epoch,train_loss,forward,reverse,cycle_structure,cycle_spectrum,val_loss,improved";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:           usize,
    pub train_loss:      f64,
    pub forward:         f64,
    pub reverse:         f64,
    pub cycle_structure: f64,
    pub cycle_spectrum:  f64,
    pub val_loss:        f64,
    /// Whether this epoch became the new best checkpoint
    pub improved:        bool,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train: LossScalars, val_loss: f64, improved: bool) -> Self {
        Self {
            epoch,
            train_loss:      train.total,
            forward:         train.forward,
            reverse:         train.reverse,
            cycle_structure: train.cycle_structure,
            cycle_spectrum:  train.cycle_spectrum,
            val_loss,
            improved,
        }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Starts a fresh metrics.csv in `dir`, replacing any previous run's log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)?;
        writeln!(f, "{HEADER}")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{}",
            m.epoch,
            m.train_loss,
            m.forward,
            m.reverse,
            m.cycle_structure,
            m.cycle_spectrum,
            m.val_loss,
            m.improved,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
