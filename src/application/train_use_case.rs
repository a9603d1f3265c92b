// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load structure + spectrum CSVs   (Layer 4 - data)
//   Step 2: Fit normalizers and scale rows   (Layer 4 - data)
//   Step 3: Pair rows into samples           (Layer 4 - data)
//   Step 4: Seeded train/validation split    (Layer 4 - data)
//   Step 5: Build + validate the model       (Layer 5 - ml)
//   Step 6: Save config, open metrics log    (Layer 6 - infra)
//   Step 7: Run training loop                (Layer 5 - ml)
//   Step 8: Save best weights + metadata     (Layer 6 - infra)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::tensor::backend::AutodiffBackend;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{
    dataset::{pair_rows, SpectraDataset},
    loader::CsvTableReader,
    normalizer::MinMaxNormalizer,
    splitter::split_train_val,
};
use crate::domain::{error::SpectraError, table::Table, traits::TableSource};
use crate::infra::{
    checkpoint::{CheckpointManager, CheckpointMetadata},
    metrics::MetricsLogger,
};
use crate::ml::{
    backend::{default_device, TrainBackend},
    model::BidirectionalConfig,
    trainer::{train, TrainerOptions},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the checkpoint so a run can be inspected or repeated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub structure_path:  String,
    pub spectrum_path:   String,
    pub checkpoint_dir:  String,
    pub batch_size:      usize,
    pub max_epochs:      usize,
    pub lr:              f64,
    pub d_model:         usize,
    pub nhead:           usize,
    pub num_layers:      usize,
    pub dim_feedforward: usize,
    pub dropout:         f64,
    pub patience:        usize,
    pub min_delta:       f64,
    pub train_fraction:  f64,
    pub seed:            u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            structure_path:  "data/structure.csv".to_string(),
            spectrum_path:   "data/spectrum.csv".to_string(),
            checkpoint_dir:  "checkpoints".to_string(),
            batch_size:      32,
            max_epochs:      200,
            lr:              1e-3,
            d_model:         128,
            nhead:           8,
            num_layers:      3,
            dim_feedforward: 512,
            dropout:         0.1,
            patience:        20,
            min_delta:       1e-5,
            train_fraction:  0.8,
            seed:            42,
        }
    }
}

impl TrainConfig {
    fn validate(&self) -> Result<(), SpectraError> {
        if self.batch_size == 0 {
            return Err(SpectraError::InvalidInput("batch_size must be greater than zero".into()));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction <= 1.0) {
            return Err(SpectraError::InvalidInput(format!(
                "train_fraction must be in (0, 1], got {}", self.train_fraction,
            )));
        }
        if !(self.lr > 0.0) {
            return Err(SpectraError::InvalidInput(format!("lr must be positive, got {}", self.lr)));
        }
        Ok(())
    }

    fn model_config(&self, struct_dim: usize, spectrum_dim: usize) -> BidirectionalConfig {
        BidirectionalConfig::new(struct_dim, spectrum_dim)
            .with_d_model(self.d_model)
            .with_nhead(self.nhead)
            .with_num_layers(self.num_layers)
            .with_dim_feedforward(self.dim_feedforward)
            .with_dropout(self.dropout)
    }
}

/// What a finished run reports back to the CLI.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub checkpoint_dir: PathBuf,
    pub train_samples:  usize,
    pub val_samples:    usize,
    pub epochs_run:     usize,
    pub stopped_early:  bool,
    pub best_epoch:     Option<usize>,
    pub best_val_loss:  Option<f64>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
    reader: CsvTableReader,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config, reader: CsvTableReader::new() }
    }

    /// Execute the full training pipeline on the configured backend
    pub fn execute(&self) -> Result<TrainSummary> {
        self.run::<TrainBackend>(&default_device())
    }

    pub fn run<B: AutodiffBackend>(&self, device: &B::Device) -> Result<TrainSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load both tables ──────────────────────────────────────────
        let structures = self.load(&cfg.structure_path)?;
        let spectra    = self.load(&cfg.spectrum_path)?;
        tracing::info!(
            "Loaded {} samples: {} structure columns, {} wavelengths",
            structures.len(), structures.width(), spectra.width(),
        );

        // ── Step 2: Fit normalizers on the full training file ─────────────────
        let structure_norm = MinMaxNormalizer::fit(&structures.rows)?;
        let spectrum_norm  = MinMaxNormalizer::fit(&spectra.rows)?;

        // ── Step 3: Pair scaled rows ──────────────────────────────────────────
        let samples = pair_rows(
            structure_norm.transform(&structures.rows)?,
            spectrum_norm.transform(&spectra.rows)?,
        )?;

        // ── Step 4: Seeded split ──────────────────────────────────────────────
        // One RNG drives the split, the loader shuffle and weight init
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let (train_samples, val_samples) = split_train_val(samples, cfg.train_fraction, &mut rng);
        let (n_train, n_val) = (train_samples.len(), val_samples.len());
        tracing::info!("Split: {} train, {} validation", n_train, n_val);
        let shuffle_seed: u64 = rng.gen();
        B::seed(rng.gen());

        // ── Step 5: Model ─────────────────────────────────────────────────────
        let model_cfg = cfg.model_config(structures.width(), spectra.width());
        model_cfg.validate()?;
        let model = model_cfg.init::<B>(device);

        // ── Step 6: Checkpoint dir, config and metrics ────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 7: Training loop (Layer 5) ───────────────────────────────────
        let opts = TrainerOptions {
            batch_size:          cfg.batch_size,
            max_epochs:          cfg.max_epochs,
            lr:                  cfg.lr,
            patience:            cfg.patience,
            min_delta:           cfg.min_delta,
            shuffle_seed,
            abort_on_non_finite: true,
        };
        let outcome = train(
            model,
            SpectraDataset::new(train_samples),
            SpectraDataset::new(val_samples),
            &opts,
            device,
            Some(&metrics),
        )?;

        // ── Step 8: Persist the best model ────────────────────────────────────
        let metadata = CheckpointMetadata {
            model:         model_cfg,
            struct_names:  structures.header,
            wavelengths:   spectra.header,
            structure_norm,
            spectrum_norm,
            best_epoch:    outcome.best_epoch,
            best_val_loss: outcome.best_val_loss,
        };
        ckpt_manager.save(&outcome.model.to_param_map()?, &metadata)?;

        Ok(TrainSummary {
            checkpoint_dir: ckpt_manager.dir().to_path_buf(),
            train_samples:  n_train,
            val_samples:    n_val,
            epochs_run:     outcome.epochs_run,
            stopped_early:  outcome.stopped_early,
            best_epoch:     outcome.best_epoch,
            best_val_loss:  outcome.best_val_loss,
        })
    }

    fn load(&self, path: &str) -> Result<Table> {
        self.reader
            .read(Path::new(path))
            .with_context(|| format!("Failed to load training data '{path}'"))
    }
}
