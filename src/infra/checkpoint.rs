// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// A checkpoint is a directory:
//
//   checkpoints/
//     model.bin          ← named parameter map (bincode)
//     metadata.json      ← model config, column labels and the
//                          normalizer bounds fit during training
//     train_config.json  ← the full training configuration
//     metrics.csv        ← written by MetricsLogger
//
// Prediction rebuilds the model from metadata.json, then loads
// model.bin into it by parameter name.

use anyhow::{Context, Result};
use std::{
    fs,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::normalizer::MinMaxNormalizer;
use crate::ml::{model::BidirectionalConfig, params::ParamMap};

const WEIGHTS_FILE:  &str = "model.bin";
const METADATA_FILE: &str = "metadata.json";
const CONFIG_FILE:   &str = "train_config.json";

/// Everything besides the weights that prediction needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub model:          BidirectionalConfig,
    /// Structure column names, in model order
    pub struct_names:   Vec<String>,
    /// Spectrum column labels (wavelengths), in model order
    pub wavelengths:    Vec<String>,
    pub structure_norm: MinMaxNormalizer,
    pub spectrum_norm:  MinMaxNormalizer,
    pub best_epoch:     Option<usize>,
    pub best_val_loss:  Option<f64>,
}

/// Manages saving and loading of checkpoints in one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write weights and metadata, replacing any previous checkpoint.
    pub fn save(&self, params: &ParamMap, metadata: &CheckpointMetadata) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))?;

        let weights_path = self.dir.join(WEIGHTS_FILE);
        let file = fs::File::create(&weights_path)
            .with_context(|| format!("Failed to create '{}'", weights_path.display()))?;
        bincode::serialize_into(BufWriter::new(file), params)
            .with_context(|| format!("Failed to save weights to '{}'", weights_path.display()))?;

        let metadata_path = self.dir.join(METADATA_FILE);
        fs::write(&metadata_path, serde_json::to_string_pretty(metadata)?)
            .with_context(|| format!("Failed to write '{}'", metadata_path.display()))?;

        tracing::debug!("Saved checkpoint with {} tensors to '{}'", params.len(), self.dir.display());
        Ok(())
    }

    pub fn load(&self) -> Result<(ParamMap, CheckpointMetadata)> {
        let metadata_path = self.dir.join(METADATA_FILE);
        let json = fs::read_to_string(&metadata_path)
            .with_context(|| {
                format!(
                    "Cannot read '{}'. Have you run 'train' first?",
                    metadata_path.display()
                )
            })?;
        let metadata: CheckpointMetadata = serde_json::from_str(&json)
            .with_context(|| format!("Malformed checkpoint metadata '{}'", metadata_path.display()))?;

        let weights_path = self.dir.join(WEIGHTS_FILE);
        let file = fs::File::open(&weights_path)
            .with_context(|| format!("Cannot open checkpoint weights '{}'", weights_path.display()))?;
        let params: ParamMap = bincode::deserialize_from(BufReader::new(file))
            .with_context(|| format!("Malformed checkpoint weights '{}'", weights_path.display()))?;

        tracing::info!("Loaded {} tensors from '{}'", params.len(), self.dir.display());
        Ok((params, metadata))
    }

    /// Save the training configuration next to the weights.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::params::StoredTensor;

    fn metadata() -> CheckpointMetadata {
        CheckpointMetadata {
            model:          BidirectionalConfig::new(2, 3),
            struct_names:   vec!["thickness".into(), "radius".into()],
            wavelengths:    vec!["400".into(), "500".into(), "600".into()],
            structure_norm: MinMaxNormalizer::fit(&[vec![0.0, 1.0], vec![2.0, 3.0]]).unwrap(),
            spectrum_norm:  MinMaxNormalizer::fit(&[vec![0.0, 0.1, 0.2]]).unwrap(),
            best_epoch:     Some(4),
            best_val_loss:  Some(0.0125),
        }
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("ckpt"));

        let mut params = ParamMap::new();
        params.insert(
            "structure_head.weight".into(),
            StoredTensor { shape: vec![2, 2], values: vec![0.5, -1.0, 2.0, 0.25] },
        );

        ckpt.save(&params, &metadata()).unwrap();
        let (loaded, meta) = ckpt.load().unwrap();

        assert_eq!(loaded, params);
        assert_eq!(meta.struct_names, vec!["thickness", "radius"]);
        assert_eq!(meta.model.spectrum_dim, 3);
        assert_eq!(meta.structure_norm, metadata().structure_norm);
        assert_eq!(meta.best_epoch, Some(4));
    }

    #[test]
    fn test_load_without_training_explains_itself() {
        let dir = tempfile::tempdir().unwrap();
        let err = CheckpointManager::new(dir.path()).load().unwrap_err();
        assert!(format!("{err:#}").contains("Have you run 'train' first?"));
    }

    #[test]
    fn test_config_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        let cfg  = TrainConfig { max_epochs: 7, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();

        let json  = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        let saved: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(saved.max_epochs, 7);
        assert_eq!(saved.checkpoint_dir, cfg.checkpoint_dir);
    }
}
