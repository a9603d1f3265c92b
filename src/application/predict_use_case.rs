// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Loads a checkpoint once, then serves either direction:
//
//   predict-spectrum:  structure.csv → spectrum.csv
//                      (+ optional comparison against a
//                       reference spectrum file)
//   predict-structure: spectrum.csv  → structure.csv

use anyhow::{Context, Result};
use burn::prelude::*;
use std::path::Path;

use crate::data::loader::{write_table, CsvTableReader};
use crate::domain::{direction::Direction, table::Table, traits::TableSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    report::{compare_spectra, write_comparison_csv, SampleComparison},
};
use crate::ml::{
    backend::{default_device, InferBackend},
    params::LoadReport,
    predictor::Predictor,
};

/// Result of one prediction request.
#[derive(Debug)]
pub struct PredictOutcome {
    pub predicted:   Table,
    /// Filled when a reference spectrum was supplied
    pub comparisons: Vec<SampleComparison>,
}

pub struct PredictUseCase<B: Backend = InferBackend> {
    predictor:   Predictor<B>,
    load_report: LoadReport,
    reader:      CsvTableReader,
}

impl PredictUseCase<InferBackend> {
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        Self::with_device(checkpoint_dir, &default_device())
    }
}

impl<B: Backend> PredictUseCase<B> {
    pub fn with_device(checkpoint_dir: &str, device: &B::Device) -> Result<Self> {
        let ckpt = CheckpointManager::new(checkpoint_dir);
        let (predictor, load_report) = Predictor::from_checkpoint(&ckpt, device)?;
        Ok(Self { predictor, load_report, reader: CsvTableReader::new() })
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn predictor(&self) -> &Predictor<B> {
        &self.predictor
    }

    /// Forward direction. With `reference`, the predictions are compared
    /// against it; with `report` as well, the long-format comparison is
    /// written there.
    pub fn predict_spectrum(
        &self,
        structure_path: &Path,
        output_path:    &Path,
        reference:      Option<&Path>,
        report:         Option<&Path>,
    ) -> Result<PredictOutcome> {
        let predicted = self.run(Direction::Forward, structure_path, output_path)?;

        let comparisons = match reference {
            Some(reference_path) => {
                let reference = self.read(reference_path)?;
                if let Some(report_path) = report {
                    write_comparison_csv(report_path, &predicted, &reference)?;
                }
                compare_spectra(&predicted, &reference)?
            }
            None => {
                if report.is_some() {
                    tracing::warn!("--report ignored: no --reference spectrum given");
                }
                Vec::new()
            }
        };

        Ok(PredictOutcome { predicted, comparisons })
    }

    /// Reverse direction.
    pub fn predict_structure(&self, spectrum_path: &Path, output_path: &Path) -> Result<PredictOutcome> {
        let predicted = self.run(Direction::Reverse, spectrum_path, output_path)?;
        Ok(PredictOutcome { predicted, comparisons: Vec::new() })
    }

    fn run(&self, direction: Direction, input_path: &Path, output_path: &Path) -> Result<Table> {
        let input = self.read(input_path)?;
        tracing::info!("Predicting {} for {} rows", direction, input.len());

        let predicted = self.predictor.predict(direction, &input.rows)?;
        write_table(output_path, &predicted)?;
        tracing::info!("Wrote predictions to '{}'", output_path.display());
        Ok(predicted)
    }

    fn read(&self, path: &Path) -> Result<Table> {
        self.reader
            .read(path)
            .with_context(|| format!("Failed to load '{}'", path.display()))
    }
}
