// ============================================================
// Layer 5 — Predictor
// ============================================================
// Loads a trained checkpoint and runs either direction on raw
// (unnormalised) rows:
//
//   raw rows → normalise (input side) → model → denormalise
//            (output side) → labelled Table
//
// Loading is lenient: parameters missing from model.bin keep
// their fresh initialisation and are reported, not fatal.

use anyhow::Result;
use burn::prelude::*;

use crate::data::batcher::{rows_to_tensor, tensor_to_rows};
use crate::domain::{direction::Direction, error::SpectraError, table::Table};
use crate::infra::checkpoint::{CheckpointManager, CheckpointMetadata};
use crate::ml::{
    model::{BidirectionalModel, ModelInput},
    params::LoadReport,
};

pub struct Predictor<B: Backend> {
    model:    BidirectionalModel<B>,
    metadata: CheckpointMetadata,
    device:   B::Device,
}

impl<B: Backend> Predictor<B> {
    pub fn new(model: BidirectionalModel<B>, metadata: CheckpointMetadata, device: B::Device) -> Self {
        Self { model, metadata, device }
    }

    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: &B::Device) -> Result<(Self, LoadReport)> {
        let (params, metadata) = ckpt_manager.load()?;

        // Dropout is inert outside autodiff, but build with 0.0 anyway
        let model_cfg = metadata.model.clone().with_dropout(0.0);
        model_cfg.validate()?;
        let model: BidirectionalModel<B> = model_cfg.init(device);
        let (model, report) = model.load_param_map(&params);

        match report.mismatch() {
            None => tracing::info!(
                "Model loaded from {} ({} tensors)",
                ckpt_manager.dir().display(), report.loaded.len(),
            ),
            Some(mismatch) => tracing::warn!(
                "Partial load from {} ({} tensors restored): {mismatch}",
                ckpt_manager.dir().display(), report.loaded.len(),
            ),
        }

        Ok((Self::new(model, metadata, device.clone()), report))
    }

    pub fn metadata(&self) -> &CheckpointMetadata {
        &self.metadata
    }

    pub fn struct_names(&self) -> &[String] {
        &self.metadata.struct_names
    }

    pub fn wavelengths(&self) -> &[String] {
        &self.metadata.wavelengths
    }

    /// Predict raw output rows for raw input rows in `direction`.
    pub fn predict(&self, direction: Direction, rows: &[Vec<f32>]) -> Result<Table, SpectraError> {
        if rows.is_empty() {
            return Err(SpectraError::InvalidInput(format!(
                "no {} rows to predict from", direction.input_space(),
            )));
        }

        let (in_norm, out_norm, header) = match direction {
            Direction::Forward => (&self.metadata.structure_norm, &self.metadata.spectrum_norm, &self.metadata.wavelengths),
            Direction::Reverse => (&self.metadata.spectrum_norm, &self.metadata.structure_norm, &self.metadata.struct_names),
        };

        if header.len() != self.model.output_width(direction) {
            return Err(SpectraError::shape(
                format!("{} labels", direction.output_space()),
                self.model.output_width(direction),
                header.len(),
            ));
        }

        let expected = self.model.input_width(direction);
        if let Some(row) = rows.iter().find(|r| r.len() != expected) {
            return Err(SpectraError::shape(
                format!("{} input", direction.input_space()), expected, row.len(),
            ));
        }

        let normalised = in_norm.transform(rows)?;
        let input      = rows_to_tensor::<B>(normalised.iter().map(Vec::as_slice), &self.device);
        let input      = match direction {
            Direction::Forward => ModelInput::Structure(input),
            Direction::Reverse => ModelInput::Spectrum(input),
        };

        let output = tensor_to_rows(self.model.forward(input))?;
        let output = out_norm.inverse_transform(&output)?;
        tracing::debug!("Predicted {} rows ({direction})", output.len());

        Table::new(header.clone(), output)
    }

    /// structure rows → spectrum table labelled by wavelength
    pub fn predict_spectrum(&self, structures: &[Vec<f32>]) -> Result<Table, SpectraError> {
        self.predict(Direction::Forward, structures)
    }

    /// spectrum rows → structure table labelled by parameter name
    pub fn predict_structure(&self, spectra: &[Vec<f32>]) -> Result<Table, SpectraError> {
        self.predict(Direction::Reverse, spectra)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalizer::MinMaxNormalizer;
    use crate::ml::model::BidirectionalConfig;
    use burn::backend::NdArray;

    fn tiny_metadata() -> CheckpointMetadata {
        let structures = vec![vec![100.0, 10.0], vec![200.0, 30.0]];
        let spectra    = vec![vec![0.1, 0.2, 0.3], vec![0.6, 0.8, 0.9]];
        CheckpointMetadata {
            model: BidirectionalConfig::new(2, 3)
                .with_d_model(16)
                .with_nhead(2)
                .with_num_layers(1)
                .with_dim_feedforward(32),
            struct_names:   vec!["period".into(), "thickness".into()],
            wavelengths:    vec!["400".into(), "500".into(), "600".into()],
            structure_norm: MinMaxNormalizer::fit(&structures).unwrap(),
            spectrum_norm:  MinMaxNormalizer::fit(&spectra).unwrap(),
            best_epoch:     Some(1),
            best_val_loss:  Some(0.5),
        }
    }

    fn tiny_predictor() -> Predictor<NdArray> {
        let metadata = tiny_metadata();
        let device   = Default::default();
        let model    = metadata.model.init::<NdArray>(&device);
        Predictor::new(model, metadata, device)
    }

    #[test]
    fn test_predict_spectrum_labels_columns_by_wavelength() {
        let predictor = tiny_predictor();
        let table = predictor.predict_spectrum(&vec![vec![150.0, 20.0]; 4]).unwrap();
        assert_eq!(table.header, vec!["400", "500", "600"]);
        assert_eq!(table.len(), 4);
        assert!(table.rows.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_predict_structure_labels_columns_by_name() {
        let predictor = tiny_predictor();
        let table = predictor.predict_structure(&[vec![0.2, 0.4, 0.6]]).unwrap();
        assert_eq!(table.header, vec!["period", "thickness"]);
        assert_eq!(table.rows[0].len(), 2);
    }

    #[test]
    fn test_wrong_width_is_a_shape_error() {
        let predictor = tiny_predictor();
        let err = predictor.predict_spectrum(&[vec![1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, SpectraError::Shape { expected: 2, actual: 3, .. }));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let predictor = tiny_predictor();
        let err = predictor.predict_structure(&[]).unwrap_err();
        assert!(matches!(err, SpectraError::InvalidInput(_)));
    }

    #[test]
    fn test_from_checkpoint_round_trips_weights() {
        let dir      = tempfile::tempdir().unwrap();
        let manager  = CheckpointManager::new(dir.path());
        let original = tiny_predictor();
        manager.save(&original.model.to_param_map().unwrap(), &original.metadata).unwrap();

        let (loaded, report) = Predictor::<NdArray>::from_checkpoint(&manager, &Default::default()).unwrap();
        assert!(report.is_complete());

        let input = vec![vec![120.0, 12.0], vec![180.0, 25.0]];
        let a = original.predict_spectrum(&input).unwrap();
        let b = loaded.predict_spectrum(&input).unwrap();
        for (x, y) in a.rows.iter().flatten().zip(b.rows.iter().flatten()) {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_label_count_must_match_model_output() {
        let mut metadata = tiny_metadata();
        metadata.wavelengths.pop();
        let device    = Default::default();
        let model     = metadata.model.init::<NdArray>(&device);
        let predictor = Predictor::new(model, metadata, device);

        let err = predictor.predict_spectrum(&[vec![150.0, 20.0]]).unwrap_err();
        assert!(matches!(err, SpectraError::Shape { expected: 3, actual: 2, .. }));
        // the other direction is unaffected
        assert_eq!(predictor.predict_structure(&[vec![0.2, 0.4, 0.6]]).unwrap().width(), 2);
    }

    #[test]
    fn test_accessors_expose_checkpoint_labels() {
        let predictor = tiny_predictor();
        assert_eq!(predictor.struct_names(), ["period", "thickness"]);
        assert_eq!(predictor.wavelengths().len(), 3);
        assert_eq!(predictor.metadata().best_epoch, Some(1));
    }
}
