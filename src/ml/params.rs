// ============================================================
// Layer 5 — Named Parameters
// ============================================================
// Flattens the model into a map of dotted parameter names to
// plain tensors, e.g.
//
//   structure_embedding.weight               [struct_dim, d_model]
//   encoder.layers.0.self_attn.query.weight  [d_model, d_model]
//   encoder.layers.0.norm1.gamma             [d_model]
//
// Loading walks the same names and is lenient: a tensor whose
// name is absent or whose shape differs keeps its initialized
// value and is listed in the LoadReport instead of failing.

use std::collections::BTreeMap;

use burn::{
    module::Param,
    nn::{attention::MultiHeadAttention, LayerNorm, Linear},
    prelude::*,
    tensor::TensorData,
};
use serde::{Deserialize, Serialize};

use crate::domain::error::SpectraError;
use crate::ml::model::{BidirectionalModel, EncoderBlock, SharedEncoder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTensor {
    pub shape:  Vec<usize>,
    pub values: Vec<f32>,
}

pub type ParamMap = BTreeMap<String, StoredTensor>;

/// Outcome of a lenient load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Restored from the checkpoint
    pub loaded:     Vec<String>,
    /// Present in the checkpoint with a different shape
    pub skipped:    Vec<String>,
    /// Expected by the model, absent from the checkpoint
    pub missing:    Vec<String>,
    /// In the checkpoint, unknown to the model
    pub unexpected: Vec<String>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.missing.is_empty() && self.unexpected.is_empty()
    }

    /// The mismatch as an error value for logging, if there was one.
    pub fn mismatch(&self) -> Option<SpectraError> {
        if self.is_complete() {
            return None;
        }
        Some(SpectraError::CheckpointMismatch {
            skipped:    self.skipped.clone(),
            missing:    self.missing.clone(),
            unexpected: self.unexpected.clone(),
        })
    }
}

pub trait NamedParams: Sized {
    fn export(&self, prefix: &str, out: &mut ParamMap) -> Result<(), SpectraError>;
    fn import(self, prefix: &str, src: &ParamMap, report: &mut LoadReport) -> Self;
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn export_param<B: Backend, const D: usize>(
    name:  String,
    param: &Param<Tensor<B, D>>,
    out:   &mut ParamMap,
) -> Result<(), SpectraError> {
    let tensor = param.val();
    let shape  = tensor.dims().to_vec();
    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| SpectraError::InvalidInput(format!("cannot read parameter '{name}': {e:?}")))?;
    if values.len() != shape.iter().product::<usize>() {
        return Err(SpectraError::shape(name, shape.iter().product(), values.len()));
    }
    out.insert(name, StoredTensor { shape, values });
    Ok(())
}

fn import_param<B: Backend, const D: usize>(
    param:  Param<Tensor<B, D>>,
    name:   String,
    src:    &ParamMap,
    report: &mut LoadReport,
) -> Param<Tensor<B, D>> {
    let Some(stored) = src.get(&name) else {
        report.missing.push(name);
        return param;
    };

    let current = param.val();
    let dims    = current.dims();
    if stored.shape != dims || stored.values.len() != dims.iter().product::<usize>() {
        tracing::debug!("Skipping '{}': checkpoint shape {:?}, model shape {:?}", name, stored.shape, dims);
        report.skipped.push(name);
        return param;
    }

    let data   = TensorData::new(stored.values.clone(), dims);
    let tensor = Tensor::<B, D>::from_data(data, &current.device());
    report.loaded.push(name);
    Param::from_tensor(tensor)
}

impl<B: Backend> NamedParams for Linear<B> {
    fn export(&self, prefix: &str, out: &mut ParamMap) -> Result<(), SpectraError> {
        export_param(join(prefix, "weight"), &self.weight, out)?;
        if let Some(bias) = &self.bias {
            export_param(join(prefix, "bias"), bias, out)?;
        }
        Ok(())
    }

    fn import(mut self, prefix: &str, src: &ParamMap, report: &mut LoadReport) -> Self {
        self.weight = import_param(self.weight, join(prefix, "weight"), src, report);
        self.bias   = self.bias.map(|b| import_param(b, join(prefix, "bias"), src, report));
        self
    }
}

impl<B: Backend> NamedParams for LayerNorm<B> {
    fn export(&self, prefix: &str, out: &mut ParamMap) -> Result<(), SpectraError> {
        export_param(join(prefix, "gamma"), &self.gamma, out)?;
        export_param(join(prefix, "beta"), &self.beta, out)
    }

    fn import(mut self, prefix: &str, src: &ParamMap, report: &mut LoadReport) -> Self {
        self.gamma = import_param(self.gamma, join(prefix, "gamma"), src, report);
        self.beta  = import_param(self.beta, join(prefix, "beta"), src, report);
        self
    }
}

impl<B: Backend> NamedParams for MultiHeadAttention<B> {
    fn export(&self, prefix: &str, out: &mut ParamMap) -> Result<(), SpectraError> {
        self.query.export(&join(prefix, "query"), out)?;
        self.key.export(&join(prefix, "key"), out)?;
        self.value.export(&join(prefix, "value"), out)?;
        self.output.export(&join(prefix, "output"), out)
    }

    fn import(mut self, prefix: &str, src: &ParamMap, report: &mut LoadReport) -> Self {
        self.query  = self.query.import(&join(prefix, "query"), src, report);
        self.key    = self.key.import(&join(prefix, "key"), src, report);
        self.value  = self.value.import(&join(prefix, "value"), src, report);
        self.output = self.output.import(&join(prefix, "output"), src, report);
        self
    }
}

impl<B: Backend> NamedParams for EncoderBlock<B> {
    fn export(&self, prefix: &str, out: &mut ParamMap) -> Result<(), SpectraError> {
        self.self_attn.export(&join(prefix, "self_attn"), out)?;
        self.ffn_linear1.export(&join(prefix, "ffn_linear1"), out)?;
        self.ffn_linear2.export(&join(prefix, "ffn_linear2"), out)?;
        self.norm1.export(&join(prefix, "norm1"), out)?;
        self.norm2.export(&join(prefix, "norm2"), out)
    }

    fn import(mut self, prefix: &str, src: &ParamMap, report: &mut LoadReport) -> Self {
        self.self_attn   = self.self_attn.import(&join(prefix, "self_attn"), src, report);
        self.ffn_linear1 = self.ffn_linear1.import(&join(prefix, "ffn_linear1"), src, report);
        self.ffn_linear2 = self.ffn_linear2.import(&join(prefix, "ffn_linear2"), src, report);
        self.norm1       = self.norm1.import(&join(prefix, "norm1"), src, report);
        self.norm2       = self.norm2.import(&join(prefix, "norm2"), src, report);
        self
    }
}

impl<B: Backend> NamedParams for SharedEncoder<B> {
    fn export(&self, prefix: &str, out: &mut ParamMap) -> Result<(), SpectraError> {
        for (i, layer) in self.layers.iter().enumerate() {
            layer.export(&join(prefix, &format!("layers.{i}")), out)?;
        }
        Ok(())
    }

    fn import(self, prefix: &str, src: &ParamMap, report: &mut LoadReport) -> Self {
        let layers = self
            .layers
            .into_iter()
            .enumerate()
            .map(|(i, layer)| layer.import(&join(prefix, &format!("layers.{i}")), src, report))
            .collect();
        SharedEncoder { layers }
    }
}

impl<B: Backend> NamedParams for BidirectionalModel<B> {
    fn export(&self, prefix: &str, out: &mut ParamMap) -> Result<(), SpectraError> {
        self.structure_embedding.export(&join(prefix, "structure_embedding"), out)?;
        self.spectrum_head.export(&join(prefix, "spectrum_head"), out)?;
        self.spectrum_embedding.export(&join(prefix, "spectrum_embedding"), out)?;
        self.structure_head.export(&join(prefix, "structure_head"), out)?;
        self.encoder.export(&join(prefix, "encoder"), out)
    }

    fn import(mut self, prefix: &str, src: &ParamMap, report: &mut LoadReport) -> Self {
        self.structure_embedding = self.structure_embedding.import(&join(prefix, "structure_embedding"), src, report);
        self.spectrum_head       = self.spectrum_head.import(&join(prefix, "spectrum_head"), src, report);
        self.spectrum_embedding  = self.spectrum_embedding.import(&join(prefix, "spectrum_embedding"), src, report);
        self.structure_head      = self.structure_head.import(&join(prefix, "structure_head"), src, report);
        self.encoder             = self.encoder.import(&join(prefix, "encoder"), src, report);
        self
    }
}

impl<B: Backend> BidirectionalModel<B> {
    /// Every parameter, keyed by dotted name.
    pub fn to_param_map(&self) -> Result<ParamMap, SpectraError> {
        let mut out = ParamMap::new();
        self.export("", &mut out)?;
        Ok(out)
    }

    /// Restore every parameter whose name and shape match `src`.
    pub fn load_param_map(self, src: &ParamMap) -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        let model = self.import("", src, &mut report);

        let known = |name: &String| {
            report.loaded.contains(name) || report.skipped.contains(name) || report.missing.contains(name)
        };
        let unexpected: Vec<String> = src.keys().filter(|k| !known(k)).cloned().collect();
        report.unexpected = unexpected;

        (model, report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::BidirectionalConfig;
    use burn::backend::NdArray;

    type B = NdArray;

    fn config() -> BidirectionalConfig {
        BidirectionalConfig::new(2, 5)
            .with_d_model(8)
            .with_nhead(2)
            .with_num_layers(2)
            .with_dim_feedforward(16)
            .with_dropout(0.0)
    }

    fn values(t: Tensor<B, 2>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_names_cover_heads_and_encoder_layers() {
        let model: BidirectionalModel<B> = config().init(&Default::default());
        let map = model.to_param_map().unwrap();

        for name in [
            "structure_embedding.weight",
            "structure_embedding.bias",
            "spectrum_head.weight",
            "spectrum_embedding.weight",
            "structure_head.bias",
            "encoder.layers.0.self_attn.query.weight",
            "encoder.layers.1.self_attn.output.bias",
            "encoder.layers.1.ffn_linear2.weight",
            "encoder.layers.0.norm2.gamma",
        ] {
            assert!(map.contains_key(name), "missing {name}");
        }
        assert_eq!(map["spectrum_head.weight"].shape, vec![8, 5]);
    }

    #[test]
    fn test_full_load_reproduces_outputs() {
        let device = Default::default();
        let source: BidirectionalModel<B> = config().init(&device);
        let target: BidirectionalModel<B> = config().init(&device);

        let (target, report) = target.load_param_map(&source.to_param_map().unwrap());
        assert!(report.is_complete());
        assert!(report.mismatch().is_none());

        let x = Tensor::<B, 2>::from_floats([[0.3, 0.6]], &device);
        assert_eq!(values(source.predict_forward(x.clone())), values(target.predict_forward(x)));
    }

    #[test]
    fn test_mismatched_shape_is_skipped_and_reported() {
        let device = Default::default();
        let source: BidirectionalModel<B> = config().init(&device);
        let target: BidirectionalModel<B> = config().init(&device);

        let mut map = source.to_param_map().unwrap();
        map.insert(
            "spectrum_head.weight".to_string(),
            StoredTensor { shape: vec![3, 3], values: vec![0.0; 9] },
        );
        let original_head = values(target.spectrum_head.weight.val());

        let (target, report) = target.load_param_map(&map);

        assert_eq!(report.skipped, vec!["spectrum_head.weight".to_string()]);
        assert!(report.missing.is_empty());
        assert!(report.unexpected.is_empty());
        assert_eq!(report.loaded.len(), map.len() - 1);
        assert!(matches!(report.mismatch(), Some(SpectraError::CheckpointMismatch { .. })));

        // skipped tensor keeps its initialized value, matching ones are restored
        assert_eq!(values(target.spectrum_head.weight.val()), original_head);
        assert_eq!(
            values(target.structure_embedding.weight.val()),
            values(source.structure_embedding.weight.val()),
        );
    }

    #[test]
    fn test_missing_and_unexpected_names_are_reported() {
        let device = Default::default();
        let source: BidirectionalModel<B> = config().init(&device);
        let target: BidirectionalModel<B> = config().init(&device);

        let mut map = source.to_param_map().unwrap();
        map.remove("structure_head.bias");
        map.insert(
            "legacy_head.weight".to_string(),
            StoredTensor { shape: vec![1], values: vec![0.0] },
        );

        let (_, report) = target.load_param_map(&map);
        assert_eq!(report.missing, vec!["structure_head.bias".to_string()]);
        assert_eq!(report.unexpected, vec!["legacy_head.weight".to_string()]);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_exported_values_fill_every_shape() {
        let model: BidirectionalModel<B> = config().init(&Default::default());
        let map = model.to_param_map().unwrap();
        for (name, stored) in &map {
            assert!(!stored.values.is_empty(), "{name} exported no values");
            assert_eq!(stored.values.len(), stored.shape.iter().product::<usize>(), "{name}");
        }
    }
}
