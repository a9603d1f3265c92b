// ============================================================
// Layer 5 — Loss Functions
// ============================================================
// Weighted MSE in each direction plus the cycle objective:
//
//   total = forward + reverse + 0.5 * (cycle_structure + cycle_spectrum)
//
// forward          weighted_spectrum_mse(predict_forward(s), t)
// reverse          weighted_struct_mse(predict_reverse(t), s)
// cycle_structure  weighted_struct_mse(predict_reverse(predict_forward(s)), s)
// cycle_spectrum   weighted_spectrum_mse(predict_forward(predict_reverse(t)), t)
//
// All inputs are normalized to [0, 1].

use burn::prelude::*;

use crate::ml::model::BidirectionalModel;

pub const CYCLE_WEIGHT: f64 = 0.5;

/// Normalized spectrum values above these thresholds get extra weight.
pub const HIGH_ABSORPTION: f32 = 0.8;
pub const PEAK_ABSORPTION: f32 = 0.9;
pub const HIGH_ABSORPTION_WEIGHT: f32 = 3.0;
pub const PEAK_ABSORPTION_WEIGHT: f32 = 6.0;

/// The last KEY_PARAMS structure columns get KEY_PARAM_WEIGHT.
pub const KEY_PARAMS: usize = 2;
pub const KEY_PARAM_WEIGHT: f32 = 2.0;

/// Per-column weights for a structure vector of width `dim`.
pub fn structure_weights(dim: usize) -> Vec<f32> {
    let first_key = dim.saturating_sub(KEY_PARAMS);
    (0..dim)
        .map(|j| if j >= first_key { KEY_PARAM_WEIGHT } else { 1.0 })
        .collect()
}

/// Mean over all elements of w(target) * (pred - target)^2, where w is
/// 1, HIGH_ABSORPTION_WEIGHT above HIGH_ABSORPTION and
/// PEAK_ABSORPTION_WEIGHT above PEAK_ABSORPTION (strictly greater).
pub fn weighted_spectrum_mse_loss<B: Backend>(
    pred:   Tensor<B, 2>,
    target: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let weights = target
        .ones_like()
        .mask_fill(target.clone().greater_elem(HIGH_ABSORPTION), HIGH_ABSORPTION_WEIGHT)
        .mask_fill(target.clone().greater_elem(PEAK_ABSORPTION), PEAK_ABSORPTION_WEIGHT);
    ((pred - target).powf_scalar(2.0) * weights).mean()
}

/// Mean over all elements of w(column) * (pred - target)^2.
pub fn weighted_struct_mse_loss<B: Backend>(
    pred:   Tensor<B, 2>,
    target: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let [rows, cols] = target.dims();
    let weights = Tensor::<B, 1>::from_floats(structure_weights(cols).as_slice(), &target.device())
        .unsqueeze::<2>()
        .expand([rows, cols]);
    ((pred - target).powf_scalar(2.0) * weights).mean()
}

/// Forward + reverse loss without cycle terms. Used for validation.
pub fn direction_loss<B: Backend>(
    model:     &BidirectionalModel<B>,
    structure: Tensor<B, 2>,
    spectrum:  Tensor<B, 2>,
) -> Tensor<B, 1> {
    let forward = weighted_spectrum_mse_loss(model.predict_forward(structure.clone()), spectrum.clone());
    let reverse = weighted_struct_mse_loss(model.predict_reverse(spectrum), structure);
    forward + reverse
}

/// The four loss terms of one mini-batch and their weighted total.
pub struct CycleLoss<B: Backend> {
    pub forward:         Tensor<B, 1>,
    pub reverse:         Tensor<B, 1>,
    pub cycle_structure: Tensor<B, 1>,
    pub cycle_spectrum:  Tensor<B, 1>,
    pub total:           Tensor<B, 1>,
}

/// Host-side copy of a CycleLoss.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LossScalars {
    pub forward:         f64,
    pub reverse:         f64,
    pub cycle_structure: f64,
    pub cycle_spectrum:  f64,
    pub total:           f64,
}

impl LossScalars {
    pub fn add(&mut self, other: &LossScalars) {
        self.forward         += other.forward;
        self.reverse         += other.reverse;
        self.cycle_structure += other.cycle_structure;
        self.cycle_spectrum  += other.cycle_spectrum;
        self.total           += other.total;
    }

    pub fn scaled(&self, factor: f64) -> LossScalars {
        LossScalars {
            forward:         self.forward * factor,
            reverse:         self.reverse * factor,
            cycle_structure: self.cycle_structure * factor,
            cycle_spectrum:  self.cycle_spectrum * factor,
            total:           self.total * factor,
        }
    }
}

impl<B: Backend> CycleLoss<B> {
    pub fn compute(
        model:     &BidirectionalModel<B>,
        structure: Tensor<B, 2>,
        spectrum:  Tensor<B, 2>,
    ) -> Self {
        let pred_spectrum  = model.predict_forward(structure.clone());
        let pred_structure = model.predict_reverse(spectrum.clone());

        let forward = weighted_spectrum_mse_loss(pred_spectrum.clone(), spectrum.clone());
        let reverse = weighted_struct_mse_loss(pred_structure.clone(), structure.clone());

        let cycle_structure = weighted_struct_mse_loss(model.predict_reverse(pred_spectrum), structure);
        let cycle_spectrum  = weighted_spectrum_mse_loss(model.predict_forward(pred_structure), spectrum);

        let total = forward.clone()
            + reverse.clone()
            + (cycle_structure.clone() + cycle_spectrum.clone()).mul_scalar(CYCLE_WEIGHT);

        Self { forward, reverse, cycle_structure, cycle_spectrum, total }
    }

    pub fn scalars(&self) -> LossScalars {
        LossScalars {
            forward:         scalar(&self.forward),
            reverse:         scalar(&self.reverse),
            cycle_structure: scalar(&self.cycle_structure),
            cycle_spectrum:  scalar(&self.cycle_spectrum),
            total:           scalar(&self.total),
        }
    }
}

pub fn scalar<B: Backend>(t: &Tensor<B, 1>) -> f64 {
    t.clone().into_scalar().elem::<f64>()
}
