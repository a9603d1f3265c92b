// ============================================================
// Layer 4 — Spectra Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<SpectraSample>
// into two dense tensors:
//
//   structure: [batch_size, struct_dim]
//   spectrum:  [batch_size, spectrum_dim]
//
// Every sample in a dataset has the same widths, so rows are
// flattened and reshaped without padding.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::SpectraSample;
use crate::domain::error::SpectraError;

#[derive(Debug, Clone)]
pub struct SpectraBatch<B: Backend> {
    pub structure: Tensor<B, 2>,
    pub spectrum:  Tensor<B, 2>,
}

/// Holds the target device so tensors are created where the model lives.
#[derive(Clone, Debug)]
pub struct SpectraBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SpectraBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<SpectraSample, SpectraBatch<B>> for SpectraBatcher<B> {
    fn batch(&self, items: Vec<SpectraSample>) -> SpectraBatch<B> {
        let structure = rows_to_tensor(items.iter().map(|s| s.structure.as_slice()), &self.device);
        let spectrum  = rows_to_tensor(items.iter().map(|s| s.spectrum.as_slice()), &self.device);
        SpectraBatch { structure, spectrum }
    }
}

/// Stack equal-width rows into a `[rows, width]` float tensor.
pub fn rows_to_tensor<'a, B: Backend>(
    rows:   impl Iterator<Item = &'a [f32]>,
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut flat  = Vec::new();
    let mut count = 0usize;
    for row in rows {
        flat.extend_from_slice(row);
        count += 1;
    }
    let width = if count == 0 { 0 } else { flat.len() / count };
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([count, width])
}

/// Read a `[rows, width]` tensor back into row vectors.
pub fn tensor_to_rows<B: Backend>(tensor: Tensor<B, 2>) -> Result<Vec<Vec<f32>>, SpectraError> {
    let [rows, width] = tensor.dims();
    let flat = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| SpectraError::InvalidInput(format!("tensor readback failed: {e:?}")))?;
    if flat.len() != rows * width {
        return Err(SpectraError::shape("tensor readback", rows * width, flat.len()));
    }
    if width == 0 {
        return Ok(vec![Vec::new(); rows]);
    }
    Ok(flat.chunks(width).map(<[f32]>::to_vec).collect())
}
