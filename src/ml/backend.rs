// Backend selection. ndarray runs everywhere; build with
// `--features wgpu` to train and predict on the GPU instead.

use burn::prelude::*;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

pub fn default_device() -> <InferBackend as Backend>::Device {
    Default::default()
}
