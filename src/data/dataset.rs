use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::error::SpectraError;

/// One normalized (structure, spectrum) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectraSample {
    pub structure: Vec<f32>,
    pub spectrum:  Vec<f32>,
}

/// Pair row i of `structures` with row i of `spectra`.
pub fn pair_rows(
    structures: Vec<Vec<f32>>,
    spectra:    Vec<Vec<f32>>,
) -> Result<Vec<SpectraSample>, SpectraError> {
    if structures.len() != spectra.len() {
        return Err(SpectraError::InvalidInput(format!(
            "structure file has {} rows but spectrum file has {}",
            structures.len(),
            spectra.len()
        )));
    }
    Ok(structures
        .into_iter()
        .zip(spectra)
        .map(|(structure, spectrum)| SpectraSample { structure, spectrum })
        .collect())
}

pub struct SpectraDataset {
    samples: Vec<SpectraSample>,
}

impl SpectraDataset {
    pub fn new(samples: Vec<SpectraSample>) -> Self { Self { samples } }

    pub fn samples(&self) -> &[SpectraSample] { &self.samples }
}

impl Dataset<SpectraSample> for SpectraDataset {
    fn get(&self, index: usize) -> Option<SpectraSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_rows_in_order() {
        let samples = pair_rows(
            vec![vec![1.0], vec![2.0]],
            vec![vec![0.1, 0.2], vec![0.3, 0.4]],
        ).unwrap();
        assert_eq!(samples[1].structure, vec![2.0]);
        assert_eq!(samples[1].spectrum, vec![0.3, 0.4]);

        let ds = SpectraDataset::new(samples);
        assert_eq!(ds.len(), 2);
        assert!(ds.get(2).is_none());
    }

    #[test]
    fn test_row_count_mismatch_is_rejected() {
        assert!(pair_rows(vec![vec![1.0]], vec![]).is_err());
    }
}
