// ============================================================
// Layer 4 — Min-Max Normalizer
// ============================================================
// Per-column affine map onto [0, 1]:
//
//   transform(x)         = (x - min) / (max - min)
//   inverse_transform(y) = y * (max - min) + min
//
// Bounds are fit once on the training data and stored in the
// checkpoint; prediction always reuses them. Values outside the
// fitted range are not clamped, they extrapolate past [0, 1].
// A constant column uses a range of 1 so it maps to x - min.

use serde::{Deserialize, Serialize};

use crate::domain::error::SpectraError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxNormalizer {
    min: Vec<f32>,
    max: Vec<f32>,
}

impl MinMaxNormalizer {
    /// Compute per-column bounds over `rows`.
    pub fn fit(rows: &[Vec<f32>]) -> Result<Self, SpectraError> {
        let first = rows.first().ok_or_else(|| {
            SpectraError::InvalidInput("cannot fit a normalizer on zero rows".into())
        })?;
        let width   = first.len();
        let mut min = vec![f32::INFINITY; width];
        let mut max = vec![f32::NEG_INFINITY; width];

        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SpectraError::shape(format!("normalizer fit, row {i}"), width, row.len()));
            }
            for (j, &v) in row.iter().enumerate() {
                min[j] = min[j].min(v);
                max[j] = max[j].max(v);
            }
        }

        Ok(Self { min, max })
    }

    pub fn width(&self) -> usize {
        self.min.len()
    }

    fn range(&self, j: usize) -> f32 {
        let r = self.max[j] - self.min[j];
        if r == 0.0 { 1.0 } else { r }
    }

    pub fn transform(&self, rows: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, SpectraError> {
        self.map_rows(rows, "normalize", |j, v| (v - self.min[j]) / self.range(j))
    }

    pub fn inverse_transform(&self, rows: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, SpectraError> {
        self.map_rows(rows, "denormalize", |j, v| v * self.range(j) + self.min[j])
    }

    fn map_rows(
        &self,
        rows:    &[Vec<f32>],
        context: &str,
        f:       impl Fn(usize, f32) -> f32,
    ) -> Result<Vec<Vec<f32>>, SpectraError> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != self.width() {
                    return Err(SpectraError::shape(
                        format!("{context}, row {i}"),
                        self.width(),
                        row.len(),
                    ));
                }
                Ok(row.iter().enumerate().map(|(j, &v)| f(j, v)).collect())
            })
            .collect()
    }
}
