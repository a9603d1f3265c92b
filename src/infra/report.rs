// ============================================================
// Layer 6 — Comparison Report
// ============================================================
// Sink for predicted vs. reference spectra. Writes a long-format
// CSV that any plotting tool can consume:
//
//   sample,wavelength,predicted,reference,abs_error
//   0,400.0,0.031200,0.030100,0.001100
//
// and returns per-sample error summaries for printing.

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::{error::SpectraError, table::Table};

#[derive(Debug, Clone, PartialEq)]
pub struct SampleComparison {
    pub sample:        usize,
    pub mse:           f32,
    pub max_abs_error: f32,
    /// Wavelength label of the strongest predicted value
    pub predicted_peak: String,
    /// Wavelength label of the strongest reference value
    pub reference_peak: String,
}

/// Compare predicted and reference spectra row by row.
pub fn compare_spectra(predicted: &Table, reference: &Table) -> Result<Vec<SampleComparison>, SpectraError> {
    if predicted.width() != reference.width() {
        return Err(SpectraError::shape("reference spectrum", predicted.width(), reference.width()));
    }
    if predicted.len() != reference.len() {
        return Err(SpectraError::InvalidInput(format!(
            "{} predicted spectra but {} reference spectra",
            predicted.len(),
            reference.len()
        )));
    }

    Ok(predicted
        .rows
        .iter()
        .zip(&reference.rows)
        .enumerate()
        .map(|(sample, (p, r))| {
            let errors: Vec<f32> = p.iter().zip(r).map(|(a, b)| (a - b).abs()).collect();
            let mse = errors.iter().map(|e| e * e).sum::<f32>() / errors.len().max(1) as f32;
            let max_abs_error = errors.iter().cloned().fold(0.0, f32::max);
            SampleComparison {
                sample,
                mse,
                max_abs_error,
                predicted_peak: peak_label(p, &predicted.header),
                reference_peak: peak_label(r, &predicted.header),
            }
        })
        .collect())
}

fn peak_label(row: &[f32], labels: &[String]) -> String {
    row.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((i, v)),
        })
        .and_then(|(i, _)| labels.get(i).cloned())
        .unwrap_or_default()
}

pub fn write_comparison_csv(path: &Path, predicted: &Table, reference: &Table) -> Result<()> {
    // validates shapes before anything is written
    compare_spectra(predicted, reference)?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create report '{}'", path.display()))?;
    writer.write_record(["sample", "wavelength", "predicted", "reference", "abs_error"])?;

    for (sample, (p, r)) in predicted.rows.iter().zip(&reference.rows).enumerate() {
        for ((label, a), b) in predicted.header.iter().zip(p).zip(r) {
            writer.write_record([
                sample.to_string(),
                label.clone(),
                format!("{a:.6}"),
                format!("{b:.6}"),
                format!("{:.6}", (a - b).abs()),
            ])?;
        }
    }
    writer.flush()?;

    tracing::info!("Wrote comparison report to '{}'", path.display());
    Ok(())
}
