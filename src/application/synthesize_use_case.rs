// ============================================================
// Layer 2 — Synthesize Use Case
// ============================================================
// Writes a demo dataset (structure.csv + spectrum.csv) drawn
// from the analytic generator, ready to feed into `train`.

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use std::path::{Path, PathBuf};

use crate::data::{loader::write_table, synthetic};
use crate::domain::error::SpectraError;

pub const STRUCTURE_FILE: &str = "structure.csv";
pub const SPECTRUM_FILE:  &str = "spectrum.csv";

#[derive(Debug, Clone)]
pub struct SynthesizeConfig {
    pub out_dir:     String,
    pub samples:     usize,
    pub wavelengths: usize,
    pub seed:        u64,
}

pub struct SynthesizeUseCase {
    config: SynthesizeConfig,
}

impl SynthesizeUseCase {
    pub fn new(config: SynthesizeConfig) -> Self {
        Self { config }
    }

    /// Returns the (structure, spectrum) paths written.
    pub fn execute(&self) -> Result<(PathBuf, PathBuf)> {
        let cfg = &self.config;
        if cfg.samples == 0 || cfg.wavelengths == 0 {
            return Err(SpectraError::InvalidInput(
                "samples and wavelengths must both be greater than zero".into(),
            ).into());
        }

        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let (structures, spectra) = synthetic::generate(cfg.samples, cfg.wavelengths, &mut rng);

        let dir = Path::new(&cfg.out_dir);
        let structure_path = dir.join(STRUCTURE_FILE);
        let spectrum_path  = dir.join(SPECTRUM_FILE);
        write_table(&structure_path, &structures)?;
        write_table(&spectrum_path, &spectra)?;

        tracing::info!(
            "Synthesized {} samples x {} wavelengths into '{}'",
            cfg.samples, cfg.wavelengths, dir.display(),
        );
        Ok((structure_path, spectrum_path))
    }
}
