// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::{
    synthesize_use_case::SynthesizeConfig,
    train_use_case::TrainConfig,
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the bidirectional model on a structure/spectrum CSV pair
    Train(TrainArgs),

    /// Predict spectra from structural parameters
    PredictSpectrum(PredictSpectrumArgs),

    /// Predict structural parameters from spectra
    PredictStructure(PredictStructureArgs),

    /// Write a synthetic demo dataset
    Synthesize(SynthesizeArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV of structural parameters, one sample per row
    #[arg(long)]
    pub structure: String,

    /// CSV of spectra, row-aligned with --structure
    #[arg(long)]
    pub spectrum: String,

    /// Directory to write weights, metadata and metrics into
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Upper bound on epochs; early stopping usually ends sooner
    #[arg(long, default_value_t = 200)]
    pub max_epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Width of the shared latent space; must be divisible by --nhead
    #[arg(long, default_value_t = 128)]
    pub d_model: usize,

    #[arg(long, default_value_t = 8)]
    pub nhead: usize,

    /// Number of stacked encoder layers
    #[arg(long, default_value_t = 3)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 512)]
    pub dim_feedforward: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Epochs without improvement before stopping
    #[arg(long, default_value_t = 20)]
    pub patience: usize,

    /// Minimum drop in validation loss that counts as improvement
    #[arg(long, default_value_t = 1e-5)]
    pub min_delta: f64,

    /// Share of samples used for training; the rest validate
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    /// Seed for the split, the shuffle order and weight initialisation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            structure_path:  a.structure,
            spectrum_path:   a.spectrum,
            checkpoint_dir:  a.checkpoint_dir,
            batch_size:      a.batch_size,
            max_epochs:      a.max_epochs,
            lr:              a.lr,
            d_model:         a.d_model,
            nhead:           a.nhead,
            num_layers:      a.num_layers,
            dim_feedforward: a.dim_feedforward,
            dropout:         a.dropout,
            patience:        a.patience,
            min_delta:       a.min_delta,
            train_fraction:  a.train_fraction,
            seed:            a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictSpectrumArgs {
    /// CSV of structural parameters to predict from
    #[arg(long)]
    pub structure: String,

    /// Where to write the predicted spectra
    #[arg(long)]
    pub output: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Measured spectra to compare the predictions against
    #[arg(long)]
    pub reference: Option<String>,

    /// Where to write the long-format comparison (needs --reference)
    #[arg(long)]
    pub report: Option<String>,
}

#[derive(Args, Debug)]
pub struct PredictStructureArgs {
    /// CSV of spectra to predict from
    #[arg(long)]
    pub spectrum: String,

    /// Where to write the predicted structural parameters
    #[arg(long)]
    pub output: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

#[derive(Args, Debug)]
pub struct SynthesizeArgs {
    /// Directory to write structure.csv and spectrum.csv into
    #[arg(long)]
    pub out_dir: String,

    #[arg(long, default_value_t = 500)]
    pub samples: usize,

    /// Number of points on the 400–800 nm grid
    #[arg(long, default_value_t = 64)]
    pub wavelengths: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<SynthesizeArgs> for SynthesizeConfig {
    fn from(a: SynthesizeArgs) -> Self {
        SynthesizeConfig {
            out_dir:     a.out_dir,
            samples:     a.samples,
            wavelengths: a.wavelengths,
            seed:        a.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "cycle-spectra", "train",
            "--structure", "s.csv", "--spectrum", "t.csv",
            "--nhead", "4", "--patience", "3", "--seed", "7",
        ]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.structure_path, "s.csv");
        assert_eq!(cfg.nhead, 4);
        assert_eq!(cfg.patience, 3);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.max_epochs, 200);
    }

    #[test]
    fn test_predict_spectrum_optional_reference() {
        let cli = Cli::try_parse_from([
            "cycle-spectra", "predict-spectrum",
            "--structure", "s.csv", "--output", "out.csv",
        ]).unwrap();
        let Commands::PredictSpectrum(args) = cli.command else { panic!("expected predict-spectrum") };
        assert!(args.reference.is_none());
        assert_eq!(args.checkpoint_dir, "checkpoints");
    }

    #[test]
    fn test_train_requires_both_files() {
        assert!(Cli::try_parse_from(["cycle-spectra", "train", "--structure", "s.csv"]).is_err());
    }
}
