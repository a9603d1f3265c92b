// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Four commands are supported:
//   1. `train`             — fits the model on a CSV pair
//   2. `predict-spectrum`  — structure → spectrum
//   3. `predict-structure` — spectrum → structure
//   4. `synthesize`        — writes a demo dataset
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use burn::prelude::Backend;
use clap::Parser;
use std::path::Path;

use crate::application::predict_use_case::PredictUseCase;
use commands::{Commands, PredictSpectrumArgs, PredictStructureArgs, SynthesizeArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "cycle-spectra",
    version = "0.1.0",
    about = "Learn structure <-> spectrum mappings with a cycle-consistent transformer."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)            => run_train(args),
            Commands::PredictSpectrum(args)  => run_predict_spectrum(args),
            Commands::PredictStructure(args) => run_predict_structure(args),
            Commands::Synthesize(args)       => run_synthesize(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training on '{}' / '{}'", args.structure, args.spectrum);
    let summary = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete: {} epochs ({} train / {} validation samples){}",
        summary.epochs_run,
        summary.train_samples,
        summary.val_samples,
        if summary.stopped_early { ", stopped early" } else { "" },
    );
    match (summary.best_epoch, summary.best_val_loss) {
        (Some(epoch), Some(loss)) => println!("Best validation loss {loss:.6} at epoch {epoch}"),
        _                         => println!("Validation loss never improved"),
    }
    println!("Checkpoint saved to '{}'", summary.checkpoint_dir.display());
    Ok(())
}

/// Checkpoint labels and best epoch, plus any partial-load notice.
fn describe_checkpoint<B: Backend>(use_case: &PredictUseCase<B>) {
    let predictor   = use_case.predictor();
    let wavelengths = predictor.wavelengths();
    println!(
        "Checkpoint: {} structure parameters ({}), {} wavelengths ({} .. {})",
        predictor.struct_names().len(),
        predictor.struct_names().join(", "),
        wavelengths.len(),
        wavelengths.first().map(String::as_str).unwrap_or("-"),
        wavelengths.last().map(String::as_str).unwrap_or("-"),
    );
    if let (Some(epoch), Some(loss)) = (predictor.metadata().best_epoch, predictor.metadata().best_val_loss) {
        println!("Trained to best validation loss {loss:.6} at epoch {epoch}");
    }
    if let Some(mismatch) = use_case.load_report().mismatch() {
        println!("Warning: {mismatch}");
    }
}

fn run_predict_spectrum(args: PredictSpectrumArgs) -> Result<()> {
    let use_case = PredictUseCase::new(&args.checkpoint_dir)?;
    describe_checkpoint(&use_case);
    let outcome  = use_case.predict_spectrum(
        Path::new(&args.structure),
        Path::new(&args.output),
        args.reference.as_deref().map(Path::new),
        args.report.as_deref().map(Path::new),
    )?;

    println!("Predicted {} spectra → {}", outcome.predicted.len(), args.output);
    if !outcome.comparisons.is_empty() {
        println!("\n{:>6}  {:>10}  {:>10}  {:>10}  {:>10}", "sample", "mse", "max_err", "pred_peak", "ref_peak");
        for c in &outcome.comparisons {
            println!(
                "{:>6}  {:>10.6}  {:>10.6}  {:>10}  {:>10}",
                c.sample, c.mse, c.max_abs_error, c.predicted_peak, c.reference_peak,
            );
        }
        let mean_mse = outcome.comparisons.iter().map(|c| c.mse as f64).sum::<f64>()
            / outcome.comparisons.len() as f64;
        println!("\nMean MSE: {mean_mse:.6}");
    }
    Ok(())
}

fn run_predict_structure(args: PredictStructureArgs) -> Result<()> {
    let use_case = PredictUseCase::new(&args.checkpoint_dir)?;
    describe_checkpoint(&use_case);
    let outcome  = use_case.predict_structure(Path::new(&args.spectrum), Path::new(&args.output))?;

    println!(
        "Predicted {} structures ({}) → {}",
        outcome.predicted.len(),
        outcome.predicted.header.join(", "),
        args.output,
    );
    Ok(())
}

fn run_synthesize(args: SynthesizeArgs) -> Result<()> {
    use crate::application::synthesize_use_case::SynthesizeUseCase;

    let (structure, spectrum) = SynthesizeUseCase::new(args.into()).execute()?;
    println!("Wrote {} and {}", structure.display(), spectrum.display());
    Ok(())
}
