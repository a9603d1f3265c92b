// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Cycle-consistency training with Burn's DataLoader and Adam.
//
//   - Training runs on an AutodiffBackend for gradients
//   - model.valid() returns the model on the inner backend,
//     dropout disabled, for the validation pass
//   - One optimiser step per mini-batch
//   - After each epoch, EarlyStopping decides whether to keep a
//     snapshot (a clone of the module) and whether to stop
//
// The returned model is the best-validation snapshot, never the
// final epoch's parameters unless the final epoch was the best.

use anyhow::Result;
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{batcher::SpectraBatcher, dataset::SpectraDataset};
use crate::domain::error::SpectraError;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::{
    early_stopping::{EarlyStopping, EpochVerdict},
    loss::{direction_loss, scalar, CycleLoss, LossScalars},
    model::BidirectionalModel,
};

#[derive(Debug, Clone)]
pub struct TrainerOptions {
    pub batch_size:          usize,
    pub max_epochs:          usize,
    pub lr:                  f64,
    pub patience:            usize,
    pub min_delta:           f64,
    pub shuffle_seed:        u64,
    /// Fail with `Diverged` as soon as a batch loss is NaN or infinite.
    pub abort_on_non_finite: bool,
}

pub struct TrainOutcome<B: AutodiffBackend> {
    pub model:         BidirectionalModel<B>,
    pub best_epoch:    Option<usize>,
    pub best_val_loss: Option<f64>,
    pub epochs_run:    usize,
    pub stopped_early: bool,
    pub history:       Vec<EpochMetrics>,
}

pub fn train<B: AutodiffBackend>(
    mut model:     BidirectionalModel<B>,
    train_dataset: SpectraDataset,
    val_dataset:   SpectraDataset,
    opts:          &TrainerOptions,
    device:        &B::Device,
    metrics:       Option<&MetricsLogger>,
) -> Result<TrainOutcome<B>> {
    if train_dataset.len() == 0 {
        return Err(SpectraError::InvalidInput("training split is empty".into()).into());
    }
    let val_dataset = if val_dataset.len() == 0 {
        tracing::warn!("Validation split is empty; validating on the training split");
        SpectraDataset::new(train_dataset.samples().to_vec())
    } else {
        val_dataset
    };

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(SpectraBatcher::<B>::new(device.clone()))
        .batch_size(opts.batch_size)
        .shuffle(opts.shuffle_seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_loader = DataLoaderBuilder::new(SpectraBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(opts.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut stopper: EarlyStopping<BidirectionalModel<B>> =
        EarlyStopping::new(opts.patience, opts.min_delta);
    let mut history       = Vec::new();
    let mut stopped_early = false;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=opts.max_epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut sums    = LossScalars::default();
        let mut batches = 0usize;

        for batch in train_loader.iter() {
            let loss  = CycleLoss::compute(&model, batch.structure, batch.spectrum);
            let parts = loss.scalars();

            if opts.abort_on_non_finite && !parts.total.is_finite() {
                tracing::error!("Non-finite loss at epoch {epoch}: {parts:?}");
                return Err(SpectraError::Diverged { epoch }.into());
            }
            sums.add(&parts);
            batches += 1;

            let grads = loss.total.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(opts.lr, model, grads);
        }
        let train_means = sums.scaled(1.0 / batches.max(1) as f64);

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        for batch in val_loader.iter() {
            val_loss_sum += scalar(&direction_loss(&model_valid, batch.structure, batch.spectrum));
            val_batches  += 1;
        }
        let val_loss = if val_batches > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };

        // ── Early stopping bookkeeping ────────────────────────────────────────
        let verdict  = stopper.observe(epoch, val_loss, || model.clone());
        let improved = verdict == EpochVerdict::Improved;

        println!(
            "Epoch {:>4}/{} | train={:.5} (fwd {:.5}, rev {:.5}, cyc {:.5}/{:.5}) | val={:.5}{}",
            epoch, opts.max_epochs, train_means.total,
            train_means.forward, train_means.reverse,
            train_means.cycle_structure, train_means.cycle_spectrum,
            val_loss, if improved { " *" } else { "" },
        );

        let row = EpochMetrics::new(epoch, train_means, val_loss, improved);
        if let Some(logger) = metrics {
            logger.log(&row)?;
        }
        history.push(row);

        if verdict == EpochVerdict::Stop {
            tracing::info!(
                "Early stopping at epoch {}: no improvement > {} for {} epochs (best epoch {:?}, val_loss={:.6})",
                epoch, opts.min_delta, opts.patience, stopper.best_epoch(), stopper.best_loss(),
            );
            stopped_early = true;
            break;
        }
    }

    let epochs_run = history.len();
    let outcome = match stopper.into_best() {
        Some(best) => {
            tracing::info!("Restoring best model from epoch {} (val_loss={:.6})", best.epoch, best.loss);
            TrainOutcome {
                model:         best.snapshot,
                best_epoch:    Some(best.epoch),
                best_val_loss: Some(best.loss),
                epochs_run,
                stopped_early,
                history,
            }
        }
        None => {
            tracing::warn!("Validation loss never improved; keeping the final parameters");
            TrainOutcome {
                model,
                best_epoch:    None,
                best_val_loss: None,
                epochs_run,
                stopped_early,
                history,
            }
        }
    };

    tracing::info!("Training complete after {} epochs", epochs_run);
    Ok(outcome)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        batcher::{rows_to_tensor, tensor_to_rows},
        dataset::{pair_rows, SpectraSample},
        normalizer::MinMaxNormalizer,
        synthetic,
    };
    use crate::ml::model::BidirectionalConfig;
    use approx::assert_relative_eq;
    use burn::backend::{Autodiff, NdArray};
    use rand::{rngs::StdRng, SeedableRng};

    type B = Autodiff<NdArray>;

    fn small_model(struct_dim: usize, spectrum_dim: usize) -> BidirectionalModel<B> {
        BidirectionalConfig::new(struct_dim, spectrum_dim)
            .with_d_model(32)
            .with_nhead(4)
            .with_num_layers(1)
            .with_dim_feedforward(64)
            .with_dropout(0.0)
            .init(&Default::default())
    }

    fn options(max_epochs: usize) -> TrainerOptions {
        TrainerOptions {
            batch_size:          16,
            max_epochs,
            lr:                  3e-3,
            patience:            max_epochs,
            min_delta:           0.0,
            shuffle_seed:        7,
            abort_on_non_finite: true,
        }
    }

    fn synthetic_samples(count: usize) -> Vec<SpectraSample> {
        let (structures, spectra) = synthetic::generate(count, 16, &mut StdRng::seed_from_u64(11));
        let s = MinMaxNormalizer::fit(&structures.rows).unwrap().transform(&structures.rows).unwrap();
        let t = MinMaxNormalizer::fit(&spectra.rows).unwrap().transform(&spectra.rows).unwrap();
        pair_rows(s, t).unwrap()
    }

    /// Mean squared error of structure → spectrum → structure.
    fn round_trip_error(model: &BidirectionalModel<NdArray>, samples: &[SpectraSample]) -> f32 {
        let device    = Default::default();
        let structure = rows_to_tensor::<NdArray>(samples.iter().map(|s| s.structure.as_slice()), &device);
        let recovered = model.predict_reverse(model.predict_forward(structure.clone()));
        let diff      = tensor_to_rows(recovered - structure).unwrap();
        let n         = diff.iter().map(Vec::len).sum::<usize>() as f32;
        diff.iter().flatten().map(|d| d * d).sum::<f32>() / n
    }

    #[test]
    fn test_training_improves_cycle_consistency() {
        B::seed(3);
        let samples = synthetic_samples(64);
        let model   = small_model(3, 16);
        let before  = round_trip_error(&model.valid(), &samples);

        let outcome = train(
            model,
            SpectraDataset::new(samples.clone()),
            SpectraDataset::new(samples.clone()),
            &options(60),
            &Default::default(),
            None,
        ).unwrap();

        let after = round_trip_error(&outcome.model.valid(), &samples);
        assert!(after < before, "round trip error {after} not below untrained {before}");
        assert!(outcome.best_epoch.is_some());
    }

    #[test]
    fn test_early_stop_restores_best_epoch_parameters() {
        B::seed(5);
        let samples = synthetic_samples(24);
        let (train_set, val_set) = samples.split_at(16);

        // Only the first epoch can beat the previous best by this much.
        let opts = TrainerOptions { patience: 2, min_delta: 1e9, ..options(50) };
        let outcome = train(
            small_model(3, 16),
            SpectraDataset::new(train_set.to_vec()),
            SpectraDataset::new(val_set.to_vec()),
            &opts,
            &Default::default(),
            None,
        ).unwrap();

        assert!(outcome.stopped_early);
        assert_eq!(outcome.epochs_run, 3);
        assert_eq!(outcome.best_epoch, Some(1));
        assert!(outcome.history[0].improved);
        assert!(!outcome.history[2].improved);

        // The returned parameters reproduce epoch 1's validation loss,
        // not epoch 3's.
        let device = Default::default();
        let valid  = outcome.model.valid();
        let s = rows_to_tensor::<NdArray>(val_set.iter().map(|x| x.structure.as_slice()), &device);
        let t = rows_to_tensor::<NdArray>(val_set.iter().map(|x| x.spectrum.as_slice()), &device);
        let restored_loss = scalar(&direction_loss(&valid, s, t));
        assert_relative_eq!(restored_loss, outcome.history[0].val_loss, max_relative = 1e-4);
        assert_relative_eq!(restored_loss, outcome.best_val_loss.unwrap(), max_relative = 1e-4);
    }

    #[test]
    fn test_empty_validation_falls_back_to_training_split() {
        let samples = synthetic_samples(4);
        let outcome = train(
            small_model(3, 16),
            SpectraDataset::new(samples),
            SpectraDataset::new(Vec::new()),
            &options(2),
            &Default::default(),
            None,
        ).unwrap();
        assert_eq!(outcome.epochs_run, 2);
        assert!(outcome.history.iter().all(|m| m.val_loss.is_finite()));
    }

    #[test]
    fn test_empty_training_split_is_rejected() {
        let result = train(
            small_model(3, 16),
            SpectraDataset::new(Vec::new()),
            SpectraDataset::new(Vec::new()),
            &options(1),
            &Default::default(),
            None,
        );
        let err = result.err().unwrap();
        assert!(matches!(err.downcast_ref::<SpectraError>(), Some(SpectraError::InvalidInput(_))));
    }

    #[test]
    fn test_non_finite_loss_aborts_with_diverged() {
        let mut samples = synthetic_samples(4);
        samples[0].spectrum[0] = f32::NAN;
        let result = train(
            small_model(3, 16),
            SpectraDataset::new(samples.clone()),
            SpectraDataset::new(samples),
            &options(3),
            &Default::default(),
            None,
        );
        let err = result.err().unwrap();
        assert!(matches!(err.downcast_ref::<SpectraError>(), Some(SpectraError::Diverged { epoch: 1 })));
    }

    #[test]
    fn test_metrics_are_logged_per_epoch() {
        let dir     = tempfile::tempdir().unwrap();
        let logger  = MetricsLogger::new(dir.path()).unwrap();
        let samples = synthetic_samples(8);
        train(
            small_model(3, 16),
            SpectraDataset::new(samples.clone()),
            SpectraDataset::new(samples),
            &options(3),
            &Default::default(),
            Some(&logger),
        ).unwrap();

        let text = std::fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 1 + 3);
    }
}
