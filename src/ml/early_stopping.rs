// ============================================================
// Layer 5 — Early Stopping
// ============================================================
// Tracks the best validation loss and an owned snapshot of
// whatever produced it. An epoch counts as an improvement only
// when its loss beats the best by more than `min_delta`; after
// `patience` consecutive epochs without one, training stops.
//
// The snapshot is taken by the caller's closure at the moment
// of improvement, so it is never the live training state.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochVerdict {
    /// New best; a snapshot was taken.
    Improved,
    /// No improvement; `stale_epochs` in a row so far.
    Stale { stale_epochs: usize },
    /// Patience exhausted.
    Stop,
}

/// Best snapshot seen during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct BestSnapshot<S> {
    pub epoch:    usize,
    pub loss:     f64,
    pub snapshot: S,
}

#[derive(Debug)]
pub struct EarlyStopping<S> {
    patience:     usize,
    min_delta:    f64,
    best:         Option<BestSnapshot<S>>,
    stale_epochs: usize,
}

impl<S> EarlyStopping<S> {
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self { patience, min_delta, best: None, stale_epochs: 0 }
    }

    pub fn best_loss(&self) -> f64 {
        self.best.as_ref().map_or(f64::INFINITY, |b| b.loss)
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best.as_ref().map(|b| b.epoch)
    }

    /// Whether `loss` would count as an improvement right now.
    pub fn improves(&self, loss: f64) -> bool {
        // NaN compares false and never improves
        loss < self.best_loss() - self.min_delta
    }

    /// Record one epoch. `snapshot` is only called on improvement.
    pub fn observe(&mut self, epoch: usize, loss: f64, snapshot: impl FnOnce() -> S) -> EpochVerdict {
        if self.improves(loss) {
            self.best = Some(BestSnapshot { epoch, loss, snapshot: snapshot() });
            self.stale_epochs = 0;
            return EpochVerdict::Improved;
        }

        self.stale_epochs += 1;
        if self.stale_epochs >= self.patience {
            EpochVerdict::Stop
        } else {
            EpochVerdict::Stale { stale_epochs: self.stale_epochs }
        }
    }

    pub fn into_best(self) -> Option<BestSnapshot<S>> {
        self.best
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn run(losses: &[f64], patience: usize, min_delta: f64) -> (Vec<EpochVerdict>, Option<BestSnapshot<String>>) {
        let mut stopper = EarlyStopping::new(patience, min_delta);
        let mut verdicts = Vec::new();
        for (i, &loss) in losses.iter().enumerate() {
            let epoch   = i + 1;
            let verdict = stopper.observe(epoch, loss, || format!("params@{epoch}"));
            verdicts.push(verdict);
            if verdict == EpochVerdict::Stop {
                break;
            }
        }
        (verdicts, stopper.into_best())
    }

    #[test]
    fn test_plateau_stops_after_patience_and_keeps_best_snapshot() {
        let (verdicts, best) = run(&[1.0, 0.5, 0.5, 0.5, 0.5, 0.1], 3, 0.0);

        assert_eq!(verdicts, vec![
            EpochVerdict::Improved,
            EpochVerdict::Improved,
            EpochVerdict::Stale { stale_epochs: 1 },
            EpochVerdict::Stale { stale_epochs: 2 },
            EpochVerdict::Stop,
        ]);
        let best = best.unwrap();
        assert_eq!(best.epoch, 2);
        assert_eq!(best.loss, 0.5);
        assert_eq!(best.snapshot, "params@2");
    }

    #[test]
    fn test_improvements_smaller_than_min_delta_do_not_count() {
        let (verdicts, best) = run(&[1.0, 0.999, 0.998, 0.997], 3, 0.01);
        assert_eq!(verdicts.last(), Some(&EpochVerdict::Stop));
        assert_eq!(best.unwrap().snapshot, "params@1");
    }

    #[test]
    fn test_late_improvement_resets_patience() {
        let (verdicts, best) = run(&[1.0, 1.0, 0.5, 0.6, 0.7], 2, 0.0);
        assert_eq!(verdicts[2], EpochVerdict::Improved);
        assert_eq!(verdicts[4], EpochVerdict::Stop);
        assert_eq!(best.unwrap().epoch, 3);
    }

    #[test]
    fn test_snapshot_closure_only_runs_on_improvement() {
        let mut stopper = EarlyStopping::new(5, 0.0);
        let mut calls   = 0;
        for loss in [3.0, 4.0, 2.0, 2.5] {
            stopper.observe(0, loss, || { calls += 1; });
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_nan_never_improves() {
        let (verdicts, best) = run(&[f64::NAN, f64::NAN], 2, 0.0);
        assert_eq!(verdicts, vec![EpochVerdict::Stale { stale_epochs: 1 }, EpochVerdict::Stop]);
        assert!(best.is_none());
    }
}
