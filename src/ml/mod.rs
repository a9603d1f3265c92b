// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds, trains or runs the network lives here.
//
//   model.rs          — Bidirectional transformer: two input
//                       embeddings, a shared encoder stack and
//                       two output heads
//   loss.rs           — Weighted MSE losses and the cycle loss
//   early_stopping.rs — Patience / min-delta tracking with an
//                       owned best snapshot
//   params.rs         — Named parameter map for lenient loading
//   trainer.rs        — Mini-batch Adam training loop
//   predictor.rs      — Checkpoint loading and prediction
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Backend aliases (ndarray by default, wgpu behind a feature)
pub mod backend;

/// Bidirectional transformer architecture
pub mod model;

/// Weighted losses and cycle-consistency loss
pub mod loss;

pub mod early_stopping;

/// Parameter export/import by name
pub mod params;

/// Full training loop with validation and early stopping
pub mod trainer;

/// Inference engine — loads checkpoint and predicts either direction
pub mod predictor;
