// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
//   checkpoint.rs — weights (named parameter map, bincode) plus
//                   metadata and training config (JSON)
//   metrics.rs    — per-epoch training metrics CSV
//   report.rs     — predicted vs. reference spectrum comparison

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Predicted vs. reference spectrum report
pub mod report;
