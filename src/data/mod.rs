// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw data files and tensor batches:
//
//   structure.csv + spectrum.csv
//       │
//       ▼
//   CsvTableReader    → header + numeric rows
//       │
//       ▼
//   MinMaxNormalizer  → per-column scaling to [0, 1]
//       │
//       ▼
//   split_train_val   → seeded shuffle into train / validation
//       │
//       ▼
//   SpectraDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   SpectraBatcher    → stacks samples into [batch, dim] tensors

/// Reads and writes delimited numeric tables
pub mod loader;

/// Min-max scaling fit on the training data
pub mod normalizer;

/// Implements Burn's Dataset trait for (structure, spectrum) pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded shuffle and train/validation split
pub mod splitter;

/// Analytic demo dataset
pub mod synthetic;
