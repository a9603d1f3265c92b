// ============================================================
// Layer 3 — Error Kinds
// ============================================================
// The application layer wraps these in anyhow with extra
// context; lower layers return them directly so callers and
// tests can match on the kind.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpectraError {
    /// A data file is missing, unreadable, or not a numeric table.
    #[error("cannot load '{}': {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    /// Checkpoint parameter names or shapes did not fully match the model.
    /// Reported after a partial load; never returned as a failure.
    #[error(
        "checkpoint only partially matches the model: skipped {skipped:?}, \
         missing {missing:?}, unexpected {unexpected:?}"
    )]
    CheckpointMismatch {
        skipped:    Vec<String>,
        missing:    Vec<String>,
        unexpected: Vec<String>,
    },

    /// A request the model cannot serve (empty input, bad configuration).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A vector width disagrees with the configured dimension.
    #[error("shape mismatch in {context}: expected width {expected}, got {actual}")]
    Shape {
        context:  String,
        expected: usize,
        actual:   usize,
    },

    /// Training loss became NaN or infinite.
    #[error("training diverged at epoch {epoch}: loss is not finite")]
    Diverged { epoch: usize },
}

impl SpectraError {
    pub fn data_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SpectraError::DataLoad { path: path.into(), reason: reason.into() }
    }

    pub fn shape(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        SpectraError::Shape { context: context.into(), expected, actual }
    }
}
