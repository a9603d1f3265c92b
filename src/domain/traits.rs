// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer reads tables through TableSource so a
// different file format only needs a new implementation.

use std::path::Path;

use crate::domain::{error::SpectraError, table::Table};

// ─── TableSource ──────────────────────────────────────────────────────────────
/// Anything that can turn a path into a numeric table.
///
/// Implementations:
///   - CsvTableReader → delimited text files with a header row
pub trait TableSource {
    /// Read the file at `path`. Malformed or missing files are
    /// reported as `SpectraError::DataLoad`.
    fn read(&self, path: &Path) -> Result<Table, SpectraError>;
}
