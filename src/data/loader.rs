// ============================================================
// Layer 4 — Tabular Loader
// ============================================================
// Reads and writes the delimited text tables the system works
// with, using the `csv` crate.
//
// File layout expected on disk:
//
//   structure file              spectrum file
//   ───────────────             ─────────────────────────
//   period,thickness,radius     400.0,402.0,404.0,...
//   412.0,80.5,95.0             0.031,0.034,0.040,...
//   ...                         ...
//
// The header row carries the parameter names (structure) or the
// wavelength labels (spectrum). Every following row is one sample
// and must be fully numeric; row i of the structure file pairs
// with row i of the spectrum file.

use std::{fs, path::Path};

use anyhow::{Context, Result};

use crate::domain::{error::SpectraError, table::Table, traits::TableSource};

/// Reads numeric tables with a header row from delimited text files.
#[derive(Debug, Clone)]
pub struct CsvTableReader {
    delimiter: u8,
}

impl CsvTableReader {
    /// Comma-delimited reader
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Default for CsvTableReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSource for CsvTableReader {
    fn read(&self, path: &Path) -> Result<Table, SpectraError> {
        if !path.is_file() {
            return Err(SpectraError::data_load(path, "file does not exist"));
        }

        // flexible(true) so ragged rows reach our own check with a line number
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| SpectraError::data_load(path, e.to_string()))?;

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| SpectraError::data_load(path, e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        if header.is_empty() || header.iter().all(|h| h.is_empty()) {
            return Err(SpectraError::data_load(path, "missing header row"));
        }

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            // +2: one for the header, one for 1-based line numbers
            let line = i + 2;
            let record = record
                .map_err(|e| SpectraError::data_load(path, format!("line {line}: {e}")))?;

            if record.len() != header.len() {
                return Err(SpectraError::data_load(
                    path,
                    format!(
                        "line {line}: expected {} columns, found {}",
                        header.len(),
                        record.len()
                    ),
                ));
            }

            let row = record
                .iter()
                .enumerate()
                .map(|(col, cell)| parse_cell(cell).ok_or_else(|| {
                    SpectraError::data_load(
                        path,
                        format!("line {line}, column '{}': '{cell}' is not a finite number", header[col]),
                    )
                }))
                .collect::<Result<Vec<f32>, _>>()?;
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(SpectraError::data_load(path, "no data rows after the header"));
        }

        tracing::debug!(
            "Read '{}': {} rows x {} columns",
            path.display(),
            rows.len(),
            header.len()
        );
        Table::new(header, rows)
    }
}

fn parse_cell(cell: &str) -> Option<f32> {
    cell.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Write a table as comma-separated text, creating parent directories.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Cannot write '{}'", path.display()))?;

    tracing::debug!("Wrote {} rows to '{}'", table.len(), path.display());
    Ok(())
}
