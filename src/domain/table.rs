// ============================================================
// Layer 3 — Table
// ============================================================
// In-memory form of a structure or spectrum data file:
//   header — parameter names, or wavelength labels
//   rows   — one numeric row per sample, all the same width

use serde::{Deserialize, Serialize};

use crate::domain::error::SpectraError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows:   Vec<Vec<f32>>,
}

impl Table {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(header: Vec<String>, rows: Vec<Vec<f32>>) -> Result<Self, SpectraError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != header.len() {
                return Err(SpectraError::shape(format!("row {i}"), header.len(), row.len()));
            }
        }
        Ok(Self { header, rows })
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ragged_rows() {
        let header = vec!["a".to_string(), "b".to_string()];
        let err = Table::new(header, vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, SpectraError::Shape { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_dimensions() {
        let t = Table::new(vec!["x".into()], vec![vec![1.0], vec![2.0]]).unwrap();
        assert_eq!(t.width(), 1);
        assert_eq!(t.len(), 2);
        assert!(!t.is_empty());
    }
}
