// ============================================================
// Layer 3 — Direction
// ============================================================
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which way the bidirectional model is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Structural parameters → spectrum
    Forward,
    /// Spectrum → structural parameters
    Reverse,
}

impl Direction {
    /// Name of the space the model consumes in this direction.
    pub fn input_space(self) -> &'static str {
        match self {
            Direction::Forward => "structure",
            Direction::Reverse => "spectrum",
        }
    }

    /// Name of the space the model produces in this direction.
    pub fn output_space(self) -> &'static str {
        match self {
            Direction::Forward => "spectrum",
            Direction::Reverse => "structure",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.input_space(), self.output_space())
    }
}
