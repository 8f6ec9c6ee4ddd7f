//! Betti Summaries: Heuristic Topological Invariants
//!
//! The k-th Betti number βₖ counts k-dimensional "holes":
//!
//! - β₀: Number of connected components
//! - β₁: Number of 1-dimensional loops/cycles
//! - β₂: Number of 2-dimensional voids/cavities
//!
//! For an activity window these are proxies read off event statistics,
//! clipped to fixed caps, rather than ranks of homology groups.

use serde::{Deserialize, Serialize};

/// Betti counts for one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BettiSummary {
    pub h0: usize, // Components
    pub h1: usize, // Loops
    pub h2: usize, // Voids
}

impl BettiSummary {
    pub fn new(h0: usize, h1: usize, h2: usize) -> Self {
        Self { h0, h1, h2 }
    }

    /// Total topological complexity
    pub fn total(&self) -> usize {
        self.h0 + self.h1 + self.h2
    }

    /// Euler characteristic χ = β₀ - β₁ + β₂
    pub fn euler_characteristic(&self) -> i64 {
        self.h0 as i64 - self.h1 as i64 + self.h2 as i64
    }

    /// Significant changes relative to the previous window.
    pub fn shifts_from(&self, previous: &BettiSummary) -> Vec<BettiShift> {
        let mut shifts = Vec::new();

        let d0 = self.h0 as i64 - previous.h0 as i64;
        if d0.abs() > H0_WARNING_DELTA {
            shifts.push(BettiShift {
                dimension: 0,
                delta: d0,
                severity: if d0.abs() > H0_CRITICAL_DELTA {
                    ShiftSeverity::Critical
                } else {
                    ShiftSeverity::Warning
                },
            });
        }

        let d1 = self.h1 as i64 - previous.h1 as i64;
        if d1.abs() > H1_WARNING_DELTA {
            shifts.push(BettiShift {
                dimension: 1,
                delta: d1,
                severity: if d1.abs() > H1_CRITICAL_DELTA {
                    ShiftSeverity::Critical
                } else {
                    ShiftSeverity::Warning
                },
            });
        }

        shifts
    }
}

const H0_WARNING_DELTA: i64 = 10;
const H0_CRITICAL_DELTA: i64 = 20;
const H1_WARNING_DELTA: i64 = 5;
const H1_CRITICAL_DELTA: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftSeverity {
    Warning,
    Critical,
}

/// A jump in one Betti number between consecutive windows.
///
/// Positive h0 deltas read as topic proliferation, negative as
/// consolidation; positive h1 deltas as collaborative loop formation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BettiShift {
    pub dimension: usize,
    pub delta: i64,
    pub severity: ShiftSeverity,
}
