//! Detection Module: Baselines and Multi-Modal Scoring
//!
//! Detection compares the diagram of the current window against a
//! rolling baseline of recent diagrams:
//!
//! - H₀: the window is drawn from the baseline regime
//! - H₁: the structural shape of activity has shifted
//!
//! The baseline needs a minimum population before any score is issued.
//! Below it the detector reports zero with zero confidence; cold start is
//! a defined state, not an error.

mod baseline;
mod multimodal;
mod signal;

pub use baseline::{BaselineEntry, BaselineStore};
pub use multimodal::{AnomalyScore, DetectorParams, MultiModalDetector, ScoreComponents};
pub use signal::{CusumSignal, MagnitudeSignal, StatisticalSignal};
