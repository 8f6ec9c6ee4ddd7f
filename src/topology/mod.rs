//! Topology Module: Persistence Diagrams and Betti Summaries from Activity
//!
//! For a window of events W(t) we build two topological summaries:
//!
//! - A Betti summary (β₀, β₁, β₂) counting components, loops and voids
//!   of the actor/entity/partition activity graph
//! - A persistence diagram D(t) = {(bᵢ, dᵢ, kᵢ)} whose points carry
//!   lifespans on the normalized window time axis [0, 1]
//!
//! ## Heuristic Nature
//!
//! No simplicial complex is built and no boundary matrix is reduced.
//! Both summaries are cheap proxies read directly from event statistics,
//! sized so a detection cycle stays bounded under load.

mod betti;
mod extractor;
mod persistence;

pub use betti::{BettiShift, BettiSummary, ShiftSeverity};
pub use extractor::FeatureExtractor;
pub use persistence::{PersistenceDiagram, PersistencePoint};
