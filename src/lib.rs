//! # topo-anomaly
//!
//! Streaming Topological Anomaly Detection over Activity Events
//!
//! ## Framework
//!
//! A sliding window of activity events (an actor touching an entity
//! inside a partition) is summarized as a persistence diagram. Each new
//! diagram is compared against a rolling baseline of recent "normal"
//! diagrams, and a weighted multi-modal score flags structural change.
//!
//! ### Pipeline
//!
//! 1. **Feature extraction**: window → persistence diagram (H0 entity
//!    clusters, H1 repeat-actor loops, H2 busy-partition voids) and a
//!    Betti summary
//!
//! 2. **Diagram distances**: greedy Wasserstein-p and bottleneck
//!    matchings with diagonal projection
//!
//! 3. **Persistence landscapes**: layered tent-function envelopes and
//!    their L^p norms
//!
//! 4. **Multi-modal detection**: Wasserstein deviation, landscape-norm
//!    z-score and an auxiliary statistical signal, combined with
//!    configurable weights
//!
//! 5. **Scheduling**: fixed-interval cycles, at most one in flight,
//!    running off the ingestion path
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use topo_anomaly::{DetectionScheduler, Dispatcher, EngineConfig, Event};
//!
//! # async fn demo() -> topo_anomaly::Result<()> {
//! let dispatcher = Arc::new(Dispatcher::initialize(EngineConfig::default())?);
//! let (event_tx, event_rx) = tokio::sync::mpsc::channel(1024);
//! let (report_tx, mut report_rx) = tokio::sync::mpsc::channel(16);
//! let scheduler = DetectionScheduler::new(dispatcher).spawn(event_rx, report_tx);
//!
//! event_tx
//!     .send(Event::new("ev-1", "alice", "page-7", "en", 1_700_000_000_000))
//!     .await
//!     .ok();
//! if let Some(report) = report_rx.recv().await {
//!     println!("score = {:.2}", report.score.total_score);
//! }
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## References
//!
//! - Edelsbrunner & Harer, "Computational Topology" (2010)
//! - Bubenik, "Statistical Topological Data Analysis using Persistence
//!   Landscapes", JMLR 16 (2015)
//! - Cohen-Steiner, Edelsbrunner & Harer, "Stability of Persistence
//!   Diagrams", DCG 37 (2007)

pub mod config;
pub mod detection;
pub mod distance;
pub mod error;
pub mod landscape;
pub mod logging;
pub mod runtime;
pub mod stream;
pub mod topology;

pub use config::{ComponentWeights, EngineConfig, ExtractionConfig};
pub use error::{Result, TopoError};
pub use logging::{init_logging, LogConfig, LogFormat};

// Stream
pub use stream::{Event, RateTracker, StreamBuffer};

// Topology
pub use topology::{
    BettiShift,
    BettiSummary,
    FeatureExtractor,
    PersistenceDiagram,
    PersistencePoint,
    ShiftSeverity,
};

// Distances and landscapes
pub use distance::{bottleneck, wasserstein, DiagramDistance};
pub use landscape::{
    average_landscapes,
    compute_landscapes,
    landscape_norm,
    LandscapeLayer,
};

// Detection
pub use detection::{
    AnomalyScore,
    BaselineStore,
    CusumSignal,
    DetectorParams,
    MultiModalDetector,
    ScoreComponents,
    StatisticalSignal,
};

// Runtime
pub use runtime::{
    DetectionReport,
    DetectionScheduler,
    Dispatcher,
    JobHandle,
    SchedulerHandle,
    SchedulerStats,
    WindowSnapshot,
};
