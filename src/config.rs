//! Engine configuration.
//!
//! Numeric knobs only. Hosts build an [`EngineConfig`] however they like
//! (serde, code, environment) and hand it to
//! [`Dispatcher::initialize`](crate::runtime::Dispatcher::initialize).

use serde::{Deserialize, Serialize};

use crate::error::{Result, TopoError};

/// Tolerance when checking that fusion weights sum to one.
const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// Upper bound on landscape resolution; bounds worst-case job latency.
pub const MAX_RESOLUTION: usize = 1000;

/// Fusion weights for the three detector modalities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub wasserstein: f64,
    pub landscape: f64,
    pub statistical: f64,
}

impl ComponentWeights {
    pub fn sum(&self) -> f64 {
        self.wasserstein + self.landscape + self.statistical
    }
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            wasserstein: 0.4,
            landscape: 0.4,
            statistical: 0.2,
        }
    }
}

/// Caps and thresholds for Betti heuristics and diagram synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Cap on h0 (distinct entities)
    pub h0_cap: usize,
    /// An actor counts toward h1 when its activity exceeds this
    pub repeat_threshold: usize,
    /// Cap on h1
    pub h1_cap: usize,
    /// A partition is "active" for h2 when its activity exceeds this
    pub partition_activity_threshold: usize,
    /// Active partitions per h2 void
    pub partitions_per_void: usize,
    /// Cap on h2
    pub h2_cap: usize,
    /// A partition emits an H2 point when its activity exceeds this
    pub h2_point_threshold: usize,
    /// Offset added to an actor's last activity to form its H0 death
    pub death_epsilon: f64,
    /// Maximum diagram cardinality
    pub max_points: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            h0_cap: 50,
            repeat_threshold: 2,
            h1_cap: 30,
            partition_activity_threshold: 5,
            partitions_per_void: 3,
            h2_cap: 10,
            h2_point_threshold: 10,
            death_epsilon: 0.1,
            max_points: 50,
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// StreamBuffer capacity (events)
    pub window_size: usize,
    /// Analysis window length
    pub window_ms: u64,
    /// Span of the rate-estimation ring
    pub rate_window_ms: u64,
    /// Maximum baseline population
    pub baseline_capacity: usize,
    /// Baseline population required before scoring
    pub min_baseline: usize,
    /// Number of most recent baseline diagrams compared by Wasserstein
    pub recent_k: usize,
    /// Landscape layers reported per dimension
    pub landscape_layers: usize,
    /// Landscape grid resolution for reported layers
    pub landscape_resolution: usize,
    /// Grid resolution for the layer-1 norm used in scoring
    pub norm_resolution: usize,
    /// Fixed scheduler cadence
    pub detection_interval_ms: u64,
    /// Minimum window population before a cycle is scheduled
    pub min_window_events: usize,
    /// Score above which a window is flagged
    pub anomaly_threshold: f64,
    /// Empirical scale applied to the mean Wasserstein distance
    pub wasserstein_scale: f64,
    pub weights: ComponentWeights,
    /// Probability that a cycle's diagram is admitted to the baseline
    pub baseline_sample_rate: f64,
    /// Seed for the baseline admission sampler
    pub sampler_seed: u64,
    pub extraction: ExtractionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: 2000,
            window_ms: 30_000,
            rate_window_ms: 5_000,
            baseline_capacity: 50,
            min_baseline: 5,
            recent_k: 5,
            landscape_layers: 5,
            landscape_resolution: 100,
            norm_resolution: 50,
            detection_interval_ms: 2_000,
            min_window_events: 10,
            anomaly_threshold: 3.0,
            wasserstein_scale: 10.0,
            weights: ComponentWeights::default(),
            baseline_sample_rate: 0.1,
            sampler_seed: 0x70_70_5e_ed,
            extraction: ExtractionConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.anomaly_threshold = threshold;
        self
    }

    pub fn with_baseline(mut self, capacity: usize, sample_rate: f64) -> Self {
        self.baseline_capacity = capacity;
        self.baseline_sample_rate = sample_rate;
        self
    }

    pub fn with_interval(mut self, interval_ms: u64, min_window_events: usize) -> Self {
        self.detection_interval_ms = interval_ms;
        self.min_window_events = min_window_events;
        self
    }

    pub fn with_weights(mut self, weights: ComponentWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Check the configuration for values the engine cannot run with.
    ///
    /// A weight sum away from 1.0 is tolerated but logged.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(TopoError::invalid("window_size", "must be positive"));
        }
        if self.window_ms == 0 {
            return Err(TopoError::invalid("window_ms", "must be positive"));
        }
        if self.rate_window_ms == 0 {
            return Err(TopoError::invalid("rate_window_ms", "must be positive"));
        }
        if self.baseline_capacity == 0 {
            return Err(TopoError::invalid("baseline_capacity", "must be positive"));
        }
        if self.min_baseline == 0 || self.min_baseline > self.baseline_capacity {
            return Err(TopoError::invalid(
                "min_baseline",
                format!("must be in 1..={} (got {})", self.baseline_capacity, self.min_baseline),
            ));
        }
        if self.recent_k == 0 {
            return Err(TopoError::invalid("recent_k", "must be positive"));
        }
        if self.landscape_layers == 0 {
            return Err(TopoError::invalid("landscape_layers", "must be positive"));
        }
        for (field, resolution) in [
            ("landscape_resolution", self.landscape_resolution),
            ("norm_resolution", self.norm_resolution),
        ] {
            if resolution == 0 || resolution > MAX_RESOLUTION {
                return Err(TopoError::invalid(
                    field,
                    format!("must be in 1..={MAX_RESOLUTION} (got {resolution})"),
                ));
            }
        }
        if self.detection_interval_ms == 0 {
            return Err(TopoError::invalid("detection_interval_ms", "must be positive"));
        }
        if !self.anomaly_threshold.is_finite() {
            return Err(TopoError::invalid("anomaly_threshold", "must be finite"));
        }
        if !self.wasserstein_scale.is_finite() || self.wasserstein_scale < 0.0 {
            return Err(TopoError::invalid("wasserstein_scale", "must be finite and non-negative"));
        }
        let w = self.weights;
        if [w.wasserstein, w.landscape, w.statistical]
            .iter()
            .any(|x| !x.is_finite() || *x < 0.0)
        {
            return Err(TopoError::invalid("weights", "must be finite and non-negative"));
        }
        if !(0.0..=1.0).contains(&self.baseline_sample_rate) {
            return Err(TopoError::invalid(
                "baseline_sample_rate",
                format!("must be in [0, 1] (got {})", self.baseline_sample_rate),
            ));
        }
        if self.extraction.max_points == 0 {
            return Err(TopoError::invalid("extraction.max_points", "must be positive"));
        }
        if self.extraction.partitions_per_void == 0 {
            return Err(TopoError::invalid("extraction.partitions_per_void", "must be positive"));
        }

        let sum = w.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            tracing::warn!(weight_sum = sum, "Component weights do not sum to 1.0");
        }
        Ok(())
    }
}
