//! Multi-Modal Anomaly Scoring
//!
//! Three modalities are fused into one score:
//!
//!   S = w_W · s_W + w_L · s_L + w_S · s_S
//!
//! - s_W: mean distance to the K most recent baseline diagrams, scaled
//! - s_L: |‖λ₁‖ - μ| / σ, the z-score of the first-layer landscape norm
//! - s_S: a pluggable function of an auxiliary scalar
//!
//! A window is flagged when S exceeds the threshold.

use serde::{Deserialize, Serialize};

use super::signal::{MagnitudeSignal, StatisticalSignal};
use super::BaselineStore;
use crate::config::{ComponentWeights, EngineConfig};
use crate::distance::{DiagramDistance, GreedyWasserstein};
use crate::landscape::first_layer_norm;
use crate::topology::PersistenceDiagram;

/// Per-modality scores before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub wasserstein: f64,
    pub landscape: f64,
    pub statistical: f64,
}

/// Fused detector output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyScore {
    pub total_score: f64,
    pub components: ScoreComponents,
    pub is_anomaly: bool,
    pub confidence: f64,
}

impl AnomalyScore {
    /// Zero score with zero confidence (cold start, empty or failed cycle).
    pub fn quiet() -> Self {
        Self::default()
    }
}

/// Scoring parameters, split out of [`EngineConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorParams {
    pub min_baseline: usize,
    pub recent_k: usize,
    pub wasserstein_scale: f64,
    pub threshold: f64,
    pub weights: ComponentWeights,
    pub norm_resolution: usize,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for DetectorParams {
    fn from(config: &EngineConfig) -> Self {
        Self {
            min_baseline: config.min_baseline,
            recent_k: config.recent_k,
            wasserstein_scale: config.wasserstein_scale,
            threshold: config.anomaly_threshold,
            weights: config.weights,
            norm_resolution: config.norm_resolution,
        }
    }
}

/// Fuses diagram distance, landscape deviation and an auxiliary signal.
pub struct MultiModalDetector {
    params: DetectorParams,
    baseline: BaselineStore,
    distance: Box<dyn DiagramDistance>,
    signal: Box<dyn StatisticalSignal>,
}

impl MultiModalDetector {
    /// Detector with the default greedy 1-Wasserstein distance and
    /// magnitude signal.
    pub fn new(params: DetectorParams, baseline_capacity: usize) -> Self {
        Self {
            baseline: BaselineStore::new(baseline_capacity, params.norm_resolution),
            params,
            distance: Box::new(GreedyWasserstein::default()),
            signal: Box::new(MagnitudeSignal),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(DetectorParams::from(config), config.baseline_capacity)
    }

    pub fn with_distance(mut self, distance: Box<dyn DiagramDistance>) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_signal(mut self, signal: Box<dyn StatisticalSignal>) -> Self {
        self.signal = signal;
        self
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    pub fn baseline(&self) -> &BaselineStore {
        &self.baseline
    }

    /// Admit a diagram to the baseline.
    pub fn add_to_baseline(&mut self, diagram: PersistenceDiagram) {
        self.baseline.add(diagram);
    }

    /// Score a diagram against the baseline.
    ///
    /// Until the baseline holds `min_baseline` entries this returns a
    /// quiet score: zero total and zero confidence.
    pub fn detect(&mut self, diagram: &PersistenceDiagram, aux_signal: f64) -> AnomalyScore {
        let params = self.params;
        if self.baseline.len() < params.min_baseline {
            tracing::debug!(
                baseline = self.baseline.len(),
                required = params.min_baseline,
                "Baseline cold start"
            );
            return AnomalyScore::quiet();
        }

        let recent: Vec<&PersistenceDiagram> = self.baseline.recent(params.recent_k).collect();
        let mean_distance = recent
            .iter()
            .map(|base| self.distance.distance(diagram, base))
            .sum::<f64>()
            / recent.len() as f64;
        let wasserstein = mean_distance * params.wasserstein_scale;

        let norm = first_layer_norm(diagram, params.norm_resolution);
        let (mean, std) = self.baseline.norm_stats();
        let landscape = ((norm - mean) / std).abs();

        let statistical = self.signal.score(aux_signal);

        let w = params.weights;
        let total_score =
            w.wasserstein * wasserstein + w.landscape * landscape + w.statistical * statistical;
        if !total_score.is_finite() {
            tracing::warn!(
                wasserstein,
                landscape,
                statistical,
                "Non-finite anomaly score; reporting quiet"
            );
            return AnomalyScore::quiet();
        }

        let is_anomaly = total_score > params.threshold;
        let confidence = if is_anomaly {
            ((total_score - params.threshold) / 2.0 + 0.5).clamp(0.0, 1.0)
        } else {
            0.0
        };

        AnomalyScore {
            total_score,
            components: ScoreComponents {
                wasserstein,
                landscape,
                statistical,
            },
            is_anomaly,
            confidence,
        }
    }
}

impl std::fmt::Debug for MultiModalDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiModalDetector")
            .field("params", &self.params)
            .field("baseline", &self.baseline.len())
            .field("distance", &self.distance.name())
            .field("signal", &self.signal.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::CusumSignal;
    use crate::distance::GreedyBottleneck;
    use crate::topology::PersistencePoint;

    fn single(death: f64) -> PersistenceDiagram {
        PersistenceDiagram::from_points(vec![PersistencePoint::new(0, 0.0, death, "p")])
    }

    fn seeded_detector() -> MultiModalDetector {
        let mut detector = MultiModalDetector::new(DetectorParams::default(), 10);
        for i in 0..10 {
            detector.add_to_baseline(single(1.0 + 0.01 * i as f64));
        }
        detector
    }

    #[test]
    fn test_cold_start_is_quiet() {
        let mut detector = MultiModalDetector::new(DetectorParams::default(), 50);
        for _ in 0..4 {
            detector.add_to_baseline(single(1.0));
        }
        let score = detector.detect(&single(100.0), 100.0);
        assert_eq!(score, AnomalyScore::quiet());
    }

    #[test]
    fn test_normal_diagram_not_flagged() {
        let mut detector = seeded_detector();
        let score = detector.detect(&single(1.05), 1.0);
        assert!(!score.is_anomaly);
        assert_eq!(score.confidence, 0.0);
        assert!(score.total_score < 3.0);
    }

    #[test]
    fn test_anomalous_diagram_flagged() {
        let mut detector = seeded_detector();
        let normal = detector.detect(&single(1.05), 1.0);
        let score = detector.detect(&single(10.0), 10.0);
        assert!(score.total_score > normal.total_score);
        assert!(score.is_anomaly);
        assert!(score.confidence > 0.5 && score.confidence <= 1.0);
    }

    #[test]
    fn test_fusion_weights() {
        let mut detector = seeded_detector();
        let score = detector.detect(&single(2.0), 4.0);
        let c = score.components;
        let expected = 0.4 * c.wasserstein + 0.4 * c.landscape + 0.2 * c.statistical;
        assert!((score.total_score - expected).abs() < 1e-12);
        assert_eq!(c.statistical, 4.0);
    }

    #[test]
    fn test_confidence_formula() {
        let mut detector = seeded_detector();
        let score = detector.detect(&single(1.0), 16.0);
        // Statistical alone contributes 3.2, just over the threshold.
        assert!(score.is_anomaly);
        let expected = ((score.total_score - 3.0) / 2.0 + 0.5).clamp(0.0, 1.0);
        assert!((score.confidence - expected).abs() < 1e-12);
    }

    #[test]
    fn test_pluggable_parts() {
        let mut detector = seeded_detector()
            .with_distance(Box::new(GreedyBottleneck))
            .with_signal(Box::new(CusumSignal::new(5)));
        let score = detector.detect(&single(1.0), 50.0);
        assert_eq!(score.components.statistical, 0.0, "CUSUM is still calibrating");
        assert!(format!("{detector:?}").contains("bottleneck"));
    }

    #[test]
    fn test_non_finite_aux_is_ignored() {
        let mut detector = seeded_detector();
        let score = detector.detect(&single(1.0), f64::INFINITY);
        assert!(score.total_score.is_finite());
        assert_eq!(score.components.statistical, 0.0);
    }
}
