//! Detection pipeline context and per-cycle job.

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::detection::{AnomalyScore, MultiModalDetector};
use crate::landscape::{compute_landscapes, LandscapeLayer};
use crate::stream::Event;
use crate::topology::{BettiShift, BettiSummary, FeatureExtractor, PersistenceDiagram};

/// Immutable window handed from ingestion to a detection job.
#[derive(Debug, Clone)]
pub struct WindowSnapshot {
    pub events: Arc<[Event]>,
    /// End of the window
    pub now_ms: i64,
    pub window_ms: u64,
    /// Events per second seen by ingestion at dispatch time
    pub ingest_rate: f64,
}

impl WindowSnapshot {
    pub fn new(events: impl Into<Arc<[Event]>>, now_ms: i64, window_ms: u64) -> Self {
        Self {
            events: events.into(),
            now_ms,
            window_ms,
            ingest_rate: 0.0,
        }
    }

    pub fn with_ingest_rate(mut self, rate: f64) -> Self {
        self.ingest_rate = rate;
        self
    }

    /// Events inside the window
    pub fn window(&self) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.in_window(self.now_ms, self.window_ms))
            .cloned()
            .collect()
    }

    /// Events per second across the window
    pub fn window_rate(&self) -> f64 {
        let len = self
            .events
            .iter()
            .filter(|e| e.in_window(self.now_ms, self.window_ms))
            .count();
        len as f64 / (self.window_ms.max(1) as f64 / 1000.0)
    }
}

/// Output of one detection cycle. Plain data for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub cycle: u64,
    pub score: AnomalyScore,
    pub diagram: PersistenceDiagram,
    pub betti: BettiSummary,
    pub shifts: Vec<BettiShift>,
    pub landscapes: Vec<LandscapeLayer>,
    pub event_count: usize,
    pub aux_signal: f64,
    pub ingest_rate: f64,
    pub admitted_to_baseline: bool,
    pub processing_time_ms: f64,
}

/// State owned by the detection side: extractor, detector with its
/// baseline, the admission sampler and the previous Betti summary.
///
/// Created when the pipeline starts and dropped at shutdown. Only the
/// in-flight job touches it.
#[derive(Debug)]
pub struct PipelineContext {
    config: EngineConfig,
    extractor: FeatureExtractor,
    detector: MultiModalDetector,
    sampler: StdRng,
    previous_betti: Option<BettiSummary>,
    cycle: u64,
}

impl PipelineContext {
    pub fn new(config: EngineConfig) -> Self {
        let detector = MultiModalDetector::from_config(&config);
        Self::with_detector(config, detector)
    }

    pub fn with_detector(config: EngineConfig, detector: MultiModalDetector) -> Self {
        Self {
            extractor: FeatureExtractor::new(config.extraction),
            sampler: StdRng::seed_from_u64(config.sampler_seed),
            detector,
            config,
            previous_betti: None,
            cycle: 0,
        }
    }

    pub fn detector(&self) -> &MultiModalDetector {
        &self.detector
    }

    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Run one detection cycle over `snapshot`.
    pub fn run(&mut self, snapshot: &WindowSnapshot, aux_signal: f64) -> DetectionReport {
        let started = Instant::now();
        self.cycle += 1;

        let window = snapshot.window();
        let diagram = self.extractor.compute_persistence_diagram(
            &window,
            snapshot.now_ms,
            snapshot.window_ms,
        );
        let betti = self.extractor.compute_betti_numbers(&window);
        let shifts = self
            .previous_betti
            .map(|prev| betti.shifts_from(&prev))
            .unwrap_or_default();
        self.previous_betti = Some(betti);

        // Under-populated windows are neither admitted nor scored.
        let populated = window.len() >= self.config.min_window_events.max(1);
        let admitted =
            populated && self.sampler.random::<f64>() < self.config.baseline_sample_rate;
        if admitted {
            self.detector.add_to_baseline(diagram.clone());
        }

        let score = if populated {
            self.detector.detect(&diagram, aux_signal)
        } else {
            tracing::debug!(
                cycle = self.cycle,
                events = window.len(),
                required = self.config.min_window_events,
                "Window under-populated; score withheld"
            );
            AnomalyScore::quiet()
        };
        let landscapes = compute_landscapes(
            &diagram,
            self.config.landscape_layers,
            self.config.landscape_resolution,
            None,
        );

        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(
            cycle = self.cycle,
            events = window.len(),
            points = diagram.len(),
            h0 = betti.h0,
            h1 = betti.h1,
            h2 = betti.h2,
            baseline = self.detector.baseline().len(),
            total_score = score.total_score,
            elapsed_ms = processing_time_ms,
            "Detection cycle complete"
        );
        if score.is_anomaly {
            tracing::warn!(
                cycle = self.cycle,
                total_score = score.total_score,
                confidence = score.confidence,
                "Structural anomaly detected"
            );
        }
        for shift in &shifts {
            tracing::info!(
                cycle = self.cycle,
                dimension = shift.dimension,
                delta = shift.delta,
                severity = ?shift.severity,
                "Betti shift"
            );
        }

        DetectionReport {
            cycle: self.cycle,
            score,
            diagram,
            betti,
            shifts,
            landscapes,
            event_count: window.len(),
            aux_signal,
            ingest_rate: snapshot.ingest_rate,
            admitted_to_baseline: admitted,
            processing_time_ms,
        }
    }
}
