//! Feature Extraction: Windows of Events to Topological Summaries
//!
//! Each window is read as a bipartite activity graph between actors and
//! entities, partitioned by key. Betti numbers and diagram points are
//! heuristic proxies derived from that graph:
//!
//! - H0: an actor with repeated activity is a component whose lifespan is
//!   its first..last activity, normalized into the window
//! - H1: an entity touched by several actors closes a loop
//! - H2: a partition with heavy activity encloses a void
//!
//! H1/H2 placements are synthetic. They are drawn from an RNG seeded by a
//! digest of the window, so identical windows give identical diagrams.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use super::{BettiSummary, PersistenceDiagram, PersistencePoint};
use crate::config::ExtractionConfig;
use crate::stream::Event;

#[derive(Debug, Clone, Copy)]
struct Activity {
    first: i64,
    last: i64,
    count: usize,
}

/// Converts event windows into Betti summaries and persistence diagrams.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ExtractionConfig,
}

impl FeatureExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Heuristic Betti numbers for the events of one window.
    pub fn compute_betti_numbers(&self, window: &[Event]) -> BettiSummary {
        let cfg = &self.config;

        let entities: HashSet<&str> = window.iter().map(|e| e.entity_id.as_str()).collect();
        let h0 = entities.len().min(cfg.h0_cap);

        let mut actor_counts: HashMap<&str, usize> = HashMap::new();
        let mut entity_actors: HashMap<&str, HashSet<&str>> = HashMap::new();
        let mut partition_counts: HashMap<&str, usize> = HashMap::new();
        for e in window {
            *actor_counts.entry(e.actor_id.as_str()).or_default() += 1;
            entity_actors
                .entry(e.entity_id.as_str())
                .or_default()
                .insert(e.actor_id.as_str());
            *partition_counts.entry(e.partition_key.as_str()).or_default() += 1;
        }

        let repeat_actors = actor_counts
            .values()
            .filter(|&&c| c > cfg.repeat_threshold)
            .count();
        let shared_entities = entity_actors.values().filter(|a| a.len() > 1).count();
        let h1 = (repeat_actors + shared_entities / 2).min(cfg.h1_cap);

        let active_partitions = partition_counts
            .values()
            .filter(|&&c| c > cfg.partition_activity_threshold)
            .count();
        let h2 = (active_partitions / cfg.partitions_per_void.max(1)).min(cfg.h2_cap);

        BettiSummary::new(h0, h1, h2)
    }

    /// Synthetic persistence diagram for the window ending at `now_ms`.
    ///
    /// Events outside the window are ignored. The result holds at most
    /// `max_points` points.
    pub fn compute_persistence_diagram(
        &self,
        events: &[Event],
        now_ms: i64,
        window_ms: u64,
    ) -> PersistenceDiagram {
        let cfg = &self.config;
        let window: Vec<&Event> = events
            .iter()
            .filter(|e| e.in_window(now_ms, window_ms))
            .collect();

        let mut diagram = PersistenceDiagram::new();
        if window.is_empty() || window_ms == 0 {
            return diagram;
        }

        let start = now_ms.saturating_sub(i64::try_from(window_ms).unwrap_or(i64::MAX));
        let span = window_ms as f64;
        let mut rng = StdRng::seed_from_u64(window_seed(&window));

        // H0: actor activity spans
        let mut actors: BTreeMap<&str, Activity> = BTreeMap::new();
        for e in &window {
            let t = e.timestamp_ms;
            actors
                .entry(e.actor_id.as_str())
                .and_modify(|a| {
                    a.first = a.first.min(t);
                    a.last = a.last.max(t);
                    a.count += 1;
                })
                .or_insert(Activity {
                    first: t,
                    last: t,
                    count: 1,
                });
        }
        for (actor, activity) in &actors {
            if activity.count < 2 {
                continue;
            }
            let birth = activity.first.saturating_sub(start) as f64 / span;
            let death = (activity.last.saturating_sub(start) as f64 / span + cfg.death_epsilon).min(1.0);
            if death > birth {
                diagram.add(PersistencePoint::new(
                    0,
                    birth.max(0.0),
                    death,
                    format!("h0-{actor}"),
                ));
            }
        }

        // H1: entities shared between actors
        let mut collaborators: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for e in &window {
            collaborators
                .entry(e.entity_id.as_str())
                .or_default()
                .insert(e.actor_id.as_str());
        }
        for (entity, actors) in &collaborators {
            if actors.len() > 1 {
                let birth = rng.random::<f64>() * 0.3;
                let death = (birth + 0.2 + rng.random::<f64>() * 0.5).min(1.0);
                diagram.add(PersistencePoint::new(1, birth, death, format!("h1-{entity}")));
            }
        }

        // H2: heavily active partitions
        let mut partitions: BTreeMap<&str, usize> = BTreeMap::new();
        for e in &window {
            *partitions.entry(e.partition_key.as_str()).or_default() += 1;
        }
        for (partition, count) in &partitions {
            if *count > cfg.h2_point_threshold {
                let birth = rng.random::<f64>() * 0.2;
                let death = 0.3 + rng.random::<f64>() * 0.6;
                diagram.add(PersistencePoint::new(2, birth, death, format!("h2-{partition}")));
            }
        }

        diagram.truncate(cfg.max_points);
        diagram
    }
}

/// Content digest of a window, folded to an RNG seed.
fn window_seed(window: &[&Event]) -> u64 {
    let mut hasher = Sha256::new();
    for e in window {
        hasher.update(e.id.as_bytes());
        hasher.update([0u8]);
        hasher.update(e.actor_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(e.entity_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(e.timestamp_ms.to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_000_000;
    const WINDOW: u64 = 60_000;

    fn ev(id: &str, actor: &str, entity: &str, partition: &str, ago_ms: i64) -> Event {
        Event::new(id, actor, entity, partition, NOW - ago_ms)
    }

    #[test]
    fn test_empty_window() {
        let fx = FeatureExtractor::default();
        assert_eq!(fx.compute_betti_numbers(&[]), BettiSummary::default());
        assert!(fx.compute_persistence_diagram(&[], NOW, WINDOW).is_empty());
    }

    #[test]
    fn test_repeat_actor_forms_loop() {
        let fx = FeatureExtractor::default();
        let window = vec![
            ev("1", "alice", "a", "en", 30_000),
            ev("2", "alice", "b", "en", 20_000),
            ev("3", "alice", "c", "en", 10_000),
        ];
        let betti = fx.compute_betti_numbers(&window);
        assert_eq!(betti.h0, 3);
        assert!(betti.h1 >= 1);
        assert_eq!(betti.h2, 0);
    }

    #[test]
    fn test_h0_point_spans_actor_activity() {
        let fx = FeatureExtractor::default();
        let window = vec![
            ev("1", "alice", "a", "en", 45_000),
            ev("2", "alice", "b", "en", 15_000),
            ev("3", "bob", "c", "en", 5_000),
        ];
        let pd = fx.compute_persistence_diagram(&window, NOW, WINDOW);
        let h0 = pd.dim(0);
        assert_eq!(h0.len(), 1, "single-event actors do not form components");
        assert_eq!(h0[0].id, "h0-alice");
        assert!((h0[0].birth - 0.25).abs() < 1e-12);
        assert!((h0[0].death - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_shared_entity_emits_h1() {
        let fx = FeatureExtractor::default();
        let window = vec![
            ev("1", "alice", "page", "en", 3_000),
            ev("2", "bob", "page", "en", 2_000),
        ];
        let pd = fx.compute_persistence_diagram(&window, NOW, WINDOW);
        let h1 = pd.dim(1);
        assert_eq!(h1.len(), 1);
        assert!(h1[0].birth <= 0.3);
        assert!(h1[0].death > h1[0].birth && h1[0].death <= 1.0);
    }

    #[test]
    fn test_busy_partition_emits_h2() {
        let fx = FeatureExtractor::default();
        let window: Vec<Event> = (0..12)
            .map(|i| ev(&format!("{i}"), &format!("u{i}"), &format!("x{i}"), "de", i * 100))
            .collect();
        let pd = fx.compute_persistence_diagram(&window, NOW, WINDOW);
        let h2 = pd.dim(2);
        assert_eq!(h2.len(), 1);
        assert_eq!(h2[0].id, "h2-de");
        assert!(h2[0].death >= 0.3 && h2[0].death <= 0.9);

        let betti = fx.compute_betti_numbers(&window);
        assert_eq!(betti.h2, 0, "one active partition is below a void");
    }

    #[test]
    fn test_identical_windows_are_reproducible() {
        let fx = FeatureExtractor::default();
        let window: Vec<Event> = (0..40)
            .map(|i| ev(&format!("{i}"), &format!("u{}", i % 7), &format!("x{}", i % 5), "en", i * 500))
            .collect();
        let a = fx.compute_persistence_diagram(&window, NOW, WINDOW);
        let b = fx.compute_persistence_diagram(&window, NOW, WINDOW);
        assert_eq!(a, b);
    }

    #[test]
    fn test_diagram_is_capped() {
        let config = ExtractionConfig {
            max_points: 5,
            ..ExtractionConfig::default()
        };
        let fx = FeatureExtractor::new(config);
        let window: Vec<Event> = (0..100)
            .flat_map(|i| {
                [
                    ev(&format!("a{i}"), &format!("u{i}"), &format!("x{i}"), "en", 1_000),
                    ev(&format!("b{i}"), &format!("u{i}"), &format!("x{i}"), "en", 2_000),
                ]
            })
            .collect();
        let pd = fx.compute_persistence_diagram(&window, NOW, WINDOW);
        assert_eq!(pd.len(), 5);
        assert!(pd.points.iter().all(|p| p.death >= p.birth));
    }

    #[test]
    fn test_events_outside_window_ignored() {
        let fx = FeatureExtractor::default();
        let window = vec![
            ev("1", "alice", "page", "en", 120_000),
            ev("2", "alice", "page", "en", 90_000),
        ];
        assert!(fx.compute_persistence_diagram(&window, NOW, WINDOW).is_empty());
    }

    #[test]
    fn test_unbounded_window_keeps_events() {
        let fx = FeatureExtractor::default();
        let window = vec![
            ev("1", "alice", "page", "en", 120_000),
            ev("2", "alice", "page", "en", 90_000),
        ];
        let pd = fx.compute_persistence_diagram(&window, NOW, u64::MAX);
        assert_eq!(pd.dim(0).len(), 1);
        assert!(pd.points.iter().all(|p| p.birth.is_finite() && p.death <= 1.0));
    }
}
