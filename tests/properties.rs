//! Property tests for diagram distances, landscapes and feature extraction.

use proptest::prelude::*;

use topo_anomaly::{
    average_landscapes, bottleneck, compute_landscapes, wasserstein, Event, FeatureExtractor,
    PersistenceDiagram, PersistencePoint,
};

const TOL: f64 = 1e-9;

fn point() -> impl Strategy<Value = (usize, f64, f64)> {
    (0usize..3, 0.0f64..1.0, 0.0f64..1.0)
}

fn diagram(max_points: usize) -> impl Strategy<Value = PersistenceDiagram> {
    prop::collection::vec(point(), 0..max_points).prop_map(|raw| {
        PersistenceDiagram::from_points(
            raw.into_iter()
                .enumerate()
                .map(|(i, (dim, birth, life))| {
                    PersistencePoint::new(dim, birth, birth + life, format!("p{i}"))
                })
                .collect(),
        )
    })
}

fn event() -> impl Strategy<Value = Event> {
    (0u32..8, 0u32..12, 0u32..3, 0i64..60_000).prop_map(|(actor, entity, partition, ago)| {
        Event::new(
            format!("ev-{actor}-{entity}-{ago}"),
            format!("u{actor}"),
            format!("x{entity}"),
            format!("p{partition}"),
            1_000_000 - ago,
        )
    })
}

proptest! {
    #[test]
    fn prop_self_distance_is_zero(d in diagram(12), p in 1.0f64..3.0) {
        prop_assert!(wasserstein(&d, &d, p).abs() < TOL);
        prop_assert!(bottleneck(&d, &d).abs() < TOL);
    }

    #[test]
    fn prop_distances_symmetric(a in diagram(10), b in diagram(10), p in 1.0f64..3.0) {
        prop_assert!((wasserstein(&a, &b, p) - wasserstein(&b, &a, p)).abs() < TOL);
        prop_assert!((bottleneck(&a, &b) - bottleneck(&b, &a)).abs() < TOL);
    }

    #[test]
    fn prop_distances_non_negative(a in diagram(10), b in diagram(10)) {
        prop_assert!(wasserstein(&a, &b, 1.0) >= 0.0);
        prop_assert!(bottleneck(&a, &b) >= 0.0);
    }

    // Greedy matching is exact when each diagram holds at most one point.
    #[test]
    fn prop_triangle_single_points(a in diagram(2), b in diagram(2), c in diagram(2), p in 1.0f64..3.0) {
        prop_assert!(wasserstein(&a, &c, p) <= wasserstein(&a, &b, p) + wasserstein(&b, &c, p) + TOL);
        prop_assert!(bottleneck(&a, &c) <= bottleneck(&a, &b) + bottleneck(&b, &c) + TOL);
    }

    #[test]
    fn prop_bottleneck_to_empty_monotone(d in diagram(10), extra in point()) {
        let empty = PersistenceDiagram::new();
        let before = bottleneck(&empty, &d);
        let mut grown = d.clone();
        let (dim, birth, life) = extra;
        grown.add(PersistencePoint::new(dim, birth, birth + life, "extra"));
        prop_assert!(bottleneck(&empty, &grown) + TOL >= before);
    }

    #[test]
    fn prop_landscape_layers_ordered(d in diagram(12), layers in 1usize..5, resolution in 1usize..80) {
        let landscapes = compute_landscapes(&d, layers, resolution, None);
        for pair in landscapes.windows(2) {
            let (upper, lower) = (&pair[0], &pair[1]);
            if upper.dimension != lower.dimension {
                continue;
            }
            prop_assert_eq!(upper.layer + 1, lower.layer);
            for (&(_, hi), &(_, lo)) in upper.values.iter().zip(lower.values.iter()) {
                prop_assert!(hi + TOL >= lo);
            }
        }
        for layer in &landscapes {
            prop_assert_eq!(layer.values.len(), resolution + 1);
            prop_assert!(layer.values.iter().all(|&(_, y)| y >= 0.0));
        }
    }

    #[test]
    fn prop_average_of_one_is_identity(d in diagram(8)) {
        prop_assume!(!d.is_empty());
        let landscapes = compute_landscapes(&d, 1, 20, None);
        let first = landscapes[0].clone();
        prop_assert_eq!(average_landscapes(std::slice::from_ref(&first)), Some(first));
    }

    #[test]
    fn prop_extraction_bounded(events in prop::collection::vec(event(), 0..200)) {
        let extractor = FeatureExtractor::default();
        let betti = extractor.compute_betti_numbers(&events);
        prop_assert!(betti.h0 <= 50);
        prop_assert!(betti.h1 <= 30);
        prop_assert!(betti.h2 <= 10);

        let diagram = extractor.compute_persistence_diagram(&events, 1_000_000, 60_000);
        prop_assert!(diagram.len() <= 50);
        for p in &diagram.points {
            prop_assert!(p.birth >= 0.0 && p.death <= 1.0);
            prop_assert!(p.birth < p.death, "{p:?}");
        }
    }

    #[test]
    fn prop_extraction_reproducible(events in prop::collection::vec(event(), 0..60)) {
        let extractor = FeatureExtractor::default();
        let a = extractor.compute_persistence_diagram(&events, 1_000_000, 60_000);
        let b = extractor.compute_persistence_diagram(&events, 1_000_000, 60_000);
        prop_assert_eq!(a, b);
    }
}

#[test]
fn test_average_of_none() {
    assert_eq!(average_landscapes(&[]), None);
}
