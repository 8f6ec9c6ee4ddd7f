//! Greedy Diagram Matching
//!
//! Both distances share one matching procedure:
//!
//! 1. Drop points within `DIAGONAL_NOISE` of the diagonal, and essential
//!    points
//! 2. Cost every same-dimension pair (Euclidean in the birth-death plane)
//! 3. Walk pairs by ascending cost, accepting a pair when both points are
//!    free and the pair is no dearer than sending them to the diagonal
//! 4. Send every unmatched point to the diagonal
//!
//! Greedy acceptance is an approximation of the optimal bipartite
//! matching. Symmetry and d(D, D) = 0 hold exactly; the triangle
//! inequality holds only approximately.

use std::cmp::Ordering;

use ndarray::Array2;

use crate::topology::{PersistenceDiagram, PersistencePoint};

/// Points closer than this to the diagonal are treated as noise.
pub const DIAGONAL_NOISE: f64 = 0.01;

/// A distance between two persistence diagrams.
///
/// Implementations must return 0 for identical diagrams and be symmetric.
pub trait DiagramDistance: Send + Sync {
    fn distance(&self, a: &PersistenceDiagram, b: &PersistenceDiagram) -> f64;

    fn name(&self) -> &'static str;
}

/// p-Wasserstein distance under greedy matching.
#[derive(Debug, Clone, Copy)]
pub struct GreedyWasserstein {
    pub p: f64,
}

impl Default for GreedyWasserstein {
    fn default() -> Self {
        Self { p: 1.0 }
    }
}

impl DiagramDistance for GreedyWasserstein {
    fn distance(&self, a: &PersistenceDiagram, b: &PersistenceDiagram) -> f64 {
        wasserstein(a, b, self.p)
    }

    fn name(&self) -> &'static str {
        "wasserstein"
    }
}

/// Bottleneck distance under greedy matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyBottleneck;

impl DiagramDistance for GreedyBottleneck {
    fn distance(&self, a: &PersistenceDiagram, b: &PersistenceDiagram) -> f64 {
        bottleneck(a, b)
    }

    fn name(&self) -> &'static str {
        "bottleneck"
    }
}

/// p-Wasserstein distance between two diagrams.
///
/// W_p = (Σ matched cost^p + Σ unmatched diagonal-cost^p)^(1/p)
pub fn wasserstein(a: &PersistenceDiagram, b: &PersistenceDiagram, p: f64) -> f64 {
    let p = if p.is_finite() && p >= 1.0 { p } else { 1.0 };
    let d1 = significant(a);
    let d2 = significant(b);

    let diag1: Vec<f64> = d1.iter().map(|x| x.diagonal_distance().powf(p)).collect();
    let diag2: Vec<f64> = d2.iter().map(|x| x.diagonal_distance().powf(p)).collect();

    let matching = greedy_match(&d1, &d2, |cost| cost.powf(p), |cost, i, j| {
        cost <= diag1[i] + diag2[j]
    });

    let matched: f64 = matching.pairs.iter().map(|&(_, _, c)| c).sum();
    let unmatched: f64 = matching.free1.iter().map(|&i| diag1[i]).sum::<f64>()
        + matching.free2.iter().map(|&j| diag2[j]).sum::<f64>();

    (matched + unmatched).powf(1.0 / p)
}

/// Bottleneck distance: the largest cost in the greedy matching.
pub fn bottleneck(a: &PersistenceDiagram, b: &PersistenceDiagram) -> f64 {
    let d1 = significant(a);
    let d2 = significant(b);

    let diag1: Vec<f64> = d1.iter().map(|x| x.diagonal_distance()).collect();
    let diag2: Vec<f64> = d2.iter().map(|x| x.diagonal_distance()).collect();

    let matching = greedy_match(&d1, &d2, |cost| cost, |cost, i, j| {
        cost <= diag1[i].max(diag2[j])
    });

    let matched = matching.pairs.iter().map(|&(_, _, c)| c).fold(0.0, f64::max);
    let unmatched = matching
        .free1
        .iter()
        .map(|&i| diag1[i])
        .chain(matching.free2.iter().map(|&j| diag2[j]))
        .fold(0.0, f64::max);

    matched.max(unmatched)
}

fn significant(diagram: &PersistenceDiagram) -> Vec<&PersistencePoint> {
    diagram
        .points
        .iter()
        .filter(|p| !p.is_essential() && p.diagonal_distance() > DIAGONAL_NOISE)
        .collect()
}

struct Matching {
    pairs: Vec<(usize, usize, f64)>,
    free1: Vec<usize>,
    free2: Vec<usize>,
}

struct Candidate {
    i: usize,
    j: usize,
    cost: f64,
    // Ordered coordinates of the pair; breaks cost ties independently of
    // argument order.
    key: [f64; 4],
}

fn pair_key(a: &PersistencePoint, b: &PersistencePoint) -> [f64; 4] {
    let (lo, hi) = if (a.birth, a.death) <= (b.birth, b.death) {
        (a, b)
    } else {
        (b, a)
    };
    [lo.birth, lo.death, hi.birth, hi.death]
}

fn cmp_key(x: &[f64; 4], y: &[f64; 4]) -> Ordering {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| a.total_cmp(b))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn greedy_match<C, A>(
    d1: &[&PersistencePoint],
    d2: &[&PersistencePoint],
    transform: C,
    accept: A,
) -> Matching
where
    C: Fn(f64) -> f64,
    A: Fn(f64, usize, usize) -> bool,
{
    let n = d1.len();
    let m = d2.len();

    // Pairwise costs; cross-dimension pairs are never matched.
    let mut costs = Array2::<f64>::from_elem((n, m), f64::INFINITY);
    for i in 0..n {
        for j in 0..m {
            if d1[i].dimension == d2[j].dimension {
                costs[[i, j]] = transform(d1[i].distance_to(d2[j]));
            }
        }
    }

    let mut candidates: Vec<Candidate> = costs
        .indexed_iter()
        .filter(|(_, c)| c.is_finite())
        .map(|((i, j), &cost)| Candidate {
            i,
            j,
            cost,
            key: pair_key(d1[i], d2[j]),
        })
        .collect();
    candidates.sort_by(|x, y| {
        x.cost
            .total_cmp(&y.cost)
            .then_with(|| cmp_key(&x.key, &y.key))
    });

    let mut used1 = vec![false; n];
    let mut used2 = vec![false; m];
    let mut pairs = Vec::new();

    for c in candidates {
        if used1[c.i] || used2[c.j] {
            continue;
        }
        if accept(c.cost, c.i, c.j) {
            used1[c.i] = true;
            used2[c.j] = true;
            pairs.push((c.i, c.j, c.cost));
        }
    }

    Matching {
        pairs,
        free1: (0..n).filter(|&i| !used1[i]).collect(),
        free2: (0..m).filter(|&j| !used2[j]).collect(),
    }
}
