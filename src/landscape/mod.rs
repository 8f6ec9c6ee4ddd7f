//! Persistence Landscapes: Functional Summaries of Persistence Diagrams
//!
//! Each finite point (b, d) contributes a tent function
//!
//!   f₍b,d₎(t) = max(0, min(t - b, d - t))
//!
//! and the k-th landscape layer is the k-th largest tent value at t:
//!
//!   λₖ(t) = kmax { f₍b,d₎(t) : (b, d) ∈ D }
//!
//! Layers live in a vector space, so baselines can be averaged and
//! summarized by norms. By construction λₖ(t) ≥ λₖ₊₁(t) for all t.

use serde::{Deserialize, Serialize};

use crate::topology::PersistenceDiagram;

/// Fraction of the diagram's time span added on each side of the domain.
pub const DOMAIN_PADDING: f64 = 0.1;

/// One sampled landscape function λₖ for a single homology dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandscapeLayer {
    pub dimension: usize,
    /// Layer index k, starting at 1
    pub layer: usize,
    /// Samples (t, λₖ(t)) on a uniform grid
    pub values: Vec<(f64, f64)>,
}

impl LandscapeLayer {
    pub fn max_value(&self) -> f64 {
        self.values.iter().map(|&(_, y)| y).fold(0.0, f64::max)
    }
}

/// Sample `num_layers` landscape layers per dimension on `resolution + 1`
/// grid points.
///
/// The domain is `[min birth, max death]` padded by [`DOMAIN_PADDING`],
/// unless the caller supplies one. Essential points are skipped and a
/// dimension with no finite points yields no layers.
pub fn compute_landscapes(
    diagram: &PersistenceDiagram,
    num_layers: usize,
    resolution: usize,
    domain: Option<(f64, f64)>,
) -> Vec<LandscapeLayer> {
    let resolution = resolution.max(1);
    let mut landscapes = Vec::new();

    for dimension in diagram.dimensions() {
        let intervals: Vec<(f64, f64)> = diagram
            .points
            .iter()
            .filter(|p| p.dimension == dimension && !p.is_essential())
            .map(|p| (p.birth, p.death))
            .collect();
        if intervals.is_empty() {
            continue;
        }

        let (min_t, max_t) = domain.unwrap_or_else(|| {
            let lo = intervals.iter().map(|i| i.0).fold(f64::INFINITY, f64::min);
            let hi = intervals.iter().map(|i| i.1).fold(f64::NEG_INFINITY, f64::max);
            let pad = (hi - lo) * DOMAIN_PADDING;
            (lo - pad, hi + pad)
        });
        let dt = (max_t - min_t) / resolution as f64;

        let mut layers: Vec<Vec<(f64, f64)>> = (0..num_layers)
            .map(|_| Vec::with_capacity(resolution + 1))
            .collect();

        let mut tents = Vec::with_capacity(intervals.len());
        for i in 0..=resolution {
            let t = min_t + i as f64 * dt;

            tents.clear();
            tents.extend(intervals.iter().map(|&(b, d)| tent_function(t, b, d)));
            tents.sort_by(|a, b| b.total_cmp(a));

            for (k, layer) in layers.iter_mut().enumerate() {
                layer.push((t, tents.get(k).copied().unwrap_or(0.0)));
            }
        }

        landscapes.extend(layers.into_iter().enumerate().map(|(k, values)| LandscapeLayer {
            dimension,
            layer: k + 1,
            values,
        }));
    }

    landscapes
}

/// Discrete L^p norm over the sampled grid: (Σ |λ(tᵢ)|^p)^(1/p).
pub fn landscape_norm(layer: &LandscapeLayer, p: f64) -> f64 {
    layer
        .values
        .iter()
        .map(|&(_, y)| y.abs().powf(p))
        .sum::<f64>()
        .powf(1.0 / p)
}

/// L² norm of the first layer of the lowest dimension present, or 0.
pub fn first_layer_norm(diagram: &PersistenceDiagram, resolution: usize) -> f64 {
    compute_landscapes(diagram, 1, resolution, None)
        .first()
        .map(|layer| landscape_norm(layer, 2.0))
        .unwrap_or(0.0)
}

/// Pointwise mean of layers sampled on the same grid.
///
/// The grid, dimension and index of the first layer are kept. Returns
/// `None` for an empty slice.
pub fn average_landscapes(layers: &[LandscapeLayer]) -> Option<LandscapeLayer> {
    let (base, rest) = layers.split_first()?;
    if rest.is_empty() {
        return Some(base.clone());
    }

    let mut sums: Vec<f64> = base.values.iter().map(|&(_, y)| y).collect();
    for layer in rest {
        for (sum, &(_, y)) in sums.iter_mut().zip(layer.values.iter()) {
            *sum += y;
        }
    }

    let count = layers.len() as f64;
    Some(LandscapeLayer {
        dimension: base.dimension,
        layer: base.layer,
        values: base
            .values
            .iter()
            .zip(sums)
            .map(|(&(t, _), sum)| (t, sum / count))
            .collect(),
    })
}

/// Tent function for persistence interval
fn tent_function(t: f64, birth: f64, death: f64) -> f64 {
    (t - birth).min(death - t).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::PersistencePoint;

    fn diagram(points: &[(usize, f64, f64)]) -> PersistenceDiagram {
        PersistenceDiagram::from_points(
            points
                .iter()
                .map(|&(d, b, e)| PersistencePoint::new(d, b, e, "p"))
                .collect(),
        )
    }

    #[test]
    fn test_landscape_single() {
        let pd = diagram(&[(0, 0.0, 2.0)]);
        let landscapes = compute_landscapes(&pd, 1, 100, None);

        // Maximum should be at midpoint with value 1.0
        assert_eq!(landscapes.len(), 1);
        assert!((landscapes[0].max_value() - 1.0).abs() < 0.05);
        assert_eq!(landscapes[0].values.len(), 101);
    }

    #[test]
    fn test_padded_domain() {
        let pd = diagram(&[(0, 0.0, 1.0)]);
        let layer = &compute_landscapes(&pd, 1, 10, None)[0];
        assert!((layer.values[0].0 + 0.1).abs() < 1e-12);
        assert!((layer.values[10].0 - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_supplied_domain_is_used_verbatim() {
        let pd = diagram(&[(0, 0.2, 0.6)]);
        let layer = &compute_landscapes(&pd, 1, 4, Some((0.0, 1.0)))[0];
        let ts: Vec<f64> = layer.values.iter().map(|v| v.0).collect();
        assert_eq!(ts, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_layers_per_dimension() {
        let pd = diagram(&[(0, 0.0, 1.0), (0, 0.5, 1.5), (1, 0.1, 0.4)]);
        let landscapes = compute_landscapes(&pd, 3, 50, None);
        assert_eq!(landscapes.len(), 6);
        assert_eq!(landscapes.iter().filter(|l| l.dimension == 0).count(), 3);
        assert_eq!(landscapes[2].layer, 3);
    }

    #[test]
    fn test_layers_are_ordered() {
        let pd = diagram(&[(0, 0.0, 2.0), (0, 0.0, 1.0), (0, 0.5, 1.8)]);
        let landscapes = compute_landscapes(&pd, 3, 64, None);
        for pair in landscapes.windows(2) {
            for (hi, lo) in pair[0].values.iter().zip(pair[1].values.iter()) {
                assert!(hi.1 >= lo.1);
            }
        }
    }

    #[test]
    fn test_essential_points_filtered() {
        let pd = diagram(&[(0, 0.0, f64::INFINITY), (0, 0.0, 1.0), (1, 0.0, f64::INFINITY)]);
        let landscapes = compute_landscapes(&pd, 2, 50, None);
        assert_eq!(landscapes.len(), 2, "dimension 1 has no finite points");
        assert!(landscapes.iter().all(|l| l.values.iter().all(|v| v.1.is_finite())));
    }

    #[test]
    fn test_empty_diagram() {
        assert!(compute_landscapes(&PersistenceDiagram::new(), 3, 100, None).is_empty());
        assert_eq!(first_layer_norm(&PersistenceDiagram::new(), 50), 0.0);
    }

    #[test]
    fn test_norms() {
        let layer = LandscapeLayer {
            dimension: 0,
            layer: 1,
            values: vec![(0.0, 3.0), (1.0, 4.0)],
        };
        assert!((landscape_norm(&layer, 2.0) - 5.0).abs() < 1e-12);
        assert!((landscape_norm(&layer, 1.0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_average() {
        let a = LandscapeLayer {
            dimension: 0,
            layer: 1,
            values: vec![(0.0, 1.0), (1.0, 3.0)],
        };
        let b = LandscapeLayer {
            values: vec![(0.0, 3.0), (1.0, 5.0)],
            ..a.clone()
        };
        assert!(average_landscapes(&[]).is_none());
        assert_eq!(average_landscapes(std::slice::from_ref(&a)), Some(a.clone()));
        let avg = average_landscapes(&[a, b]).unwrap();
        assert_eq!(avg.values, vec![(0.0, 2.0), (1.0, 4.0)]);
    }
}
