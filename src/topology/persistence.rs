//! Persistence Points and Diagrams
//!
//! A persistence point (b, d) in dimension k records a feature "born" at
//! filtration value b that "dies" at d. Here the filtration parameter is
//! normalized time within the analysis window, so finite points live in
//! [0, 1] x [0, 1].
//!
//! ## Interpretation
//!
//! - Points far from the diagonal (large d - b) are robust structure
//! - Points near the diagonal are treated as noise by the distance engine

use serde::{Deserialize, Serialize};

/// A feature with lifespan [birth, death) in a given homology dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistencePoint {
    pub dimension: usize,
    pub birth: f64,
    pub death: f64,
    pub id: String,
}

impl PersistencePoint {
    pub fn new(dimension: usize, birth: f64, death: f64, id: impl Into<String>) -> Self {
        Self {
            dimension,
            birth,
            death,
            id: id.into(),
        }
    }

    /// Lifetime of the feature
    pub fn persistence(&self) -> f64 {
        self.death - self.birth
    }

    /// Is this an essential feature (infinite persistence)?
    pub fn is_essential(&self) -> bool {
        self.death.is_infinite()
    }

    /// Euclidean distance to the diagonal birth = death
    pub fn diagonal_distance(&self) -> f64 {
        (self.birth - self.death).abs() / std::f64::consts::SQRT_2
    }

    /// Euclidean distance in the birth-death plane
    pub fn distance_to(&self, other: &PersistencePoint) -> f64 {
        let db = self.birth - other.birth;
        let dd = self.death - other.death;
        (db * db + dd * dd).sqrt()
    }
}

/// Unordered collection of persistence points for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistenceDiagram {
    pub points: Vec<PersistencePoint>,
}

impl PersistenceDiagram {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<PersistencePoint>) -> Self {
        Self { points }
    }

    pub fn add(&mut self, point: PersistencePoint) {
        self.points.push(point);
    }

    /// Keep at most `max_points`, dropping the latest additions.
    pub fn truncate(&mut self, max_points: usize) {
        self.points.truncate(max_points);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Highest dimension present (0 for an empty diagram)
    pub fn max_dimension(&self) -> usize {
        self.points.iter().map(|p| p.dimension).max().unwrap_or(0)
    }

    /// Distinct dimensions in ascending order
    pub fn dimensions(&self) -> Vec<usize> {
        let mut dims: Vec<usize> = self.points.iter().map(|p| p.dimension).collect();
        dims.sort_unstable();
        dims.dedup();
        dims
    }

    /// Get all points for a given dimension
    pub fn dim(&self, d: usize) -> Vec<&PersistencePoint> {
        self.points.iter().filter(|p| p.dimension == d).collect()
    }

    /// Number of finite points in dimension d
    pub fn betti(&self, d: usize) -> usize {
        self.points
            .iter()
            .filter(|p| p.dimension == d && !p.is_essential())
            .count()
    }

    /// Total persistence in dimension d
    pub fn total_persistence(&self, d: usize) -> f64 {
        self.points
            .iter()
            .filter(|p| p.dimension == d && !p.is_essential())
            .map(|p| p.persistence())
            .sum()
    }

    /// Maximum persistence in dimension d
    pub fn max_persistence(&self, d: usize) -> f64 {
        self.points
            .iter()
            .filter(|p| p.dimension == d && !p.is_essential())
            .map(|p| p.persistence())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_distance() {
        let p = PersistencePoint::new(0, 0.0, 2.0, "p");
        assert!((p.diagonal_distance() - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(p.persistence(), 2.0);
    }

    #[test]
    fn test_summaries_skip_essential() {
        let mut pd = PersistenceDiagram::new();
        pd.add(PersistencePoint::new(0, 0.0, 1.0, "a"));
        pd.add(PersistencePoint::new(0, 0.2, 0.5, "b"));
        pd.add(PersistencePoint::new(0, 0.0, f64::INFINITY, "c"));
        pd.add(PersistencePoint::new(1, 0.1, 0.4, "d"));

        assert_eq!(pd.betti(0), 2);
        assert_eq!(pd.dim(0).len(), 3);
        assert!((pd.total_persistence(0) - 1.3).abs() < 1e-12);
        assert_eq!(pd.max_persistence(0), 1.0);
        assert_eq!(pd.dimensions(), vec![0, 1]);
        assert_eq!(pd.max_dimension(), 1);
    }

    #[test]
    fn test_truncate_caps_cardinality() {
        let points = (0..10)
            .map(|i| PersistencePoint::new(0, 0.0, 1.0, format!("p{i}")))
            .collect();
        let mut pd = PersistenceDiagram::from_points(points);
        pd.truncate(4);
        assert_eq!(pd.len(), 4);
        assert_eq!(pd.points[3].id, "p3");
    }
}
