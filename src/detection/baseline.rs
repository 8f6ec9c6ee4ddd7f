//! Rolling baseline of "normal" diagrams.

use std::collections::VecDeque;

use crate::landscape::first_layer_norm;
use crate::topology::PersistenceDiagram;

/// A baseline diagram and its first-layer landscape norm.
#[derive(Debug, Clone)]
pub struct BaselineEntry {
    pub diagram: PersistenceDiagram,
    pub norm: f64,
}

/// FIFO of recent baseline entries, capped at `capacity`.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    entries: VecDeque<BaselineEntry>,
    capacity: usize,
    norm_resolution: usize,
}

impl BaselineStore {
    pub fn new(capacity: usize, norm_resolution: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            norm_resolution,
        }
    }

    /// Append a diagram, evicting the oldest entry when full.
    pub fn add(&mut self, diagram: PersistenceDiagram) {
        let norm = first_layer_norm(&diagram, self.norm_resolution);
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(BaselineEntry { diagram, norm });
    }

    /// The `k` most recent diagrams, oldest first.
    pub fn recent(&self, k: usize) -> impl Iterator<Item = &PersistenceDiagram> {
        let skip = self.entries.len().saturating_sub(k);
        self.entries.iter().skip(skip).map(|e| &e.diagram)
    }

    /// Mean and standard deviation of the stored norms.
    ///
    /// Variance is floored at 1 so the deviation is never zero.
    pub fn norm_stats(&self) -> (f64, f64) {
        if self.entries.is_empty() {
            return (0.0, 1.0);
        }
        let n = self.entries.len() as f64;
        let mean = self.entries.iter().map(|e| e.norm).sum::<f64>() / n;
        let variance = self
            .entries
            .iter()
            .map(|e| (e.norm - mean).powi(2))
            .sum::<f64>()
            / n;
        (mean, variance.max(1.0).sqrt())
    }

    pub fn entries(&self) -> impl Iterator<Item = &BaselineEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::PersistencePoint;

    fn single(death: f64, id: &str) -> PersistenceDiagram {
        PersistenceDiagram::from_points(vec![PersistencePoint::new(0, 0.0, death, id)])
    }

    #[test]
    fn test_fifo_eviction() {
        let mut store = BaselineStore::new(3, 50);
        for i in 0..10 {
            store.add(single(1.0 + i as f64, &format!("{i}")));
        }
        assert_eq!(store.len(), 3);
        let ids: Vec<&str> = store.entries().map(|e| e.diagram.points[0].id.as_str()).collect();
        assert_eq!(ids, vec!["7", "8", "9"]);
    }

    #[test]
    fn test_recent_window() {
        let mut store = BaselineStore::new(10, 50);
        for i in 0..6 {
            store.add(single(1.0, &format!("{i}")));
        }
        let ids: Vec<&str> = store.recent(2).map(|d| d.points[0].id.as_str()).collect();
        assert_eq!(ids, vec!["4", "5"]);
        assert_eq!(store.recent(100).count(), 6);
    }

    #[test]
    fn test_norm_stats_floor() {
        let mut store = BaselineStore::new(10, 50);
        for i in 0..5 {
            store.add(single(1.0, &format!("{i}")));
        }
        let (mean, std) = store.norm_stats();
        assert!(mean > 0.0);
        assert_eq!(std, 1.0);
    }

    #[test]
    fn test_empty_diagram_norm_is_zero() {
        let mut store = BaselineStore::new(4, 50);
        store.add(PersistenceDiagram::new());
        assert_eq!(store.entries().next().map(|e| e.norm), Some(0.0));
    }
}
