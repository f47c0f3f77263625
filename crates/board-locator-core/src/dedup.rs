//! Near-duplicate insertion for 3D points.
//!
//! Several line pairs usually intersect at the same printed corner, so the
//! 3D points derived from them must be collapsed. Every implementation here
//! shares one contract: a candidate whose L1 distance to any retained point
//! is `<= threshold` is rejected, and the first-seen representative of a
//! cluster is the one kept.

use kiddo::{KdTree, Manhattan};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Sum of absolute coordinate differences.
#[inline]
pub fn l1_distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a.x - b.x).abs() + (a.y - b.y).abs() + (a.z - b.z).abs()
}

/// A growing point set that refuses near-duplicates.
pub trait NearDuplicateSet {
    /// Insert `p` unless a retained point lies within the threshold.
    /// Returns `true` when the point was kept.
    fn insert(&mut self, p: Point3<f64>) -> bool;

    /// Retained points in insertion order.
    fn points(&self) -> &[Point3<f64>];

    fn threshold(&self) -> f64;

    fn len(&self) -> usize {
        self.points().len()
    }

    fn is_empty(&self) -> bool {
        self.points().is_empty()
    }
}

/// Which [`NearDuplicateSet`] implementation to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Linear scan over the retained points; fine for tens of points.
    #[default]
    Linear,
    /// KD-tree nearest-neighbour query under the Manhattan metric.
    KdTree,
}

/// Build an empty set for `strategy`.
pub fn new_dedup_set(strategy: DedupStrategy, threshold: f64) -> Box<dyn NearDuplicateSet> {
    match strategy {
        DedupStrategy::Linear => Box::new(LinearDedup::new(threshold)),
        DedupStrategy::KdTree => Box::new(KdTreeDedup::new(threshold)),
    }
}

#[derive(Clone, Debug)]
pub struct LinearDedup {
    threshold: f64,
    points: Vec<Point3<f64>>,
}

impl LinearDedup {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            points: Vec::new(),
        }
    }
}

impl NearDuplicateSet for LinearDedup {
    fn insert(&mut self, p: Point3<f64>) -> bool {
        if self
            .points
            .iter()
            .any(|q| l1_distance(q, &p) <= self.threshold)
        {
            return false;
        }
        self.points.push(p);
        true
    }

    fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

pub struct KdTreeDedup {
    threshold: f64,
    tree: KdTree<f64, 3>,
    points: Vec<Point3<f64>>,
}

impl KdTreeDedup {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            tree: KdTree::new(),
            points: Vec::new(),
        }
    }
}

impl NearDuplicateSet for KdTreeDedup {
    fn insert(&mut self, p: Point3<f64>) -> bool {
        let query = [p.x, p.y, p.z];
        if !self.points.is_empty() {
            let nearest = self.tree.nearest_one::<Manhattan>(&query);
            if nearest.distance <= self.threshold {
                return false;
            }
        }
        self.tree.add(&query, self.points.len() as u64);
        self.points.push(p);
        true
    }

    fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(set: &mut dyn NearDuplicateSet, pts: &[Point3<f64>]) -> Vec<bool> {
        pts.iter().map(|p| set.insert(*p)).collect()
    }

    #[test]
    fn first_seen_representative_wins() {
        let mut set = LinearDedup::new(0.03);
        let kept = fill(
            &mut set,
            &[
                Point3::new(0.10, 0.20, 1.00),
                Point3::new(0.11, 0.20, 1.00),
                Point3::new(0.30, 0.20, 1.00),
            ],
        );
        assert_eq!(kept, vec![true, false, true]);
        assert_eq!(set.points()[0], Point3::new(0.10, 0.20, 1.00));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn threshold_boundary_is_discarded() {
        let mut set = LinearDedup::new(0.25);
        assert!(set.insert(Point3::new(0.0, 0.0, 0.0)));
        // Exactly representable: 0.125 + 0.125 == 0.25.
        assert!(!set.insert(Point3::new(0.125, -0.125, 0.0)));
        assert!(set.insert(Point3::new(0.125, 0.0, 0.25)));
    }

    #[test]
    fn zero_threshold_keeps_close_but_distinct_points() {
        let mut set = LinearDedup::new(0.0);
        assert!(set.insert(Point3::new(0.0, 0.0, 1.0)));
        assert!(set.insert(Point3::new(0.01, 0.01, 1.0)));
        assert!(!set.insert(Point3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn kd_tree_agrees_with_linear_scan() {
        let mut pts = Vec::new();
        for i in 0..12 {
            for j in 0..9 {
                let jitter = ((i * 7 + j * 13) % 5) as f64 * 0.004;
                pts.push(Point3::new(i as f64 * 0.05 + jitter, j as f64 * 0.05, 1.0 - jitter));
                pts.push(Point3::new(
                    i as f64 * 0.05 + 0.011,
                    j as f64 * 0.05 - jitter,
                    1.0,
                ));
            }
        }

        let mut linear = new_dedup_set(DedupStrategy::Linear, 0.03);
        let mut kd = new_dedup_set(DedupStrategy::KdTree, 0.03);
        let a = fill(linear.as_mut(), &pts);
        let b = fill(kd.as_mut(), &pts);
        assert_eq!(a, b);
        assert_eq!(linear.points(), kd.points());
        assert!(linear.len() < pts.len());
    }

    #[test]
    fn strategy_names_are_snake_case() {
        let s: DedupStrategy = serde_json::from_str("\"kd_tree\"").expect("parse");
        assert_eq!(s, DedupStrategy::KdTree);
        assert_eq!(serde_json::to_string(&DedupStrategy::Linear).unwrap(), "\"linear\"");
    }
}
