//! Bucketing board points into candidates for the three reference corners.
//!
//! Axes follow the camera convention: x grows to the right, y grows down.
//! Relative to the centroid of all board points, a1 candidates sit
//! lower-left, a8 candidates upper-left and h1 candidates lower-right. The
//! fourth quadrant and the dead band of `margin` around the centroid belong
//! to no bucket. This assumes the board is seen roughly upright.

use board_locator_core::ReferenceCorner;
use log::debug;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Indices into the board-point list, one bucket per reference corner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerCandidates {
    pub centroid: Point3<f64>,
    pub a1: Vec<usize>,
    pub a8: Vec<usize>,
    pub h1: Vec<usize>,
}

impl CornerCandidates {
    pub fn bucket(&self, corner: ReferenceCorner) -> &[usize] {
        match corner {
            ReferenceCorner::A1 => &self.a1,
            ReferenceCorner::A8 => &self.a8,
            ReferenceCorner::H1 => &self.h1,
        }
    }

    /// Number of corner triples the pose search will evaluate.
    pub fn triple_count(&self) -> usize {
        self.a1.len() * self.a8.len() * self.h1.len()
    }

    /// All three buckets are non-empty.
    pub fn is_searchable(&self) -> bool {
        self.triple_count() > 0
    }
}

/// Mean of `points`, or `None` for an empty slice.
pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Bucket `points` around their centroid. Returns `None` when there are no
/// points at all.
pub fn select_candidates(points: &[Point3<f64>], margin: f64) -> Option<CornerCandidates> {
    let c = centroid(points)?;
    let mut out = CornerCandidates {
        centroid: c,
        a1: Vec::new(),
        a8: Vec::new(),
        h1: Vec::new(),
    };

    for (i, p) in points.iter().enumerate() {
        let left = p.x < c.x - margin;
        let right = p.x > c.x + margin;
        let up = p.y < c.y - margin;
        let down = p.y > c.y + margin;
        if left && down {
            out.a1.push(i);
        } else if left && up {
            out.a8.push(i);
        } else if right && down {
            out.h1.push(i);
        }
    }

    debug!(
        "corner candidates: a1={} a8={} h1={} ({} triples)",
        out.a1.len(),
        out.a8.len(),
        out.h1.len(),
        out.triple_count()
    );
    Some(out)
}
