//! Horizontal x vertical line intersections lifted into 3D.

use board_locator_core::{new_dedup_set, DedupStrategy, PointLookup};
use log::debug;
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::lines::{ClassifiedLines, LineSegment};

/// Intersection of the infinite lines through `a` and `b`, truncated to
/// integer pixel coordinates.
///
/// Returns `None` when either line has zero horizontal extent (undefined
/// slope), when the slopes are equal (parallel or identical lines), or when
/// the intersection falls outside `[0, width) x [0, height)`.
pub fn find_intersection(
    a: &LineSegment,
    b: &LineSegment,
    width: usize,
    height: usize,
) -> Option<Point2<i32>> {
    let (adx, bdx) = (a.dx(), b.dx());
    if adx == 0 || bdx == 0 {
        return None;
    }
    let ma = a.dy() as f64 / adx as f64;
    let mb = b.dy() as f64 / bdx as f64;
    if ma == mb {
        return None;
    }

    let ba = a.start.y as f64 - ma * a.start.x as f64;
    let bb = b.start.y as f64 - mb * b.start.x as f64;
    let x = (bb - ba) / (ma - mb);
    let y = ma * x + ba;

    let inside = x >= 0.0 && y >= 0.0 && x < width as f64 && y < height as f64;
    inside.then(|| Point2::new(x as i32, y as i32))
}

/// Where each visited line pair ended up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionStats {
    pub pairs: usize,
    /// No unique intersection, or outside the image.
    pub no_intersection: usize,
    /// Intersection pixel without a valid 3D return.
    pub missing_depth: usize,
    pub duplicates: usize,
    pub kept: usize,
}

/// Deduplicated 3D board points in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardPoints {
    pub points: Vec<Point3<f64>>,
    pub stats: IntersectionStats,
}

/// Intersect every (horizontal, vertical) pair, look the pixel up in the
/// cloud, and keep the points that are not near-duplicates of earlier ones.
///
/// Pairs are visited horizontal-major. Image bounds are the cloud's size.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(lines, cloud), fields(pairs = lines.pair_count()))
)]
pub fn locate_board_points<C: PointLookup + ?Sized>(
    lines: &ClassifiedLines,
    cloud: &C,
    dedup_threshold: f64,
    strategy: DedupStrategy,
) -> BoardPoints {
    let (width, height) = (cloud.width(), cloud.height());
    let mut set = new_dedup_set(strategy, dedup_threshold);
    let mut stats = IntersectionStats::default();

    for hl in &lines.horizontal {
        for vl in &lines.vertical {
            stats.pairs += 1;
            let Some(px) = find_intersection(hl, vl, width, height) else {
                stats.no_intersection += 1;
                continue;
            };
            let Some(p) = cloud.point_at(px.x as usize, px.y as usize) else {
                stats.missing_depth += 1;
                continue;
            };
            if !set.insert(p.cast::<f64>()) {
                stats.duplicates += 1;
            }
        }
    }
    stats.kept = set.len();

    debug!(
        "board points: {} kept of {} pairs ({} no intersection, {} missing depth, {} duplicates)",
        stats.kept, stats.pairs, stats.no_intersection, stats.missing_depth, stats.duplicates
    );

    BoardPoints {
        points: set.points().to_vec(),
        stats,
    }
}
