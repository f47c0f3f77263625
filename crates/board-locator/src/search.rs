//! Exhaustive search over corner-candidate triples.
//!
//! Every (a1, a8, h1) triple is rigidly fitted onto the board's reference
//! corners and scored over the full board-point set. The search is a pure
//! reduction: each triple carries its enumeration index and the minimum is
//! taken by `(score, index)`, so exact ties go to the triple enumerated
//! first whether the reduction runs sequentially or in parallel.

use board_locator_core::{fit_rigid_transform, BoardModel};
use log::debug;
use nalgebra::{Isometry3, Point3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::candidates::CornerCandidates;

/// Best rigid fit found by the search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseFit {
    /// Maps camera-frame board points into the board frame.
    pub board_from_camera: Isometry3<f64>,
    /// Sum of squared nearest-grid distances of all board points.
    pub score: f64,
    /// Board-point indices used as `[a1, a8, h1]`.
    pub triple: [usize; 3],
    /// Position of the winning triple in enumeration order.
    pub index: usize,
    /// Number of triples that produced a finite score.
    pub evaluated: usize,
}

/// All candidate triples, a1-major then a8 then h1, with their enumeration
/// index. The sequence can be re-created at will from `candidates`.
pub fn candidate_triples(
    candidates: &CornerCandidates,
) -> impl Iterator<Item = (usize, [usize; 3])> + '_ {
    candidates
        .a1
        .iter()
        .flat_map(move |&i| {
            candidates.a8.iter().flat_map(move |&j| {
                candidates.h1.iter().map(move |&k| [i, j, k])
            })
        })
        .enumerate()
}

/// Fit and score one triple. `None` when an index is out of range, the fit
/// is degenerate or the score is not finite.
pub fn score_triple(
    points: &[Point3<f64>],
    board: &BoardModel,
    triple: [usize; 3],
) -> Option<(Isometry3<f64>, f64)> {
    let [a1, a8, h1] = triple.map(|i| points.get(i).copied());
    let src = [a1?, a8?, h1?];
    let transform = fit_rigid_transform(&src, &board.reference_corners()).ok()?;
    let score = board.fit_score(&transform, points);
    score.is_finite().then_some((transform, score))
}

#[derive(Clone)]
struct Scored {
    index: usize,
    triple: [usize; 3],
    transform: Isometry3<f64>,
    score: f64,
    count: usize,
}

/// Lower score wins; on an exact tie the earlier triple wins.
fn keep_best(a: Scored, b: Scored) -> Scored {
    let count = a.count + b.count;
    let mut best = if b.score < a.score || (b.score == a.score && b.index < a.index) {
        b
    } else {
        a
    };
    best.count = count;
    best
}

fn evaluate(
    points: &[Point3<f64>],
    board: &BoardModel,
    (index, triple): (usize, [usize; 3]),
) -> Option<Scored> {
    let (transform, score) = score_triple(points, board, triple)?;
    Some(Scored {
        index,
        triple,
        transform,
        score,
        count: 1,
    })
}

/// Find the triple whose rigid fit minimizes the board score.
///
/// Returns `None` when any bucket is empty or no triple yields a valid fit.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(points = points.len(), triples = candidates.triple_count()))
)]
pub fn search_pose(
    points: &[Point3<f64>],
    candidates: &CornerCandidates,
    board: &BoardModel,
) -> Option<PoseFit> {
    debug!("evaluating {} candidate triples", candidates.triple_count());

    #[cfg(not(feature = "rayon"))]
    let best = candidate_triples(candidates)
        .filter_map(|t| evaluate(points, board, t))
        .reduce(keep_best);

    #[cfg(feature = "rayon")]
    let best = candidate_triples(candidates)
        .collect::<Vec<_>>()
        .into_par_iter()
        .filter_map(|t| evaluate(points, board, t))
        .reduce_with(keep_best);

    let best = best?;
    debug!(
        "best triple {:?} (#{}) scored {:.6}",
        best.triple, best.index, best.score
    );
    Some(PoseFit {
        board_from_camera: best.transform,
        score: best.score,
        triple: best.triple,
        index: best.index,
        evaluated: best.count,
    })
}
