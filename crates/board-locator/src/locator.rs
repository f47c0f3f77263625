use std::time::SystemTime;

use board_locator_core::{FrameHeader, PointLookup};
use image::RgbImage;
use log::{debug, info, warn};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::candidates::{select_candidates, CornerCandidates};
use crate::error::LocateError;
use crate::intersections::{locate_board_points, IntersectionStats};
use crate::lines::{extract_lines, ClassifiedLines};
use crate::mask::build_feature_mask;
use crate::output::{make_pose, BoardPose};
use crate::params::{LocatorParams, ParamsError};
use crate::search::{search_pose, PoseFit};

/// Intermediate results of one frame, for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub lines: ClassifiedLines,
    pub intersections: IntersectionStats,
    pub board_points: Vec<Point3<f64>>,
    pub candidates: Option<CornerCandidates>,
    pub fit: Option<PoseFit>,
}

/// Locates the checkerboard target in aligned color image / cloud pairs.
///
/// The locator holds configuration only; every call is independent.
pub struct BoardLocator {
    params: LocatorParams,
}

impl BoardLocator {
    pub fn new(params: LocatorParams) -> Result<Self, ParamsError> {
        params.validate()?;
        info!(
            "hough rho={} threshold={} min_length={}",
            params.hough.rho, params.hough.threshold, params.hough.min_line_length
        );
        debug!(
            "board {}x{} squares of {} m, dedup {} m ({:?}), corner margin {} m",
            params.board.squares(),
            params.board.squares(),
            params.board.square_size(),
            params.dedup_threshold,
            params.dedup_strategy,
            params.corner_margin
        );
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &LocatorParams {
        &self.params
    }

    /// Run the full pipeline on one frame pair.
    pub fn locate<C: PointLookup + ?Sized>(
        &self,
        header: &FrameHeader,
        image: &RgbImage,
        cloud: &C,
    ) -> Result<BoardPose, LocateError> {
        self.locate_detailed(header, image, cloud).0
    }

    /// Like [`BoardLocator::locate`], also returning the per-stage results.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(frame = %header.frame_id, width = image.width(), height = image.height()))
    )]
    pub fn locate_detailed<C: PointLookup + ?Sized>(
        &self,
        header: &FrameHeader,
        image: &RgbImage,
        cloud: &C,
    ) -> (Result<BoardPose, LocateError>, FrameReport) {
        let (image_width, image_height) = (image.width() as usize, image.height() as usize);
        if (image_width, image_height) != (cloud.width(), cloud.height()) {
            let err = LocateError::DimensionMismatch {
                image_width,
                image_height,
                cloud_width: cloud.width(),
                cloud_height: cloud.height(),
            };
            return (Err(err), FrameReport::default());
        }

        let mask = build_feature_mask(image, &self.params.mask);
        let lines = extract_lines(&mask, &self.params.hough);
        self.locate_from_lines_detailed(header, lines, cloud)
    }

    /// Run the pipeline from already classified line segments.
    pub fn locate_from_lines<C: PointLookup + ?Sized>(
        &self,
        header: &FrameHeader,
        lines: &ClassifiedLines,
        cloud: &C,
    ) -> Result<BoardPose, LocateError> {
        self.locate_from_lines_detailed(header, lines.clone(), cloud).0
    }

    fn locate_from_lines_detailed<C: PointLookup + ?Sized>(
        &self,
        header: &FrameHeader,
        lines: ClassifiedLines,
        cloud: &C,
    ) -> (Result<BoardPose, LocateError>, FrameReport) {
        let board_points = locate_board_points(
            &lines,
            cloud,
            self.params.dedup_threshold,
            self.params.dedup_strategy,
        );
        let mut report = FrameReport {
            lines,
            intersections: board_points.stats,
            board_points: board_points.points,
            ..FrameReport::default()
        };
        let result = self.solve(header, &mut report);
        (result, report)
    }

    /// Run the pipeline from deduplicated 3D board points (camera frame).
    pub fn locate_from_points(
        &self,
        header: &FrameHeader,
        points: &[Point3<f64>],
    ) -> Result<BoardPose, LocateError> {
        let mut report = FrameReport {
            board_points: points.to_vec(),
            ..FrameReport::default()
        };
        self.solve(header, &mut report)
    }

    fn solve(
        &self,
        header: &FrameHeader,
        report: &mut FrameReport,
    ) -> Result<BoardPose, LocateError> {
        let points = &report.board_points;
        report.candidates = select_candidates(points, self.params.corner_margin);

        let result = match &report.candidates {
            Some(c) if c.is_searchable() => search_pose(points, c, &self.params.board).ok_or(
                LocateError::NoValidTriple {
                    triples: c.triple_count(),
                },
            ),
            Some(c) => Err(LocateError::InsufficientCandidates {
                a1: c.a1.len(),
                a8: c.a8.len(),
                h1: c.h1.len(),
            }),
            None => Err(LocateError::InsufficientCandidates {
                a1: 0,
                a8: 0,
                h1: 0,
            }),
        };

        match result {
            Ok(fit) => {
                info!(
                    "located board in {} from {} points: score {:.6} ({} triples)",
                    header.frame_id,
                    points.len(),
                    fit.score,
                    fit.evaluated
                );
                let emitted = self.params.emit_points.then_some(points.as_slice());
                let pose = make_pose(
                    &fit,
                    header,
                    &self.params.target_frame_id,
                    SystemTime::now(),
                    emitted,
                );
                report.fit = Some(fit);
                Ok(pose)
            }
            Err(err) => {
                warn!("{}: {err}", header.frame_id);
                Err(err)
            }
        }
    }
}
