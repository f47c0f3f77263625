use std::time::SystemTime;

use board_locator_core::FrameHeader;
use nalgebra::{Isometry3, Point3};
use serde::{Deserialize, Serialize};

use crate::search::PoseFit;

/// Points tagged with the frame they were observed in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StampedPoints {
    pub header: FrameHeader,
    pub points: Vec<Point3<f64>>,
}

/// Located target pose for one frame pair.
///
/// `camera_from_board` maps board-frame coordinates into the camera (cloud)
/// frame named by `header.frame_id`; `child_frame_id` names the board frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardPose {
    pub header: FrameHeader,
    pub child_frame_id: String,
    pub camera_from_board: Isometry3<f64>,
    pub score: f64,
    /// Board points mapped into the board frame by the winning fit. Only
    /// present when point output is enabled.
    pub points: Option<StampedPoints>,
}

impl BoardPose {
    /// Inverse convention: maps camera-frame coordinates into the board frame.
    pub fn board_from_camera(&self) -> Isometry3<f64> {
        self.camera_from_board.inverse()
    }
}

/// Turn the winning fit into the published pose, stamped `stamp`.
///
/// `source` is the header of the frame pair the points came from; it tags
/// the optional diagnostic points unchanged.
pub fn make_pose(
    fit: &PoseFit,
    source: &FrameHeader,
    child_frame_id: &str,
    stamp: SystemTime,
    points: Option<&[Point3<f64>]>,
) -> BoardPose {
    let points = points.map(|pts| StampedPoints {
        header: source.clone(),
        points: pts
            .iter()
            .map(|p| fit.board_from_camera.transform_point(p))
            .collect(),
    });
    BoardPose {
        header: source.restamped(stamp),
        child_frame_id: child_frame_id.to_string(),
        camera_from_board: fit.board_from_camera.inverse(),
        score: fit.score,
        points,
    }
}
