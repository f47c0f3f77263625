//! Checkerboard pose estimation from an aligned color image and organized
//! point cloud.
//!
//! ## Quickstart
//!
//! ```
//! use board_locator::{BoardLocator, LocatorParams};
//! use board_locator::core::{FrameHeader, OrganizedCloud};
//! use image::RgbImage;
//!
//! let locator = BoardLocator::new(LocatorParams::default()).unwrap();
//!
//! let image = RgbImage::new(64, 48);
//! let cloud = OrganizedCloud::empty(64, 48);
//! let header = FrameHeader::now("camera_rgb_optical_frame");
//!
//! let pose = locator.locate(&header, &image, &cloud);
//! println!("located: {}", pose.is_ok());
//! ```
//!
//! Pipeline, run independently on every frame pair:
//! 1. Build a binary edge mask from one color channel (threshold, open,
//!    Canny, dilate).
//! 2. Extract line segments with a probabilistic Hough transform and split
//!    them into horizontal and vertical sets.
//! 3. Intersect every horizontal/vertical pair, look up the 3D point at each
//!    intersection pixel and drop near-duplicates.
//! 4. Bucket the 3D points around their centroid into candidates for the
//!    a1, a8 and h1 reference corners.
//! 5. Rigidly fit every candidate triple onto the ideal board and keep the
//!    one whose transform puts all points closest to the interior grid.
//! 6. Publish the inverse of the winning transform as the board pose.

mod candidates;
mod error;
mod hough;
mod intersections;
mod lines;
mod locator;
mod mask;
mod output;
mod params;
mod search;

pub use board_locator_core as core;

pub use candidates::{centroid, select_candidates, CornerCandidates};
pub use error::LocateError;
pub use hough::probabilistic_hough;
pub use intersections::{find_intersection, locate_board_points, BoardPoints, IntersectionStats};
pub use lines::{classify_lines, extract_lines, ClassifiedLines, LineSegment, Orientation};
pub use locator::{BoardLocator, FrameReport};
pub use mask::{build_feature_mask, extract_channel};
pub use output::{make_pose, BoardPose, StampedPoints};
pub use params::{
    ColorChannel, HoughParams, LocatorParams, MaskParams, ParamsError, MAX_LINE_GAP,
    THETA_RESOLUTION_DEG,
};
pub use search::{candidate_triples, score_triple, search_pose, PoseFit};
