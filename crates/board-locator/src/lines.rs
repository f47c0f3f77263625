//! Line segments and their horizontal / vertical classification.

use image::GrayImage;
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::hough::probabilistic_hough;
use crate::params::HoughParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Image-space segment between two integer pixel endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point2<i32>,
    pub end: Point2<i32>,
}

impl LineSegment {
    pub fn new(start: Point2<i32>, end: Point2<i32>) -> Self {
        Self { start, end }
    }

    pub fn from_coords(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self::new(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    /// Signed horizontal extent.
    #[inline]
    pub fn dx(&self) -> i32 {
        self.end.x - self.start.x
    }

    /// Signed vertical extent.
    #[inline]
    pub fn dy(&self) -> i32 {
        self.end.y - self.start.y
    }

    /// Horizontal when the x extent strictly exceeds the y extent; a
    /// 45-degree segment counts as vertical.
    #[inline]
    pub fn orientation(&self) -> Orientation {
        if self.dx().abs() > self.dy().abs() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }
}

/// Segments split by orientation, each group in detection order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedLines {
    pub horizontal: Vec<LineSegment>,
    pub vertical: Vec<LineSegment>,
}

impl ClassifiedLines {
    pub fn len(&self) -> usize {
        self.horizontal.len() + self.vertical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty()
    }

    /// Number of (horizontal, vertical) pairs the intersection stage visits.
    pub fn pair_count(&self) -> usize {
        self.horizontal.len() * self.vertical.len()
    }
}

pub fn classify_lines(segments: impl IntoIterator<Item = LineSegment>) -> ClassifiedLines {
    let mut out = ClassifiedLines::default();
    for seg in segments {
        match seg.orientation() {
            Orientation::Horizontal => out.horizontal.push(seg),
            Orientation::Vertical => out.vertical.push(seg),
        }
    }
    out
}

/// Detect straight segments in the edge mask and classify them.
///
/// No segment is dropped here, however many there are.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask, params), fields(width = mask.width(), height = mask.height()))
)]
pub fn extract_lines(mask: &GrayImage, params: &HoughParams) -> ClassifiedLines {
    let lines = classify_lines(probabilistic_hough(mask, params));
    debug!(
        "found {} lines ({} horizontal, {} vertical)",
        lines.len(),
        lines.horizontal.len(),
        lines.vertical.len()
    );
    lines
}
