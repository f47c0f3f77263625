//! Binary edge mask isolating the board's grid lines.

use image::{GrayImage, RgbImage};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::{dilate, erode};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::{ColorChannel, MaskParams};

/// Copy one channel of `image` into a grayscale buffer.
pub fn extract_channel(image: &RgbImage, channel: ColorChannel) -> GrayImage {
    let c = channel.index();
    let (w, h) = image.dimensions();
    let data = image.as_raw().chunks_exact(3).map(|px| px[c]).collect();
    // The buffer length is w*h by construction.
    GrayImage::from_raw(w, h, data).unwrap_or_else(|| GrayImage::new(w, h))
}

/// Build the edge mask fed to line detection.
///
/// Threshold the discriminating channel, open it (one 3x3 erosion, one 3x3
/// dilation) to drop speckle, run Canny, then dilate the edges once so small
/// breaks do not split lines.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(image, params), fields(width = image.width(), height = image.height()))
)]
pub fn build_feature_mask(image: &RgbImage, params: &MaskParams) -> GrayImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return GrayImage::new(w, h);
    }

    let channel = extract_channel(image, params.channel);
    let binary = threshold(&channel, params.threshold, ThresholdType::Binary);
    let opened = dilate(&erode(&binary, Norm::LInf, 1), Norm::LInf, 1);
    let edges = canny(&opened, params.canny_low, params.canny_high);
    dilate(&edges, Norm::LInf, 1)
}
