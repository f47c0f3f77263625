use board_locator_core::{BoardModel, DedupStrategy};
use serde::{Deserialize, Serialize};

/// Angular resolution of the Hough accumulator, in degrees.
pub const THETA_RESOLUTION_DEG: f64 = 1.0;

/// Largest run of missing edge pixels bridged while walking a line.
pub const MAX_LINE_GAP: u32 = 10;

/// Color channel used to segment the printed squares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChannel {
    Red,
    Green,
    #[default]
    Blue,
}

impl ColorChannel {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ColorChannel::Red => 0,
            ColorChannel::Green => 1,
            ColorChannel::Blue => 2,
        }
    }
}

/// Feature-mask construction settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskParams {
    /// Channel in which the board squares stand out from the background.
    pub channel: ColorChannel,
    /// Channel values strictly above this become foreground.
    pub threshold: u8,
    /// Canny hysteresis thresholds.
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            channel: ColorChannel::Blue,
            threshold: 100,
            canny_low: 30.0,
            canny_high: 200.0,
        }
    }
}

/// Probabilistic Hough line detection settings.
///
/// Angular resolution and maximum line gap are fixed, see
/// [`THETA_RESOLUTION_DEG`] and [`MAX_LINE_GAP`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughParams {
    /// Distance resolution of the accumulator, in pixels.
    pub rho: f64,
    /// Minimum accumulator votes before a line is traced.
    pub threshold: u32,
    /// Minimum segment extent (along x or y), in pixels.
    pub min_line_length: u32,
    /// Seed for the random edge-pixel visiting order.
    pub seed: u64,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            rho: 1.0,
            threshold: 50,
            min_line_length: 100,
            seed: 0,
        }
    }
}

/// Full locator configuration. Supplied once; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorParams {
    pub mask: MaskParams,
    pub hough: HoughParams,
    /// L1 distance (meters) under which two board points are one corner.
    pub dedup_threshold: f64,
    pub dedup_strategy: DedupStrategy,
    /// Dead band (meters) around the centroid when bucketing corners.
    pub corner_margin: f64,
    pub board: BoardModel,
    /// Frame id given to the located target.
    pub target_frame_id: String,
    /// Also output the board points mapped into the board frame.
    pub emit_points: bool,
}

impl Default for LocatorParams {
    fn default() -> Self {
        Self {
            mask: MaskParams::default(),
            hough: HoughParams::default(),
            dedup_threshold: 0.03,
            dedup_strategy: DedupStrategy::Linear,
            corner_margin: 0.05,
            board: BoardModel::default(),
            target_frame_id: "chess_board".to_string(),
            emit_points: false,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("hough rho must be finite and positive (got {0})")]
    InvalidRho(f64),
    #[error("hough vote threshold must be at least 1")]
    ZeroVoteThreshold,
    #[error("minimum line length must be at least 1 pixel")]
    ZeroLineLength,
    #[error("canny thresholds must satisfy 0 <= low <= high (got {low}, {high})")]
    InvalidCanny { low: f32, high: f32 },
    #[error("{name} must be finite and non-negative (got {value})")]
    NegativeDistance { name: &'static str, value: f64 },
    #[error("target frame id must not be empty")]
    EmptyTargetFrame,
}

impl LocatorParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        let h = &self.hough;
        if !h.rho.is_finite() || h.rho <= 0.0 {
            return Err(ParamsError::InvalidRho(h.rho));
        }
        if h.threshold == 0 {
            return Err(ParamsError::ZeroVoteThreshold);
        }
        if h.min_line_length == 0 {
            return Err(ParamsError::ZeroLineLength);
        }

        let m = &self.mask;
        if !(m.canny_low >= 0.0 && m.canny_low <= m.canny_high) {
            return Err(ParamsError::InvalidCanny {
                low: m.canny_low,
                high: m.canny_high,
            });
        }

        for (name, value) in [
            ("dedup_threshold", self.dedup_threshold),
            ("corner_margin", self.corner_margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ParamsError::NegativeDistance { name, value });
            }
        }

        if self.target_frame_id.is_empty() {
            return Err(ParamsError::EmptyTargetFrame);
        }
        Ok(())
    }
}
