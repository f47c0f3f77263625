use nalgebra::{Isometry3, Point3};
use serde::{Deserialize, Serialize};

/// Side length of one printed square of the standard target, in meters.
const DEFAULT_SQUARE_SIZE: f64 = 0.05715;
const DEFAULT_SQUARES: u32 = 8;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BoardModelError {
    #[error("square size must be finite and positive (got {0})")]
    InvalidSquareSize(f64),
    #[error("board needs at least 3 squares per side (got {0})")]
    TooFewSquares(u32),
}

/// The three interior intersections used as fitting anchors.
///
/// Names follow chess notation for the squares they touch: `A1` is the
/// first interior intersection, `A8` lies at the far end of the board's
/// y axis, and `H1` at the far end of its x axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceCorner {
    A1,
    A8,
    H1,
}

impl ReferenceCorner {
    pub const ALL: [ReferenceCorner; 3] = [Self::A1, Self::A8, Self::H1];
}

/// Ideal, noise-free description of a square checkerboard target.
///
/// The board frame has its origin at the outer corner of the a1 square,
/// x along the first rank, y along the a-file, and z out of the printed
/// plane. Grid intersections sit at `(i*s, j*s, 0)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoardSpec", into = "BoardSpec")]
pub struct BoardModel {
    square_size: f64,
    squares: u32,
    grid: Vec<Point3<f64>>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct BoardSpec {
    square_size: f64,
    squares: u32,
}

impl Default for BoardModel {
    fn default() -> Self {
        Self::build(DEFAULT_SQUARE_SIZE, DEFAULT_SQUARES)
    }
}

impl BoardModel {
    pub fn new(square_size: f64, squares: u32) -> Result<Self, BoardModelError> {
        if !square_size.is_finite() || square_size <= 0.0 {
            return Err(BoardModelError::InvalidSquareSize(square_size));
        }
        if squares < 3 {
            return Err(BoardModelError::TooFewSquares(squares));
        }
        Ok(Self::build(square_size, squares))
    }

    fn build(square_size: f64, squares: u32) -> Self {
        let inner = 1..squares;
        let grid = inner
            .clone()
            .flat_map(|i| {
                inner
                    .clone()
                    .map(move |j| Point3::new(i as f64 * square_size, j as f64 * square_size, 0.0))
            })
            .collect();
        Self {
            square_size,
            squares,
            grid,
        }
    }

    #[inline]
    pub fn square_size(&self) -> f64 {
        self.square_size
    }

    /// Number of squares along each side.
    #[inline]
    pub fn squares(&self) -> u32 {
        self.squares
    }

    /// Interior grid intersections, `(squares-1)^2` of them.
    #[inline]
    pub fn grid_points(&self) -> &[Point3<f64>] {
        &self.grid
    }

    /// Board-frame coordinate of a reference corner.
    pub fn reference(&self, corner: ReferenceCorner) -> Point3<f64> {
        let near = self.square_size;
        let far = (self.squares - 1) as f64 * self.square_size;
        match corner {
            ReferenceCorner::A1 => Point3::new(near, near, 0.0),
            ReferenceCorner::A8 => Point3::new(near, far, 0.0),
            ReferenceCorner::H1 => Point3::new(far, near, 0.0),
        }
    }

    /// Reference corners in `[A1, A8, H1]` order.
    pub fn reference_corners(&self) -> [Point3<f64>; 3] {
        ReferenceCorner::ALL.map(|c| self.reference(c))
    }

    /// Squared distance from `p` (board frame) to the nearest interior
    /// intersection.
    pub fn nearest_grid_distance_sq(&self, p: &Point3<f64>) -> f64 {
        self.grid
            .iter()
            .map(|g| (g - p).norm_squared())
            .fold(f64::INFINITY, f64::min)
    }

    /// Sum over `points` of the squared distance from the transformed point
    /// to its nearest interior intersection. Lower is better.
    pub fn fit_score(&self, board_from_points: &Isometry3<f64>, points: &[Point3<f64>]) -> f64 {
        points
            .iter()
            .map(|p| self.nearest_grid_distance_sq(&board_from_points.transform_point(p)))
            .sum()
    }
}

impl TryFrom<BoardSpec> for BoardModel {
    type Error = BoardModelError;

    fn try_from(spec: BoardSpec) -> Result<Self, Self::Error> {
        BoardModel::new(spec.square_size, spec.squares)
    }
}

impl From<BoardModel> for BoardSpec {
    fn from(board: BoardModel) -> Self {
        Self {
            square_size: board.square_size,
            squares: board.squares,
        }
    }
}
