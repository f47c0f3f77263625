/// Why a frame pair produced no pose.
///
/// Every variant is local to one frame; nothing carries over to the next.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error(
        "image is {image_width}x{image_height} but cloud is {cloud_width}x{cloud_height}"
    )]
    DimensionMismatch {
        image_width: usize,
        image_height: usize,
        cloud_width: usize,
        cloud_height: usize,
    },
    #[error("no solution: empty corner candidate set (a1={a1}, a8={a8}, h1={h1})")]
    InsufficientCandidates { a1: usize, a8: usize, h1: usize },
    #[error("no solution: none of {triples} corner triples gave a valid fit")]
    NoValidTriple { triples: usize },
}

impl LocateError {
    /// The input was well-formed but the board could not be located.
    pub fn is_no_solution(&self) -> bool {
        matches!(
            self,
            LocateError::InsufficientCandidates { .. } | LocateError::NoValidTriple { .. }
        )
    }
}
