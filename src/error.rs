use thiserror::Error;

/// Fatal page-processing failures. Each one aborts the current page;
/// there is no partial output.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CropError {
    /// Role sorting did not yield exactly two side and two top/bottom
    /// markers
    #[error("expected 2 side and 2 top/bottom markers, found {sides} and {top_bottom}")]
    MarkerCount { sides: usize, top_bottom: usize },

    /// The inset crop lines crossed or fell outside the image
    #[error("degenerate crop bounds: left {left}, right {right}, top {top}, bottom {bottom}")]
    DegenerateCrop {
        left: i32,
        right: i32,
        top: i32,
        bottom: i32,
    },
}
