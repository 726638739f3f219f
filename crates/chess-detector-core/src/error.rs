use thiserror::Error;

/// Reasons a frame produced no detection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectError {
    #[error("invalid detector parameters: {0}")]
    InvalidParams(&'static str),
    #[error("buffer of {actual} bytes does not hold a {width}x{height} image")]
    BufferSize {
        width: usize,
        height: usize,
        actual: usize,
        /// `None` when `width * height` overflows.
        expected: Option<usize>,
    },
    #[error("image {width}x{height} is too small for a {margin} px suppression margin")]
    ImageTooSmall {
        width: usize,
        height: usize,
        margin: usize,
    },
    #[error("input resolution changed from {expected:?} to {actual:?}")]
    ResolutionChanged {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("weak frame: max response {max_response} does not exceed {required}")]
    WeakFrame { max_response: i32, required: i32 },
    #[error("only {found} features detected, need at least {required}")]
    TooFewFeatures { found: usize, required: usize },
    #[error("response cluster at ({x}, {y}) has zero mass")]
    ZeroMass { x: usize, y: usize },
    #[error("could not allocate a feature list of {capacity} entries")]
    AllocationFailed { capacity: usize },
    #[error("feature list capacity {capacity} exceeded")]
    CapacityExceeded { capacity: usize },
}

impl DetectError {
    /// `true` for internal faults, as opposed to frames that simply lack a target.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::ZeroMass { .. } | Self::AllocationFailed { .. } | Self::CapacityExceeded { .. }
        )
    }
}
