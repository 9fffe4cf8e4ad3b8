use thiserror::Error;

/// Errors reported by [`PathSimplifier`](crate::PathSimplifier).
///
/// On error the output buffers are left empty.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimplifyError {
    /// The element tags do not describe a valid path.
    #[error("malformed path at element {index}: {reason}")]
    MalformedPath { index: usize, reason: &'static str },

    /// A transformed coordinate is not finite or does not fit the
    /// fixed-point range.
    #[error("coordinate ({x}, {y}) is outside the supported range")]
    CoordinateOutOfRange { x: f64, y: f64 },

    /// Intersection removal did not converge within the allowed
    /// number of iterations.
    #[error("intersection removal exceeded {limit} iterations")]
    IterationLimitExceeded { limit: usize },
}
