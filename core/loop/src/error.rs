//! Errors raised by the function-calling loop.

use hic_error::ErrorExt;
use hic_error::Location;
use hic_error::StatusCode;
use hic_error::stack_trace_debug;
use snafu::Snafu;

/// Errors the loop may raise to its caller.
///
/// Per the propagation policy, the loop never raises for ordinary model
/// behavior (safety blocks, empty rounds are internal round classifications,
/// not errors); these variants cover the cases the spec calls out as
/// genuinely exceptional.
#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum LoopError {
    /// Every round produced zero accumulated text and no function calls.
    #[snafu(display("loop produced no content across all rounds"))]
    EmptyResponse {
        #[snafu(implicit)]
        location: Location,
    },

    /// A round's wall-clock budget expired.
    #[snafu(display("round timed out after {elapsed_ms}ms"))]
    Timeout {
        elapsed_ms: u64,
        #[snafu(implicit)]
        location: Location,
    },

    /// The bound chat session returned an error.
    #[snafu(display("upstream call failed: {source}"))]
    Upstream {
        source: hic_upstream::UpstreamError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for LoopError {
    fn status_code(&self) -> StatusCode {
        match self {
            LoopError::EmptyResponse { .. } => StatusCode::Unknown,
            LoopError::Timeout { .. } => StatusCode::Timeout,
            LoopError::Upstream { source, .. } => source.status_code(),
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Result type for loop operations.
pub type Result<T> = std::result::Result<T, LoopError>;
