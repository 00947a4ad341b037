//! Errors raised while talking to an upstream model.

use hic_error::ErrorExt;
use hic_error::Location;
use hic_error::StatusCode;
use hic_error::stack_trace_debug;
use snafu::Snafu;

/// Errors a `ChatSession` implementation may raise.
#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum UpstreamError {
    /// The upstream blocked the response for safety reasons.
    #[snafu(display("upstream safety block: {message}"))]
    SafetyBlock {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// The upstream blocked the response as recitation of training data.
    #[snafu(display("upstream recitation block: {message}"))]
    Recitation {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// The upstream was unavailable (connection reset, 5xx, overloaded).
    #[snafu(display("upstream unavailable: {message}"))]
    ServiceUnavailable {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// The request exceeded its wall-clock budget.
    #[snafu(display("upstream call timed out after {elapsed_ms}ms"))]
    Timeout {
        elapsed_ms: u64,
        #[snafu(implicit)]
        location: Location,
    },

    /// Malformed request (bad arguments, unsupported capability).
    #[snafu(display("invalid upstream request: {message}"))]
    InvalidRequest {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// Any other upstream failure not covered above.
    #[snafu(display("upstream error: {message}"))]
    Other {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for UpstreamError {
    fn status_code(&self) -> StatusCode {
        match self {
            UpstreamError::SafetyBlock { .. } => StatusCode::ProviderError,
            UpstreamError::Recitation { .. } => StatusCode::ProviderError,
            UpstreamError::ServiceUnavailable { .. } => StatusCode::ServiceUnavailable,
            UpstreamError::Timeout { .. } => StatusCode::Timeout,
            UpstreamError::InvalidRequest { .. } => StatusCode::InvalidRequest,
            UpstreamError::Other { .. } => StatusCode::External,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Result type for upstream operations.
pub type Result<T> = std::result::Result<T, UpstreamError>;
