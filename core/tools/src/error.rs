//! Errors a `ToolRegistry` implementation may raise.

use hic_error::ErrorExt;
use hic_error::Location;
use hic_error::StatusCode;
use hic_error::stack_trace_debug;
use snafu::Snafu;

/// Errors raised while executing a tool call.
#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum ToolError {
    /// No tool registered under this name.
    #[snafu(display("unknown tool: {name}"))]
    NotFound {
        name: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// The tool itself failed. This never aborts the calling loop: the
    /// loop catches it and surfaces a structured `{status: "error", ...}`
    /// tool response to the model instead.
    #[snafu(display("tool {name} failed: {message}"))]
    ExecutionFailed {
        name: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for ToolError {
    fn status_code(&self) -> StatusCode {
        match self {
            ToolError::NotFound { .. } => StatusCode::InvalidRequest,
            ToolError::ExecutionFailed { .. } => StatusCode::Internal,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::tool_error::*;
    use super::*;

    #[test]
    fn not_found_maps_to_invalid_request() {
        let err: ToolError = NotFoundSnafu { name: "search" }.build();
        assert_eq!(err.status_code(), StatusCode::InvalidRequest);
    }
}
