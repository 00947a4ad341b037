//! Errors raised by the top-level conversation orchestrator.

use hic_error::ErrorExt;
use hic_error::Location;
use hic_error::StatusCode;
use hic_error::stack_trace_debug;
use snafu::Snafu;

/// Errors `ConversationEngine::stream_message` may raise.
#[stack_trace_debug]
#[derive(Snafu)]
#[snafu(visibility(pub(crate)), module)]
pub enum EngineError {
    /// The external history store failed.
    #[snafu(display("history store failed: {message}"))]
    History {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// The external profile store failed.
    #[snafu(display("profile store failed: {message}"))]
    Profile {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    /// Opening a chat session against the chosen model failed.
    #[snafu(display("failed to open chat session: {source}"))]
    Upstream {
        source: hic_upstream::UpstreamError,
        #[snafu(implicit)]
        location: Location,
    },

    /// The function-calling loop raised.
    #[snafu(display("loop failed: {source}"))]
    Loop {
        source: hic_loop::LoopError,
        #[snafu(implicit)]
        location: Location,
    },

    /// The loop (and its one permitted fallback retry) both failed.
    #[snafu(display("request failed after fallback retry: {source}"))]
    ExhaustedFallback {
        source: hic_loop::LoopError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ErrorExt for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::History { .. } | EngineError::Profile { .. } => StatusCode::Internal,
            EngineError::Upstream { source, .. } => source.status_code(),
            EngineError::Loop { source, .. } | EngineError::ExhaustedFallback { source, .. } => {
                source.status_code()
            }
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
