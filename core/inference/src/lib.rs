//! Routing, circuit breaking, token estimation, and fallback classification
//! for the hybrid inference core.

pub mod breaker;
pub mod fallback;
pub mod manager;
pub mod router;
pub mod tokens;

pub use breaker::CircuitBreaker;
pub use breaker::CircuitState;
pub use breaker::CircuitStatus;
pub use fallback::FallbackTrigger;
pub use manager::HybridInferenceManager;
pub use router::ModelRouter;
pub use tokens::TokenCounter;
