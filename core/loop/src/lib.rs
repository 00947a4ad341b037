//! The multi-round function-calling loop and its response buffer.

pub mod buffer;
pub mod driver;
pub mod error;
pub mod state;
pub mod translator;

pub use buffer::Product;
pub use buffer::ResponseBuffer;
pub use buffer::ResponseSnapshot;
pub use driver::FunctionCallingLoop;
pub use error::LoopError;
pub use state::LoopState;
pub use state::RoundOutput;
pub use state::RoundResult;
pub use translator::ThoughtTranslator;

