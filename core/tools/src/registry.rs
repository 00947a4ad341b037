//! The external tool-catalog interface the function-calling loop drives.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

/// The product catalog / vector-search tool collection, owned externally.
///
/// The loop relies on exactly two guarantees: (a) `call` returns a
/// JSON-serializable result, and (b) identical `(name, args)` within one
/// request yields identical results, which is what makes the loop's
/// per-request call deduplication sound.
#[async_trait]
pub trait ToolRegistry: Send + Sync + Debug {
    /// Invoke the named tool with the given structured arguments.
    async fn call(&self, name: &str, args: &Value) -> Result<Value>;
}
