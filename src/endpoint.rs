//! Service endpoint interface.
//!
//! Endpoints are the external collaborators the engine fans out to. The
//! engine never looks inside them: it reads their supported parameter names
//! and concurrency ceiling at construction, and invokes them per request.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

/// Request parameters: a map from parameter name to opaque value.
///
/// The engine matches on key names only; values are handed to endpoints
/// untouched.
pub type Parameters = HashMap<String, serde_json::Value>;

/// Result type for endpoint operations.
pub type Result<T> = std::result::Result<T, EndpointError>;

/// Errors from endpoint invocations.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Invocation failed: {0}")]
    Failed(String),

    #[error("Invocation cancelled")]
    Cancelled,
}

/// A unit of capability the engine can invoke.
///
/// `invoke` takes `&self` rather than `&mut self`. Endpoints that need to
/// maintain mutable state should use interior mutability (e.g., `RwLock`,
/// `Mutex`).
///
/// # Example
///
/// ```ignore
/// struct InventoryLookup {
///     store: Arc<Store>,
/// }
///
/// #[async_trait]
/// impl ServiceEndpoint<Item> for InventoryLookup {
///     fn name(&self) -> &str { "inventory" }
///     fn supported_parameters(&self) -> HashSet<String> {
///         ["sku".to_string(), "warehouse".to_string()].into()
///     }
///     fn max_concurrent_invocations(&self) -> usize { 4 }
///
///     async fn invoke(&self, parameters: &Parameters) -> Result<Vec<Item>> {
///         self.store.lookup(parameters).await
///     }
/// }
/// ```
#[async_trait]
pub trait ServiceEndpoint<T>: Send + Sync {
    /// Name of this endpoint, used in logs and error reports.
    fn name(&self) -> &str;

    /// Parameter names this endpoint accepts.
    ///
    /// Stable for the endpoint's lifetime; read once per dispatch.
    fn supported_parameters(&self) -> HashSet<String>;

    /// Upper bound on concurrent invocations of this endpoint.
    ///
    /// Read once at manager construction to size the admission guard.
    fn max_concurrent_invocations(&self) -> usize;

    /// Invoke the endpoint with the given parameters.
    ///
    /// May suspend for as long as the backing service takes; the engine
    /// applies no timeout. Returns zero or more result items in the order
    /// the endpoint produced them.
    async fn invoke(&self, parameters: &Parameters) -> Result<Vec<T>>;
}
