//! Fanout - bounded-concurrency fan-out/aggregation engine.
//!
//! Invokes a fixed collection of heterogeneous service endpoints concurrently
//! for a single parameterized request and merges their result items,
//! bounding concurrency both per endpoint (admission guards) and globally
//! (worker pools, shared or per-endpoint).

pub mod config;
pub mod endpoint;
pub mod guard;
pub mod manager;
pub mod pool;
pub mod selector;
pub mod utils;

pub use config::{FanoutConfig, PoolConfig, PoolMode};
pub use endpoint::{EndpointError, Parameters, ServiceEndpoint};
pub use manager::{InvokeError, InvokeOutcome, ServiceManager};
