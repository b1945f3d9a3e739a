//! Routing, resilience and accounting around the provider adapters.
//!
//! [`Router`] is the entry point. The remaining modules are its parts and
//! are usable on their own: the routing table decides candidate order, the
//! circuit breaker and retry policy decide when to stop calling a provider,
//! and the metrics registry keeps per-provider counters and cost.

pub mod circuit_breaker;
pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod pricing;
pub mod registry;
pub mod retry;
pub mod routing;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerRegistry, CircuitSnapshot, CircuitStatus};
pub use config::{
    CircuitBreakerConfig, ProviderConfig, ProviderSettings, RetrySettings, RouteSettings,
    RouterConfig,
};
pub use metrics::{MetricsRegistry, ProviderMetrics};
pub use orchestrator::Router;
pub use registry::{ProviderRegistry, RegisteredProvider};
pub use retry::RetryPolicy;
pub use routing::{RouteDefaults, RoutingRule, RoutingTable};
