//! # LLM Router
//!
//! A provider-agnostic router for large language model requests. Each request
//! carries a task type; the router picks an ordered chain of providers for
//! that task and walks it until one succeeds, shielding callers from
//! individual provider outages.
//!
//! ## Architecture Overview
//!
//! - **[`llm`]**: Request and response types, the error taxonomy, the
//!   [`LLMProvider`] adapter contract and the HTTP adapters
//! - **[`router`]**: Routing table, circuit breakers, retry with backoff,
//!   timeouts, metrics and cost accounting, composed by [`Router`]
//! - **[`cli`]**: Command-line argument parsing and configuration discovery
//! - **[`env`]**: Credential names, file names and path helpers
//!
//! ## Features
//!
//! ### 🧭 Task Routing
//! - **Per-Task Chains**: Every task type maps to a primary provider and ordered fallbacks
//! - **Route Defaults**: Rules fill unset request parameters such as JSON output mode
//! - **Runtime Overrides**: Chains can be replaced while traffic is flowing
//! - **Safety Net**: Any registered provider is used when a whole chain is unavailable
//!
//! ### 🛡️ Resilience
//! - **Circuit Breakers**: Repeatedly failing providers are skipped until they cool down
//! - **Exponential Backoff**: Transient failures are retried with growing delays
//! - **Timeouts**: Every attempt is raced against its provider's deadline
//! - **Aggregated Failures**: Exhausted chains report every attempted provider's error
//!
//! ### 📊 Accounting
//! - **Per-Provider Metrics**: Request counts, token totals and rolling latency
//! - **Cost Estimates**: Spend derived from a static per-model price table
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llm_router::{LLMRequest, Router, RouterConfig, TaskType};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Providers are registered from *_API_KEY environment variables
//!     let router = Router::new(RouterConfig::default())?;
//!
//!     let request = LLMRequest::new(TaskType::Summarization, "Summarize this changelog ...");
//!     let response = router.route(&request).await?;
//!
//!     println!("{} answered: {}", response.provider, response.content);
//!     Ok(())
//! }
//! ```

/// Provider-agnostic LLM interface.
///
/// Request and response types, provider identifiers, the error taxonomy and
/// the adapters that speak each provider's HTTP API.
pub mod llm;

/// Request routing and resilience.
///
/// Chooses providers per task and wraps every call in circuit breaking,
/// retries, timeouts and metrics.
pub mod router;

/// Environment constants and path utilities.
///
/// Centralizes credential variable names, configuration file names and
/// directory helpers used throughout the application.
pub mod env;

// CLI module for command-line interface
pub mod cli;

// Re-export LLM abstraction types
pub use llm::{
    AggregateFailure, LLMProvider, LLMRequest, LLMResponse, ProviderError, ProviderId,
    RouterError, TaskType,
};

// Re-export router types
pub use router::{ProviderConfig, ProviderMetrics, Router, RouterConfig, RoutingTable};
