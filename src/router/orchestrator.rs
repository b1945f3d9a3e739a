//! # Request Orchestration
//!
//! [`Router`] is the single entry point for completion traffic. It composes
//! the routing table, provider registry, circuit breakers, retry policy and
//! metrics into one call:
//!
//! ```text
//! route(request)
//!   │
//!   ├─ resolve rule for request.task, fill unset parameters from rule defaults
//!   ├─ chain = [primary, ...fallbacks] ∩ registered ∩ breaker would admit
//!   │     └─ empty? any registered, admissible, general-purpose provider
//!   │
//!   └─ for each candidate, in order:
//!        breaker check (may grant the single half-open trial)
//!        attempt (raced against provider timeout)
//!          ├─ ok   → record success, return immediately
//!          └─ err  → record failure
//!                     └─ retryable and breaker still closed? retry with backoff
//!        on give-up: keep the last error, move to next candidate
//!
//!   chain exhausted → AggregateFailure with one error per attempted provider
//! ```
//!
//! Candidates are tried strictly one at a time. Breaker and metrics state is
//! shared by every in-flight call and guarded per provider.

use crate::env;
use crate::llm::error::{AggregateFailure, ProviderError, RouterError};
use crate::llm::types::{LLMRequest, LLMResponse, ProviderId, ReportParams, ReportResult, TaskType};
use crate::router::circuit_breaker::{CircuitBreakerRegistry, CircuitSnapshot};
use crate::router::config::RouterConfig;
use crate::router::metrics::{MetricsRegistry, ProviderMetrics};
use crate::router::registry::{ProviderRegistry, RegisteredProvider};
use crate::router::retry::RetryPolicy;
use crate::router::routing::{RoutingRule, RoutingTable};
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

pub struct Router {
    config: RouterConfig,
    providers: ProviderRegistry,
    breakers: CircuitBreakerRegistry,
    metrics: MetricsRegistry,
    routes: RwLock<RoutingTable>,
}

impl Router {
    /// Build a router, registering every provider whose credential is set in the environment
    pub fn new(config: RouterConfig) -> Result<Self, RouterError> {
        let providers =
            ProviderRegistry::from_credentials(&config.provider_configs(), env::credential_from_env);
        Self::with_providers(config, providers)
    }

    /// Build a router around an already populated registry
    pub fn with_providers(
        config: RouterConfig,
        providers: ProviderRegistry,
    ) -> Result<Self, RouterError> {
        let mut routes = RoutingTable::default();
        routes.apply_settings(&config.routes)?;
        routes.validate()?;

        let metrics = MetricsRegistry::new();
        for id in providers.ids() {
            metrics.track(id);
        }

        if providers.is_empty() {
            warn!("No providers registered; every route will fail until credentials are configured");
        }

        Ok(Self {
            breakers: CircuitBreakerRegistry::new(config.circuit_breaker.clone()),
            config,
            providers,
            metrics,
            routes: RwLock::new(routes),
        })
    }

    /// Route a completion request through its task's candidate chain
    pub async fn route(&self, request: &LLMRequest) -> Result<LLMResponse, RouterError> {
        let rule = self.routes.read().await.rule(request.task)?.clone();
        let request = rule.apply_defaults(request);
        let deadline = self.config.chain_deadline().map(|budget| Instant::now() + budget);

        let chain = self.candidate_chain(&rule);
        if chain.is_empty() {
            error!("No providers available for task {}", request.task);
            return Err(AggregateFailure::new(
                request.task,
                vec![ProviderError::fatal(rule.primary, "no providers available")],
            )
            .into());
        }

        debug!(
            "Routing {} request {} via [{}]",
            request.task,
            request.id,
            chain.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(" → ")
        );

        let mut errors = Vec::with_capacity(chain.len());

        for (position, id) in chain.iter().copied().enumerate() {
            let Some(entry) = self.providers.get(id) else {
                continue;
            };
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                warn!("Chain deadline exceeded before trying {}", id);
                errors.push(ProviderError::fatal(id, "chain deadline exceeded"));
                break;
            }
            // Grants the half-open trial, so nothing may await between here and dispatch
            if !self.breakers.is_eligible(id) {
                debug!("Skipping {}: circuit not admitting calls", id);
                continue;
            }

            let model = Self::model_for(&rule, &request, entry);
            match self.attempt_with_retries(entry, &request, &model, deadline).await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    if let Some(next) = chain.get(position + 1) {
                        warn!("Provider {} failed ({}), falling back to {}", id, error, next);
                    }
                    errors.push(error);
                }
            }
        }

        error!(
            "All {} candidate(s) failed for task {}",
            errors.len(),
            request.task
        );
        Err(AggregateFailure::new(request.task, errors).into())
    }

    /// Compute embeddings on the designated embedding provider, bypassing routing
    pub async fn embed(
        &self,
        texts: &[String],
        model: Option<&str>,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        let entry = self.providers.require(ProviderId::EMBEDDING)?;
        let budget = entry.config.timeout();
        match tokio::time::timeout(budget, entry.adapter.embed(texts, model)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(ProviderId::EMBEDDING, budget)),
        }
    }

    /// Generate a report on the report-only provider, bypassing routing
    pub async fn generate_report(&self, params: &ReportParams) -> Result<ReportResult, ProviderError> {
        let entry = self.providers.require(ProviderId::REPORTS)?;
        let budget = entry.config.timeout();
        match tokio::time::timeout(budget, entry.adapter.generate_report(params)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(ProviderId::REPORTS, budget)),
        }
    }

    pub fn get_metrics(&self) -> Vec<ProviderMetrics> {
        self.metrics.snapshot()
    }

    pub fn get_available_providers(&self) -> Vec<ProviderId> {
        self.providers.ids()
    }

    /// Probe every registered provider concurrently. A probe that panics or
    /// outlives the provider's timeout counts as unhealthy.
    pub async fn health_check(&self) -> BTreeMap<ProviderId, bool> {
        let probes = self.providers.iter().map(|(id, entry)| {
            let id = *id;
            let adapter = entry.adapter.clone();
            let budget = entry.config.timeout();
            async move {
                let probe = tokio::spawn(async move { adapter.health_check().await });
                let healthy = match tokio::time::timeout(budget, probe).await {
                    Ok(Ok(healthy)) => healthy,
                    Ok(Err(e)) => {
                        warn!("Health probe for {} aborted: {}", id, e);
                        false
                    }
                    Err(_) => {
                        warn!("Health probe for {} timed out", id);
                        false
                    }
                };
                (id, healthy)
            }
        });

        futures::future::join_all(probes).await.into_iter().collect()
    }

    /// Replace one task's candidate chain at runtime; default parameters are kept
    pub async fn override_route(
        &self,
        task: TaskType,
        primary: ProviderId,
        fallbacks: Vec<ProviderId>,
    ) -> Result<(), RouterError> {
        self.routes
            .write()
            .await
            .override_route(task, primary, fallbacks.clone())?;
        info!(
            "Route for {} overridden: {} then [{}]",
            task,
            primary,
            fallbacks.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
        );
        Ok(())
    }

    pub async fn routing_table(&self) -> RoutingTable {
        self.routes.read().await.clone()
    }

    pub fn circuit_states(&self) -> Vec<CircuitSnapshot> {
        self.breakers.snapshot()
    }

    /// Force a provider's breaker closed
    pub fn reset_circuit(&self, provider: ProviderId) {
        self.breakers.reset(provider);
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Rule chain narrowed to registered providers whose breaker would admit a
    /// call, or the safety net. Breaker state is left untouched.
    fn candidate_chain(&self, rule: &RoutingRule) -> Vec<ProviderId> {
        let chain: Vec<ProviderId> = rule
            .chain()
            .into_iter()
            .filter(|id| self.providers.contains(*id) && self.breakers.would_admit(*id))
            .collect();
        if !chain.is_empty() {
            return chain;
        }

        let safety_net: Vec<ProviderId> = self
            .providers
            .ids()
            .into_iter()
            .filter(|id| !id.is_report_only() && self.breakers.would_admit(*id))
            .collect();
        if !safety_net.is_empty() {
            warn!(
                "No configured candidate for primary {} is available, using safety net [{}]",
                rule.primary,
                safety_net.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
            );
        }
        safety_net
    }

    /// Explicit model overrides target the rule's primary; everyone else uses its default
    fn model_for(rule: &RoutingRule, request: &LLMRequest, entry: &RegisteredProvider) -> String {
        match request.model_override() {
            Some(model) if entry.config.id == rule.primary => model.to_string(),
            _ => entry.config.model.clone(),
        }
    }

    /// First attempt plus backoff retries against one provider
    async fn attempt_with_retries(
        &self,
        entry: &RegisteredProvider,
        request: &LLMRequest,
        model: &str,
        deadline: Option<Instant>,
    ) -> Result<LLMResponse, ProviderError> {
        let id = entry.config.id;
        let first_error = match self.attempt(entry, request, model, deadline).await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };
        if !self.should_retry(id, &first_error, deadline) {
            return Err(first_error);
        }

        let policy = RetryPolicy::for_provider(&entry.config, self.config.retry.jitter);
        policy
            .retry(first_error, move |_| async move {
                match self.attempt(entry, request, model, deadline).await {
                    Ok(response) => ControlFlow::Break(Ok(response)),
                    Err(error) if self.should_retry(id, &error, deadline) => {
                        ControlFlow::Continue(error)
                    }
                    Err(error) => ControlFlow::Break(Err(error)),
                }
            })
            .await
    }

    fn should_retry(&self, id: ProviderId, error: &ProviderError, deadline: Option<Instant>) -> bool {
        error.retryable
            && !self.breakers.is_open(id)
            && !deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// One timed attempt; the outcome is recorded before it is returned
    async fn attempt(
        &self,
        entry: &RegisteredProvider,
        request: &LLMRequest,
        model: &str,
        deadline: Option<Instant>,
    ) -> Result<LLMResponse, ProviderError> {
        let id = entry.config.id;
        let mut budget = entry.config.timeout();
        if let Some(deadline) = deadline {
            budget = budget.min(deadline.saturating_duration_since(Instant::now()));
        }

        let started = Instant::now();
        let call = async {
            let _permit = entry
                .permits
                .acquire()
                .await
                .map_err(|_| ProviderError::fatal(id, "provider is shutting down"))?;
            entry.adapter.complete(request, model).await
        };

        // On timeout the call future is dropped, which cancels the in-flight request
        let outcome = match tokio::time::timeout(budget, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} timed out after {:?}", id, budget);
                Err(ProviderError::timeout(id, budget))
            }
        };

        match outcome {
            Ok(mut response) => {
                response.provider = id;
                response.latency = started.elapsed();
                self.breakers.record_success(id);
                self.metrics.record_success(id, &response);
                info!(
                    "{} served {} request {} with {} in {:?} ({} tokens)",
                    id,
                    request.task,
                    request.id,
                    response.model,
                    response.latency,
                    response.usage.total_tokens
                );
                Ok(response)
            }
            Err(error) => {
                let circuit_open = self.breakers.record_failure(id);
                self.metrics.record_failure(id, &error, circuit_open);
                debug!("Attempt against {} failed: {}", id, error);
                Err(error)
            }
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("providers", &self.providers.ids())
            .field("config", &self.config)
            .finish()
    }
}
