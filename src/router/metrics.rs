use crate::llm::error::ProviderError;
use crate::llm::types::{LLMResponse, ProviderId};
use crate::router::pricing;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

/// Running statistics for one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderMetrics {
    pub provider: ProviderId,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Mean latency over successful requests
    pub average_latency_ms: f64,
    pub estimated_cost_usd: f64,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub circuit_open: bool,
}

impl ProviderMetrics {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            input_tokens: 0,
            output_tokens: 0,
            average_latency_ms: 0.0,
            estimated_cost_usd: 0.0,
            last_error: None,
            last_error_at: None,
            circuit_open: false,
        }
    }

    fn record_success(&mut self, response: &LLMResponse) {
        self.total_requests += 1;
        self.successful_requests += 1;
        self.input_tokens += response.usage.input_tokens;
        self.output_tokens += response.usage.output_tokens;

        let n = self.successful_requests as f64;
        let latency_ms = response.latency.as_secs_f64() * 1000.0;
        self.average_latency_ms = (self.average_latency_ms * (n - 1.0) + latency_ms) / n;

        match pricing::estimate_cost(
            &response.model,
            response.usage.input_tokens,
            response.usage.output_tokens,
        ) {
            Some(cost) => self.estimated_cost_usd += cost,
            None => debug!("No price for model {}, skipping cost accrual", response.model),
        }

        self.circuit_open = false;
    }

    fn record_failure(&mut self, error: &ProviderError, circuit_open: bool) {
        self.total_requests += 1;
        self.failed_requests += 1;
        self.last_error = Some(error.message.clone());
        self.last_error_at = Some(Utc::now());
        self.circuit_open = circuit_open;
    }
}

/// One metrics record per provider
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    metrics: DashMap<ProviderId, ProviderMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a provider so it reports zeros before its first request
    pub fn track(&self, provider: ProviderId) {
        self.metrics
            .entry(provider)
            .or_insert_with(|| ProviderMetrics::new(provider));
    }

    pub fn record_success(&self, provider: ProviderId, response: &LLMResponse) {
        self.metrics
            .entry(provider)
            .or_insert_with(|| ProviderMetrics::new(provider))
            .record_success(response);
    }

    pub fn record_failure(&self, provider: ProviderId, error: &ProviderError, circuit_open: bool) {
        self.metrics
            .entry(provider)
            .or_insert_with(|| ProviderMetrics::new(provider))
            .record_failure(error, circuit_open);
    }

    pub fn get(&self, provider: ProviderId) -> Option<ProviderMetrics> {
        self.metrics.get(&provider).map(|entry| entry.clone())
    }

    /// All records, ordered by provider
    pub fn snapshot(&self) -> Vec<ProviderMetrics> {
        let mut all: Vec<ProviderMetrics> = self
            .metrics
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|metrics| metrics.provider);
        all
    }
}
