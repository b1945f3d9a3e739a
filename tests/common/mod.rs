#![allow(dead_code)]

use futures::future::BoxFuture;
use llm_router::llm::{ReportParams, ReportResult, TokenUsage};
use llm_router::router::ProviderRegistry;
use llm_router::{
    LLMProvider, LLMRequest, LLMResponse, ProviderError, ProviderId, Router, RouterConfig,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// What a scripted completion attempt does
#[derive(Debug, Clone)]
pub enum Outcome {
    Reply(String),
    /// HTTP 503
    Unavailable,
    /// HTTP 400
    Rejected,
    /// Never answers within any sensible timeout
    Hang,
    /// Replies after a delay
    Slow(Duration),
}

#[derive(Debug, Clone, Copy)]
pub enum Health {
    Up,
    Down,
    Panics,
}

/// Scripted in-memory adapter that records every call it receives
pub struct MockProvider {
    id: ProviderId,
    script: Mutex<VecDeque<Outcome>>,
    otherwise: Outcome,
    health: Health,
    calls: AtomicU32,
    in_flight: AtomicU32,
    max_in_flight: AtomicU32,
    requests: Mutex<Vec<(LLMRequest, String)>>,
}

impl MockProvider {
    pub fn new(id: ProviderId, otherwise: Outcome) -> Arc<Self> {
        Self::scripted(id, Vec::new(), otherwise)
    }

    /// Play `script` in order, then repeat `otherwise` forever
    pub fn scripted(id: ProviderId, script: Vec<Outcome>, otherwise: Outcome) -> Arc<Self> {
        Self::build(id, script, otherwise, Health::Up)
    }

    pub fn with_health(id: ProviderId, health: Health) -> Arc<Self> {
        Self::build(id, Vec::new(), Outcome::Reply("ok".to_string()), health)
    }

    pub fn replying(id: ProviderId) -> Arc<Self> {
        Self::new(id, Outcome::Reply(format!("hello from {}", id)))
    }

    fn build(id: ProviderId, script: Vec<Outcome>, otherwise: Outcome, health: Health) -> Arc<Self> {
        Arc::new(Self {
            id,
            script: Mutex::new(script.into()),
            otherwise,
            health,
            calls: AtomicU32::new(0),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> u32 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Models requested, in call order
    pub fn models(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, model)| model.clone())
            .collect()
    }

    pub fn last_request(&self) -> Option<LLMRequest> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|(request, _)| request.clone())
    }

    fn next_outcome(&self) -> Outcome {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.otherwise.clone())
    }

    fn reply(&self, request: &LLMRequest, model: &str, content: String) -> LLMResponse {
        LLMResponse {
            request_id: request.id,
            content,
            provider: self.id,
            model: model.to_string(),
            usage: TokenUsage::new(1_000, 500),
            latency: Duration::ZERO,
            cached: None,
            metadata: HashMap::new(),
        }
    }
}

impl LLMProvider for MockProvider {
    fn complete<'a>(
        &'a self,
        request: &'a LLMRequest,
        model: &'a str,
    ) -> BoxFuture<'a, Result<LLMResponse, ProviderError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .unwrap()
                .push((request.clone(), model.to_string()));

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            let result = match self.next_outcome() {
                Outcome::Reply(content) => Ok(self.reply(request, model, content)),
                Outcome::Unavailable => Err(ProviderError::from_status(
                    self.id,
                    503,
                    "service unavailable",
                )),
                Outcome::Rejected => Err(ProviderError::from_status(self.id, 400, "bad request")),
                Outcome::Hang => {
                    tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                    Ok(self.reply(request, model, "too late".to_string()))
                }
                Outcome::Slow(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(self.reply(request, model, "slow reply".to_string()))
                }
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }

    fn health_check(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            match self.health {
                Health::Up => true,
                Health::Down => false,
                Health::Panics => panic!("health probe exploded"),
            }
        })
    }

    fn embed<'a>(
        &'a self,
        texts: &'a [String],
        _model: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, ProviderError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|text| vec![text.len() as f32; 4]).collect())
        })
    }

    fn generate_report<'a>(
        &'a self,
        params: &'a ReportParams,
    ) -> BoxFuture<'a, Result<ReportResult, ProviderError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.id != ProviderId::ReportService {
                return Err(ProviderError::fatal(self.id, "not a report service"));
            }
            Ok(ReportResult {
                id: Uuid::new_v4().to_string(),
                status: "queued".to_string(),
                url: Some(format!("https://reports.test/{}", params.title)),
                details: serde_json::Value::Null,
            })
        })
    }

    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Router over the given mocks, with provider settings taken from `config`
pub fn router_with(config: RouterConfig, mocks: &[Arc<MockProvider>]) -> Router {
    let configs = config.provider_configs();
    let mut registry = ProviderRegistry::new();
    for mock in mocks {
        let id = mock.provider_id();
        registry.insert(mock.clone(), configs[&id].clone());
    }
    Router::with_providers(config, registry).expect("default routing table is valid")
}

/// Parse an inline TOML config
pub fn config(toml: &str) -> RouterConfig {
    RouterConfig::from_toml_str(toml).expect("test config parses")
}
