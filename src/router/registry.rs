use crate::llm::error::ProviderError;
use crate::llm::provider::{LLMProvider, ProviderFactory};
use crate::llm::types::ProviderId;
use crate::router::config::ProviderConfig;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// A registered adapter together with its settings and concurrency gate
#[derive(Clone)]
pub struct RegisteredProvider {
    pub adapter: Arc<dyn LLMProvider>,
    pub config: ProviderConfig,
    pub permits: Arc<Semaphore>,
}

impl RegisteredProvider {
    pub fn new(adapter: Arc<dyn LLMProvider>, config: ProviderConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        Self {
            adapter,
            config,
            permits,
        }
    }
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("provider", &self.adapter.provider_id())
            .field("config", &self.config)
            .finish()
    }
}

/// Provider identifier to adapter, holding only providers whose credentials are present
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<ProviderId, RegisteredProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build adapters for every enabled provider whose credential lookup yields a value.
    ///
    /// Missing credentials silently leave a provider out.
    pub fn from_credentials<F>(configs: &BTreeMap<ProviderId, ProviderConfig>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut registry = Self::new();

        for (id, config) in configs {
            if !config.enabled {
                debug!("Provider {} disabled by configuration", id);
                continue;
            }

            let Some(api_key) = lookup(id.credential_key()).filter(|key| !key.trim().is_empty())
            else {
                debug!("No credentials for {} ({})", id, id.credential_key());
                continue;
            };

            match ProviderFactory::create_provider(*id, config, api_key) {
                Ok(adapter) => {
                    registry.insert(adapter, config.clone());
                }
                Err(e) => warn!("Failed to initialize provider {}: {}", id, e),
            }
        }

        info!(
            "Registered {} provider(s): {}",
            registry.len(),
            registry
                .ids()
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        registry
    }

    pub fn insert(&mut self, adapter: Arc<dyn LLMProvider>, config: ProviderConfig) {
        let id = adapter.provider_id();
        self.providers
            .insert(id, RegisteredProvider::new(adapter, config));
    }

    pub fn get(&self, id: ProviderId) -> Option<&RegisteredProvider> {
        self.providers.get(&id)
    }

    pub fn require(&self, id: ProviderId) -> Result<&RegisteredProvider, ProviderError> {
        self.get(id)
            .ok_or_else(|| ProviderError::fatal(id, "provider is not configured"))
    }

    pub fn contains(&self, id: ProviderId) -> bool {
        self.providers.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<ProviderId> {
        self.providers.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProviderId, &RegisteredProvider)> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
