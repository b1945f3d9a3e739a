//! Router configuration.
//!
//! Everything here is plain serde data loaded from TOML. Provider and route
//! sections are partial overrides layered onto the built-in defaults, so a
//! config file only needs to mention what it changes.

use crate::llm::types::{ProviderId, ResponseFormat, TaskType};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Per-provider settings, constant for the life of a router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub model: String,
    pub base_url: String,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub timeout_ms: u64,
    pub max_concurrency: usize,
    pub rate_limit_rpm: u32,
    pub enabled: bool,
}

impl ProviderConfig {
    pub fn defaults_for(id: ProviderId) -> Self {
        let timeout_ms = if id.is_report_only() { 120_000 } else { 30_000 };
        Self {
            id,
            model: id.default_model().to_string(),
            base_url: id.default_base_url().to_string(),
            max_retries: 2,
            base_delay_ms: 500,
            timeout_ms,
            max_concurrency: 8,
            rate_limit_rpm: 60,
            enabled: true,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    fn apply(&mut self, settings: &ProviderSettings) {
        if let Some(model) = &settings.model {
            self.model = model.clone();
        }
        if let Some(base_url) = &settings.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(max_retries) = settings.max_retries {
            self.max_retries = max_retries;
        }
        if let Some(base_delay_ms) = settings.base_delay_ms {
            self.base_delay_ms = base_delay_ms;
        }
        if let Some(timeout_ms) = settings.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(max_concurrency) = settings.max_concurrency {
            self.max_concurrency = max_concurrency.max(1);
        }
        if let Some(rate_limit_rpm) = settings.rate_limit_rpm {
            self.rate_limit_rpm = rate_limit_rpm;
        }
        if let Some(enabled) = settings.enabled {
            self.enabled = enabled;
        }
    }
}

/// Partial provider override as written in a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub id: ProviderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_rpm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Partial route override as written in a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSettings {
    pub task: TaskType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<ProviderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallbacks: Option<Vec<ProviderId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the breaker
    pub failure_threshold: u32,
    /// Failures further apart than this restart the count
    pub failure_window_ms: u64,
    /// How long an open breaker rejects traffic before allowing a trial
    pub open_duration_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_window_ms: 60_000,
            open_duration_ms: 30_000,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn failure_window(&self) -> Duration {
        Duration::from_millis(self.failure_window_ms)
    }

    pub fn open_duration(&self) -> Duration {
        Duration::from_millis(self.open_duration_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Spread each backoff delay by up to ±10%
    pub jitter: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Upper bound on a whole fallback chain; unset means per-attempt timeouts only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_deadline_ms: Option<u64>,
    pub circuit_breaker: CircuitBreakerConfig,
    pub retry: RetrySettings,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<ProviderSettings>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteSettings>,
}

impl RouterConfig {
    /// Effective configuration for every provider, defaults overlaid with file settings
    pub fn provider_configs(&self) -> BTreeMap<ProviderId, ProviderConfig> {
        let mut configs: BTreeMap<ProviderId, ProviderConfig> = ProviderId::ALL
            .into_iter()
            .map(|id| (id, ProviderConfig::defaults_for(id)))
            .collect();

        for settings in &self.providers {
            if let Some(config) = configs.get_mut(&settings.id) {
                config.apply(settings);
            }
        }

        configs
    }

    pub fn chain_deadline(&self) -> Option<Duration> {
        self.chain_deadline_ms.map(Duration::from_millis)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
