//! Report-generation-only adapter.
//!
//! This backend renders finished reports; it does not serve completion
//! traffic and is never part of a routing chain.

use crate::llm::error::ProviderError;
use crate::llm::openai_provider::{error_message, parse_base_url, transport_error};
use crate::llm::provider::LLMProvider;
use crate::llm::types::{LLMRequest, LLMResponse, ProviderId, ReportParams, ReportResult};
use crate::router::config::ProviderConfig;
use futures::future::BoxFuture;
use std::time::Duration;
use tracing::debug;
use url::Url;

const ID: ProviderId = ProviderId::ReportService;

pub struct ReportProvider {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl ReportProvider {
    pub fn new(config: &ProviderConfig, api_key: String) -> Result<Self, ProviderError> {
        let base_url = parse_base_url(ID, &config.base_url)?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("llm-router/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::fatal(ID, "failed to build HTTP client").with_cause(e))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::fatal(ID, format!("invalid endpoint '{}'", path)).with_cause(e))
    }
}

impl LLMProvider for ReportProvider {
    fn complete<'a>(
        &'a self,
        _request: &'a LLMRequest,
        _model: &'a str,
    ) -> BoxFuture<'a, Result<LLMResponse, ProviderError>> {
        Box::pin(async move {
            Err(ProviderError::fatal(
                ID,
                "report service does not serve completion requests",
            ))
        })
    }

    fn health_check(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            let Ok(url) = self.endpoint("health") else {
                return false;
            };
            match self
                .client
                .get(url)
                .bearer_auth(&self.api_key)
                .timeout(Duration::from_secs(5))
                .send()
                .await
            {
                Ok(response) => response.status().is_success(),
                Err(e) => {
                    debug!("Health probe for {} failed: {}", ID, e);
                    false
                }
            }
        })
    }

    fn generate_report<'a>(
        &'a self,
        params: &'a ReportParams,
    ) -> BoxFuture<'a, Result<ReportResult, ProviderError>> {
        Box::pin(async move {
            let url = self.endpoint("reports")?;
            debug!("Requesting '{}' report as {}", params.title, params.format);

            let response = self
                .client
                .post(url)
                .bearer_auth(&self.api_key)
                .json(params)
                .send()
                .await
                .map_err(|e| transport_error(ID, e))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(ProviderError::from_status(
                    ID,
                    status.as_u16(),
                    error_message(&text).unwrap_or_else(|| status.to_string()),
                ));
            }

            response.json::<ReportResult>().await.map_err(|e| {
                ProviderError::fatal(ID, "failed to decode report response").with_cause(e)
            })
        })
    }

    fn provider_id(&self) -> ProviderId {
        ID
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}
