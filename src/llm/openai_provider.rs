//! OpenAI-compatible chat completions adapter.
//!
//! Most hosted providers expose the same `/chat/completions` shape at a
//! compatibility endpoint, so one adapter serves all of them; only the base
//! URL, key, and default model differ.
//!
//! ## Failure classification
//!
//! - HTTP 408/409/425/429 and 5xx: retryable
//! - any other non-success status: fatal
//! - transport timeouts and connection failures: retryable
//! - undecodable response bodies: fatal

use crate::llm::error::ProviderError;
use crate::llm::provider::LLMProvider;
use crate::llm::types::{
    LLMRequest, LLMResponse, MessageRole, ProviderId, ResponseFormat, TokenUsage,
};
use crate::router::config::ProviderConfig;
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

pub struct OpenAICompatibleProvider {
    id: ProviderId,
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl OpenAICompatibleProvider {
    pub fn new(id: ProviderId, config: &ProviderConfig, api_key: String) -> Result<Self, ProviderError> {
        let base_url = parse_base_url(id, &config.base_url)?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("llm-router/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::fatal(id, "failed to build HTTP client").with_cause(e))?;

        Ok(Self {
            id,
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::fatal(self.id, format!("invalid endpoint '{}'", path)).with_cause(e))
    }

    fn build_body(request: &LLMRequest, model: &str) -> Value {
        let mut messages = Vec::new();
        if !request.system.is_empty() {
            messages.push(json!({ "role": "system", "content": request.system }));
        }
        for message in &request.messages {
            let role = match message.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            messages.push(json!({ "role": role, "content": message.content }));
        }

        if request.images.is_empty() {
            messages.push(json!({ "role": "user", "content": request.prompt }));
        } else {
            let mut parts = vec![json!({ "type": "text", "text": request.prompt })];
            parts.extend(request.images.iter().map(|image| {
                json!({ "type": "image_url", "image_url": { "url": image.data_url() } })
            }));
            messages.push(json!({ "role": "user", "content": parts }));
        }

        let mut body = json!({ "model": model, "messages": messages });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        match (&request.schema, request.response_format) {
            (Some(schema), _) => {
                body["response_format"] = json!({
                    "type": "json_schema",
                    "json_schema": { "name": "output", "schema": schema, "strict": true }
                });
            }
            (None, Some(ResponseFormat::Json)) => {
                body["response_format"] = json!({ "type": "json_object" });
            }
            _ => {}
        }
        body
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ProviderError> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(self.id, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                self.id,
                status.as_u16(),
                error_message(&text).unwrap_or_else(|| status.to_string()),
            ));
        }

        response.json::<Value>().await.map_err(|e| {
            ProviderError::fatal(self.id, "failed to decode response body").with_cause(e)
        })
    }
}

impl LLMProvider for OpenAICompatibleProvider {
    fn complete<'a>(
        &'a self,
        request: &'a LLMRequest,
        model: &'a str,
    ) -> BoxFuture<'a, Result<LLMResponse, ProviderError>> {
        Box::pin(async move {
            let started = Instant::now();
            let body = Self::build_body(request, model);
            debug!("Sending {} request to {} using {}", request.task, self.id, model);

            let raw = self.post_json("chat/completions", &body).await?;
            let parsed: ChatCompletion = serde_json::from_value(raw).map_err(|e| {
                ProviderError::fatal(self.id, "unexpected chat completion shape").with_cause(e)
            })?;

            let choice = parsed
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::retryable(self.id, "response contained no choices"))?;

            let usage = parsed
                .usage
                .map(|u| TokenUsage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens.unwrap_or(u.prompt_tokens + u.completion_tokens),
                })
                .unwrap_or_default();

            let mut metadata = HashMap::new();
            if let Some(reason) = choice.finish_reason {
                metadata.insert("finish_reason".to_string(), json!(reason));
            }

            Ok(LLMResponse {
                request_id: request.id,
                content: choice.message.content.unwrap_or_default(),
                provider: self.id,
                model: parsed.model.unwrap_or_else(|| model.to_string()),
                usage,
                latency: started.elapsed(),
                cached: None,
                metadata,
            })
        })
    }

    fn health_check(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            let Ok(url) = self.endpoint("models") else {
                return false;
            };
            match self
                .client
                .get(url)
                .bearer_auth(&self.api_key)
                .timeout(HEALTH_PROBE_TIMEOUT)
                .send()
                .await
            {
                Ok(response) => response.status().is_success(),
                Err(e) => {
                    debug!("Health probe for {} failed: {}", self.id, e);
                    false
                }
            }
        })
    }

    fn embed<'a>(
        &'a self,
        texts: &'a [String],
        model: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, ProviderError>> {
        Box::pin(async move {
            if self.id != ProviderId::EMBEDDING {
                return Err(ProviderError::fatal(
                    self.id,
                    "embeddings are not supported by this provider",
                ));
            }

            let body = json!({
                "model": model.unwrap_or(DEFAULT_EMBEDDING_MODEL),
                "input": texts,
            });
            let raw = self.post_json("embeddings", &body).await?;
            let parsed: EmbeddingResponse = serde_json::from_value(raw).map_err(|e| {
                ProviderError::fatal(self.id, "unexpected embedding response shape").with_cause(e)
            })?;

            let mut data = parsed.data;
            data.sort_by_key(|item| item.index);
            Ok(data.into_iter().map(|item| item.embedding).collect())
        })
    }

    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// `Url::join` drops the last path segment unless the base ends in '/'
pub(crate) fn parse_base_url(id: ProviderId, raw: &str) -> Result<Url, ProviderError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized)
        .map_err(|e| ProviderError::fatal(id, format!("invalid base URL '{}'", raw)).with_cause(e))
}

pub(crate) fn transport_error(id: ProviderId, error: reqwest::Error) -> ProviderError {
    let retryable = error.is_timeout() || error.is_connect() || error.is_request();
    let message = if error.is_timeout() {
        "transport timeout".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        format!("request failed: {}", error)
    };
    let base = if retryable {
        ProviderError::retryable(id, message)
    } else {
        ProviderError::fatal(id, message)
    };
    match error.status() {
        Some(status) => base.with_status(status.as_u16()).with_cause(error),
        None => base.with_cause(error),
    }
}

/// Pull a human-readable message out of an error body, if it has one
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}
