use crate::llm::error::ProviderError;
use crate::llm::openai_provider::OpenAICompatibleProvider;
use crate::llm::report_provider::ReportProvider;
use crate::llm::types::{LLMRequest, LLMResponse, ProviderId, ReportParams, ReportResult};
use crate::router::config::ProviderConfig;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Capability contract every backend adapter satisfies.
///
/// The router never looks past this trait. Adapters classify their own
/// failures as retryable or fatal from the transport's status signal.
pub trait LLMProvider: Send + Sync {
    /// Execute one completion attempt using `model`
    fn complete<'a>(
        &'a self,
        request: &'a LLMRequest,
        model: &'a str,
    ) -> BoxFuture<'a, Result<LLMResponse, ProviderError>>;

    /// Cheap liveness probe. Must not fail; problems are reported as `false`.
    fn health_check(&self) -> BoxFuture<'_, bool>;

    /// Compute embeddings. Only the designated embedding provider implements this.
    fn embed<'a>(
        &'a self,
        _texts: &'a [String],
        _model: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, ProviderError>> {
        let provider = self.provider_id();
        Box::pin(async move {
            Err(ProviderError::fatal(
                provider,
                "embeddings are not supported by this provider",
            ))
        })
    }

    /// Generate a report. Only the report-only provider implements this.
    fn generate_report<'a>(
        &'a self,
        _params: &'a ReportParams,
    ) -> BoxFuture<'a, Result<ReportResult, ProviderError>> {
        let provider = self.provider_id();
        Box::pin(async move {
            Err(ProviderError::fatal(
                provider,
                "report generation is not supported by this provider",
            ))
        })
    }

    fn provider_id(&self) -> ProviderId;

    /// Whether the credentials this adapter needs are configured
    fn is_available(&self) -> bool;
}

/// Factory for creating LLM providers
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_provider(
        id: ProviderId,
        config: &ProviderConfig,
        api_key: String,
    ) -> Result<Arc<dyn LLMProvider>, ProviderError> {
        match id {
            ProviderId::OpenAi
            | ProviderId::Anthropic
            | ProviderId::Gemini
            | ProviderId::Groq
            | ProviderId::Mistral
            | ProviderId::DeepSeek
            | ProviderId::OpenRouter => Ok(Arc::new(OpenAICompatibleProvider::new(
                id, config, api_key,
            )?)),
            ProviderId::ReportService => Ok(Arc::new(ReportProvider::new(config, api_key)?)),
        }
    }
}
