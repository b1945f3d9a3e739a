use crate::env::credentials;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Metadata key that carries an explicit model override on a request
pub const MODEL_OVERRIDE_KEY: &str = "model";

/// Supported LLM providers.
///
/// The set is closed: every variant must be handled by
/// [`ProviderFactory`](crate::llm::provider::ProviderFactory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Gemini,
    Groq,
    Mistral,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "openrouter")]
    OpenRouter,
    ReportService,
}

impl ProviderId {
    pub const ALL: [ProviderId; 8] = [
        ProviderId::OpenAi,
        ProviderId::Anthropic,
        ProviderId::Gemini,
        ProviderId::Groq,
        ProviderId::Mistral,
        ProviderId::DeepSeek,
        ProviderId::OpenRouter,
        ProviderId::ReportService,
    ];

    /// The one provider that serves embedding requests
    pub const EMBEDDING: ProviderId = ProviderId::OpenAi;

    /// The one provider that serves report generation
    pub const REPORTS: ProviderId = ProviderId::ReportService;

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Gemini => "gemini",
            ProviderId::Groq => "groq",
            ProviderId::Mistral => "mistral",
            ProviderId::DeepSeek => "deepseek",
            ProviderId::OpenRouter => "openrouter",
            ProviderId::ReportService => "report_service",
        }
    }

    /// Environment variable that must be non-empty for the provider to be registered
    pub fn credential_key(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => credentials::OPENAI_API_KEY,
            ProviderId::Anthropic => credentials::ANTHROPIC_API_KEY,
            ProviderId::Gemini => credentials::GEMINI_API_KEY,
            ProviderId::Groq => credentials::GROQ_API_KEY,
            ProviderId::Mistral => credentials::MISTRAL_API_KEY,
            ProviderId::DeepSeek => credentials::DEEPSEEK_API_KEY,
            ProviderId::OpenRouter => credentials::OPENROUTER_API_KEY,
            ProviderId::ReportService => credentials::REPORT_SERVICE_API_KEY,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "https://api.openai.com/v1",
            ProviderId::Anthropic => "https://api.anthropic.com/v1",
            ProviderId::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            ProviderId::Groq => "https://api.groq.com/openai/v1",
            ProviderId::Mistral => "https://api.mistral.ai/v1",
            ProviderId::DeepSeek => "https://api.deepseek.com/v1",
            ProviderId::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderId::ReportService => "https://reports.example.invalid/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "gpt-4o-mini",
            ProviderId::Anthropic => "claude-3-5-sonnet-latest",
            ProviderId::Gemini => "gemini-1.5-flash",
            ProviderId::Groq => "llama-3.1-70b-versatile",
            ProviderId::Mistral => "mistral-large-latest",
            ProviderId::DeepSeek => "deepseek-chat",
            ProviderId::OpenRouter => "openai/gpt-4o-mini",
            ProviderId::ReportService => "report-standard",
        }
    }

    /// Report-only providers cannot serve general completion traffic
    pub fn is_report_only(&self) -> bool {
        matches!(self, ProviderId::ReportService)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown provider '{}'", s))
    }
}

/// Kind of work a request represents. Routing rules are keyed on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Chat,
    Extraction,
    Classification,
    Summarization,
    Analysis,
    Vision,
    Translation,
}

impl TaskType {
    pub const ALL: [TaskType; 7] = [
        TaskType::Chat,
        TaskType::Extraction,
        TaskType::Classification,
        TaskType::Summarization,
        TaskType::Analysis,
        TaskType::Vision,
        TaskType::Translation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Chat => "chat",
            TaskType::Extraction => "extraction",
            TaskType::Classification => "classification",
            TaskType::Summarization => "summarization",
            TaskType::Analysis => "analysis",
            TaskType::Vision => "vision",
            TaskType::Translation => "translation",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|task| task.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown task type '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Image passed alongside the user instruction, base64 encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub media_type: String,
    pub data: String,
}

impl ImageAttachment {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Desired output shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// Provider-agnostic completion request.
///
/// Built once by the caller; the router only ever produces merged copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMRequest {
    pub id: Uuid,
    pub task: TaskType,
    pub system: String,
    pub prompt: String,
    pub messages: Vec<ChatMessage>,
    pub images: Vec<ImageAttachment>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub response_format: Option<ResponseFormat>,
    pub schema: Option<serde_json::Value>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LLMRequest {
    pub fn new(task: TaskType, prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task,
            system: String::new(),
            prompt: prompt.into(),
            messages: Vec::new(),
            images: Vec::new(),
            max_tokens: None,
            temperature: None,
            response_format: None,
            schema: None,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    #[must_use]
    pub fn with_history(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.images.push(image);
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = Some(schema);
        self.response_format = Some(ResponseFormat::Json);
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.metadata.insert(
            MODEL_OVERRIDE_KEY.to_string(),
            serde_json::Value::String(model.into()),
        );
        self
    }

    /// Explicit model override carried in the metadata bag
    pub fn model_override(&self) -> Option<&str> {
        self.metadata
            .get(MODEL_OVERRIDE_KEY)
            .and_then(|value| value.as_str())
            .filter(|model| !model.is_empty())
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// Completion produced by exactly one successful attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    pub request_id: Uuid,
    pub content: String,
    pub provider: ProviderId,
    pub model: String,
    pub usage: TokenUsage,
    pub latency: Duration,
    pub cached: Option<bool>,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Parameters for the report-only provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportParams {
    pub title: String,
    pub content: String,
    #[serde(default = "default_report_format")]
    pub format: String,
    #[serde(default)]
    pub options: serde_json::Value,
}

fn default_report_format() -> String {
    "pdf".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResult {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub details: serde_json::Value,
}
