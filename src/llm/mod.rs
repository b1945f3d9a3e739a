pub mod error;
pub mod openai_provider;
pub mod provider;
pub mod report_provider;
pub mod types;

pub use error::{AggregateFailure, ProviderError, RouterError};
pub use openai_provider::OpenAICompatibleProvider;
pub use provider::{LLMProvider, ProviderFactory};
pub use report_provider::ReportProvider;
pub use types::*;
