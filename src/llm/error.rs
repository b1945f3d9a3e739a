//! Failure values shared by adapters and the router.
//!
//! There are two kinds a caller ever sees: a [`ProviderError`] for one failed
//! attempt, and an [`AggregateFailure`] once every candidate in a chain has
//! been tried.

use crate::llm::types::{ProviderId, TaskType};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// One failed attempt against one provider
#[derive(Debug, Clone, thiserror::Error)]
#[error("{provider}: {message}{}", .status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
pub struct ProviderError {
    pub provider: ProviderId,
    pub status: Option<u16>,
    pub retryable: bool,
    pub message: String,
    #[source]
    pub cause: Option<Cause>,
}

impl ProviderError {
    pub fn retryable(provider: ProviderId, message: impl Into<String>) -> Self {
        Self {
            provider,
            status: None,
            retryable: true,
            message: message.into(),
            cause: None,
        }
    }

    pub fn fatal(provider: ProviderId, message: impl Into<String>) -> Self {
        Self {
            provider,
            status: None,
            retryable: false,
            message: message.into(),
            cause: None,
        }
    }

    pub fn timeout(provider: ProviderId, after: Duration) -> Self {
        Self::retryable(
            provider,
            format!("request timed out after {}ms", after.as_millis()),
        )
    }

    /// Classify an HTTP status: throttling, conflicts and server faults are transient
    pub fn from_status(provider: ProviderId, status: u16, message: impl Into<String>) -> Self {
        Self {
            provider,
            status: Some(status),
            retryable: is_retryable_status(status),
            message: message.into(),
            cause: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 409 | 425 | 429) || (500..=599).contains(&status)
}

/// Every candidate in a chain failed
#[derive(Debug, Clone)]
pub struct AggregateFailure {
    pub task: TaskType,
    pub errors: Vec<ProviderError>,
}

impl AggregateFailure {
    pub fn new(task: TaskType, errors: Vec<ProviderError>) -> Self {
        Self { task, errors }
    }

    /// Providers in the order they were attempted
    pub fn providers(&self) -> Vec<ProviderId> {
        self.errors.iter().map(|e| e.provider).collect()
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "all providers failed for task '{}' ({} attempted)",
            self.task,
            self.errors.len()
        )?;
        for error in &self.errors {
            write!(f, "; {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Exhausted(#[from] AggregateFailure),
    #[error("Routing configuration error: {0}")]
    Config(String),
}
