//! Routing table: task type to ordered candidate chain.
//!
//! A rule names a primary provider, its fallbacks, and optional default
//! parameters. Defaults only fill gaps in a request; an explicit caller value
//! always wins.

use crate::llm::error::RouterError;
use crate::llm::types::{LLMRequest, MODEL_OVERRIDE_KEY, ProviderId, ResponseFormat, TaskType};
use crate::router::config::RouteSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default parameters a rule contributes to requests that leave them unset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteDefaults {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub response_format: Option<ResponseFormat>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub primary: ProviderId,
    pub fallbacks: Vec<ProviderId>,
    pub defaults: RouteDefaults,
}

impl RoutingRule {
    pub fn new(primary: ProviderId, fallbacks: Vec<ProviderId>) -> Self {
        Self {
            primary,
            fallbacks,
            defaults: RouteDefaults::default(),
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: RouteDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// `[primary, ...fallbacks]`, keeping the first occurrence of any repeat
    pub fn chain(&self) -> Vec<ProviderId> {
        let mut chain = Vec::with_capacity(self.fallbacks.len() + 1);
        for id in std::iter::once(self.primary).chain(self.fallbacks.iter().copied()) {
            if !chain.contains(&id) {
                chain.push(id);
            }
        }
        chain
    }

    /// Fill unset request parameters from this rule's defaults
    pub fn apply_defaults(&self, request: &LLMRequest) -> LLMRequest {
        let mut merged = request.clone();
        if merged.max_tokens.is_none() {
            merged.max_tokens = self.defaults.max_tokens;
        }
        if merged.temperature.is_none() {
            merged.temperature = self.defaults.temperature;
        }
        if merged.response_format.is_none() {
            merged.response_format = self.defaults.response_format;
        }
        if merged.model_override().is_none()
            && let Some(model) = &self.defaults.model
        {
            merged.metadata.insert(
                MODEL_OVERRIDE_KEY.to_string(),
                serde_json::Value::String(model.clone()),
            );
        }
        merged
    }

    fn validate(&self, task: TaskType) -> Result<(), RouterError> {
        if let Some(id) = self.chain().into_iter().find(|id| id.is_report_only()) {
            return Err(RouterError::Config(format!(
                "route '{}' includes report-only provider '{}'",
                task, id
            )));
        }
        Ok(())
    }
}

/// Exactly one rule per task type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingTable {
    rules: BTreeMap<TaskType, RoutingRule>,
}

impl RoutingTable {
    /// Build a table, rejecting one that leaves any task type unrouted
    pub fn new(rules: BTreeMap<TaskType, RoutingRule>) -> Result<Self, RouterError> {
        let table = Self { rules };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), RouterError> {
        for task in TaskType::ALL {
            let rule = self.rules.get(&task).ok_or_else(|| {
                RouterError::Config(format!("no routing rule for task '{}'", task))
            })?;
            rule.validate(task)?;
        }
        Ok(())
    }

    pub fn rule(&self, task: TaskType) -> Result<&RoutingRule, RouterError> {
        self.rules
            .get(&task)
            .ok_or_else(|| RouterError::Config(format!("no routing rule for task '{}'", task)))
    }

    pub fn rules(&self) -> impl Iterator<Item = (&TaskType, &RoutingRule)> {
        self.rules.iter()
    }

    /// Replace one rule's chain, leaving its default parameters untouched
    pub fn override_route(
        &mut self,
        task: TaskType,
        primary: ProviderId,
        fallbacks: Vec<ProviderId>,
    ) -> Result<(), RouterError> {
        let defaults = self
            .rules
            .get(&task)
            .map(|rule| rule.defaults.clone())
            .unwrap_or_default();
        let rule = RoutingRule::new(primary, fallbacks).with_defaults(defaults);
        rule.validate(task)?;
        self.rules.insert(task, rule);
        Ok(())
    }

    /// Layer config-file route settings over this table
    pub fn apply_settings(&mut self, settings: &[RouteSettings]) -> Result<(), RouterError> {
        for entry in settings {
            let mut rule = self.rule(entry.task)?.clone();
            if let Some(primary) = entry.primary {
                rule.primary = primary;
            }
            if let Some(fallbacks) = &entry.fallbacks {
                rule.fallbacks = fallbacks.clone();
            }
            if entry.max_tokens.is_some() {
                rule.defaults.max_tokens = entry.max_tokens;
            }
            if entry.temperature.is_some() {
                rule.defaults.temperature = entry.temperature;
            }
            if entry.response_format.is_some() {
                rule.defaults.response_format = entry.response_format;
            }
            if entry.model.is_some() {
                rule.defaults.model = entry.model.clone();
            }
            rule.validate(entry.task)?;
            self.rules.insert(entry.task, rule);
        }
        Ok(())
    }
}

impl Default for RoutingTable {
    /// Built-in routing used when no configuration overrides it
    fn default() -> Self {
        use ProviderId::*;

        let json = Some(ResponseFormat::Json);
        let rules = [
            (
                TaskType::Chat,
                RoutingRule::new(Anthropic, vec![OpenAi, Gemini]).with_defaults(RouteDefaults {
                    max_tokens: Some(2048),
                    temperature: Some(0.7),
                    ..Default::default()
                }),
            ),
            (
                TaskType::Extraction,
                RoutingRule::new(OpenAi, vec![Anthropic, Gemini]).with_defaults(RouteDefaults {
                    max_tokens: Some(4096),
                    temperature: Some(0.0),
                    response_format: json,
                    model: None,
                }),
            ),
            (
                TaskType::Classification,
                RoutingRule::new(Groq, vec![OpenAi, Mistral]).with_defaults(RouteDefaults {
                    max_tokens: Some(256),
                    temperature: Some(0.0),
                    response_format: json,
                    model: None,
                }),
            ),
            (
                TaskType::Summarization,
                RoutingRule::new(Gemini, vec![Anthropic, OpenAi]).with_defaults(RouteDefaults {
                    max_tokens: Some(1024),
                    temperature: Some(0.3),
                    ..Default::default()
                }),
            ),
            (
                TaskType::Analysis,
                RoutingRule::new(Anthropic, vec![OpenAi, DeepSeek]).with_defaults(RouteDefaults {
                    max_tokens: Some(4096),
                    temperature: Some(0.2),
                    ..Default::default()
                }),
            ),
            (
                TaskType::Vision,
                RoutingRule::new(OpenAi, vec![Gemini, Anthropic]).with_defaults(RouteDefaults {
                    max_tokens: Some(2048),
                    temperature: Some(0.0),
                    model: Some("gpt-4o".to_string()),
                    ..Default::default()
                }),
            ),
            (
                TaskType::Translation,
                RoutingRule::new(DeepSeek, vec![Mistral, OpenAi]).with_defaults(RouteDefaults {
                    temperature: Some(0.2),
                    ..Default::default()
                }),
            ),
        ];

        Self {
            rules: rules.into_iter().collect(),
        }
    }
}
