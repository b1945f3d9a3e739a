//! Command line argument parsing
//!
//! This module handles CLI argument parsing with subcommands:
//! - `route`: Send a prompt through the routing chain for a task type
//! - `embed`: Compute embeddings on the embedding provider
//! - `report`: Generate a report on the report service
//! - `health`: Probe every registered provider
//! - `providers`: List registered providers and their effective settings
//! - `metrics`: Show per-provider metrics and circuit states
//! - `routes`: Show the effective routing table
//! - `show-config`: Show configuration discovery information, optionally writing a default user config

use crate::llm::types::{LLMRequest, ReportParams, ResponseFormat, TaskType};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "llm-router")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Route LLM requests across providers with fallbacks, circuit breaking and retries")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Configuration file path (skips discovery)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Print machine-readable JSON instead of text
    #[arg(long = "json", global = true)]
    pub json: bool,
    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Route a prompt through the provider chain for a task type
    Route {
        /// Prompt text
        prompt: String,
        /// Task type (chat, extraction, classification, summarization, analysis, vision, translation)
        #[arg(short = 't', long = "task", default_value = "chat")]
        task: TaskType,
        /// System instruction
        #[arg(short = 's', long = "system")]
        system: Option<String>,
        /// Maximum output tokens
        #[arg(long = "max-tokens")]
        max_tokens: Option<u32>,
        /// Sampling temperature
        #[arg(long = "temperature")]
        temperature: Option<f32>,
        /// Request a JSON object response
        #[arg(long = "json-output")]
        json_output: bool,
        /// Model override for the primary provider
        #[arg(short = 'm', long = "model")]
        model: Option<String>,
    },
    /// Compute embeddings for one or more texts
    Embed {
        /// Texts to embed
        #[arg(required = true)]
        texts: Vec<String>,
        /// Embedding model override
        #[arg(short = 'm', long = "model")]
        model: Option<String>,
    },
    /// Generate a report on the report service
    Report {
        /// Report title
        title: String,
        /// Report body
        #[arg(long = "content", conflicts_with = "content_file")]
        content: Option<String>,
        /// Read the report body from a file
        #[arg(long = "content-file", value_name = "FILE")]
        content_file: Option<PathBuf>,
        /// Output format requested from the service
        #[arg(short = 'f', long = "format", default_value = "pdf")]
        format: String,
    },
    /// Probe every registered provider
    Health,
    /// List registered providers
    Providers,
    /// Show per-provider metrics and circuit states
    Metrics,
    /// Show the effective routing table
    Routes,
    /// Show configuration discovery information
    ShowConfig {
        /// Write a default config file to ~/.llm-router/config.toml if none exists
        #[arg(long = "init")]
        init: bool,
    },
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }
}

impl Commands {
    /// Build the completion request described by a `route` invocation
    pub fn to_request(&self) -> Option<LLMRequest> {
        let Commands::Route {
            prompt,
            task,
            system,
            max_tokens,
            temperature,
            json_output,
            model,
        } = self
        else {
            return None;
        };

        let mut request = LLMRequest::new(*task, prompt.clone());
        if let Some(system) = system {
            request = request.with_system(system.clone());
        }
        if let Some(max_tokens) = max_tokens {
            request = request.with_max_tokens(*max_tokens);
        }
        if let Some(temperature) = temperature {
            request = request.with_temperature(*temperature);
        }
        if *json_output {
            request = request.with_response_format(ResponseFormat::Json);
        }
        if let Some(model) = model {
            request = request.with_model(model.clone());
        }
        Some(request)
    }

    /// Build report parameters, reading the body from disk when asked to
    pub fn to_report_params(&self) -> Result<Option<ReportParams>, String> {
        let Commands::Report {
            title,
            content,
            content_file,
            format,
        } = self
        else {
            return Ok(None);
        };

        let content = match (content, content_file) {
            (Some(content), _) => content.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {:?}: {}", path, e))?,
            (None, None) => {
                return Err("Report body required: pass --content or --content-file".to_string());
            }
        };

        Ok(Some(ReportParams {
            title: title.clone(),
            content,
            format: format.clone(),
            options: Default::default(),
        }))
    }
}
