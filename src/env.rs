//! Environment constants and path utilities for the router.
//!
//! This module centralizes the credential variable names and configuration
//! paths used throughout the application, making them easier to maintain.

use std::path::{Path, PathBuf};

/// Main application directory name (hidden directory like .git, .vscode)
pub const ROUTER_DIR_NAME: &str = ".llm-router";

/// Configuration file name inside the application directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration file name looked up directly in the working directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "llm-router.toml";

/// System-wide configuration file (Unix-like systems)
pub const SYSTEM_CONFIG_FILE_PATH: &str = "/etc/llm-router/config.toml";

/// Default log filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "llm_router=info";

/// Credential variables, one per provider.
///
/// A provider is registered only when its variable holds a non-empty value.
pub mod credentials {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
    pub const MISTRAL_API_KEY: &str = "MISTRAL_API_KEY";
    pub const DEEPSEEK_API_KEY: &str = "DEEPSEEK_API_KEY";
    pub const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
    pub const REPORT_SERVICE_API_KEY: &str = "REPORT_SERVICE_API_KEY";
}

/// Read a credential from the process environment, treating empty values as absent.
pub fn credential_from_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Build the main .llm-router directory path from a base directory
pub fn router_dir_path(base: &Path) -> PathBuf {
    base.join(ROUTER_DIR_NAME)
}

/// Build config directory path in user's home directory
pub fn user_config_dir_path(home_dir: &Path) -> PathBuf {
    router_dir_path(home_dir)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    user_config_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    router_dir_path(current_dir).join(CONFIG_FILE_NAME)
}
