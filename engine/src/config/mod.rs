//! Configuration management
//!
//! This module handles loading, validation, and management of the Pilot configuration.
//! Configuration is stored in TOML format at ~/.pilot/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **llm**: Completion backend endpoint, model, sampling and timeout
//! - **agent**: Pipeline limits (history bounds, tool concurrency, timeouts, retries)
//!
//! The API key itself is never stored in the file. `llm.api_key_env` names the
//! environment variable it is read from (see [`crate::secrets`]).
//!
//! # Examples
//!
//! ```no_run
//! use pilot_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Model: {}", config.llm.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Completion backend settings
    #[serde(default)]
    pub llm: LLMConfig,

    /// Agent pipeline settings
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Completion backend configuration (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Base URL of the API, without the `/chat/completions` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature (0.0-2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Agent pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Number of recent messages handed to the response synthesizer
    #[serde(default = "default_synthesis_window")]
    pub synthesis_window: usize,

    /// Maximum number of stored history messages (unbounded when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,

    /// Maximum number of tool calls dispatched at once (1 = sequential)
    #[serde(default = "default_max_concurrent_tools")]
    pub max_concurrent_tools: usize,

    /// Per tool invocation timeout in seconds
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Per language model stage timeout in seconds
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,

    /// Extra attempts when the parse or plan output is malformed
    #[serde(default)]
    pub parse_retries: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_synthesis_window() -> usize {
    10
}

fn default_max_concurrent_tools() -> usize {
    1
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_stage_timeout_secs() -> u64 {
    120
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            synthesis_window: default_synthesis_window(),
            history_limit: None,
            max_concurrent_tools: default_max_concurrent_tools(),
            tool_timeout_secs: default_tool_timeout_secs(),
            stage_timeout_secs: default_stage_timeout_secs(),
            parse_retries: 0,
        }
    }
}

impl LLMConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AgentConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    /// Check the pipeline limits
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.synthesis_window == 0 {
            return Err(EngineError::Config(
                "agent.synthesis_window must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_tools == 0 {
            return Err(EngineError::Config(
                "agent.max_concurrent_tools must be at least 1".to_string(),
            ));
        }
        if self.tool_timeout_secs == 0 || self.stage_timeout_secs == 0 {
            return Err(EngineError::Config(
                "agent timeouts must be at least 1 second".to_string(),
            ));
        }
        // A bound below 2 could not hold a single user/assistant exchange
        if let Some(limit) = self.history_limit {
            if limit < 2 {
                return Err(EngineError::Config(
                    "agent.history_limit must be at least 2".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from the default location (~/.pilot/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, EngineError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        let config = Self::default();
        config.save_to_path(path)?;

        Ok(config)
    }

    /// Serialize the configuration to a TOML file, creating parent directories
    pub fn save_to_path(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))
    }

    /// Get the default configuration file path (~/.pilot/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".pilot").join("config.toml"))
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.llm.base_url.trim().is_empty() {
            return Err(EngineError::Config("llm.base_url must not be empty".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(EngineError::Config("llm.model must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(EngineError::Config(
                "llm.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.llm.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.llm.api_key_env.trim().is_empty() {
            return Err(EngineError::Config(
                "llm.api_key_env must name an environment variable".to_string(),
            ));
        }

        self.agent.validate()
    }
}
