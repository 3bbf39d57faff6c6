//! Error types and handling
//!
//! This module provides the error types used throughout the Pilot engine.
//! All errors implement the `PilotErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages never include the backend credential. Backend response
//! bodies are carried verbatim so the operator can diagnose failures, but
//! user hints are static strings.

use thiserror::Error;

/// Trait for Pilot error extensions
pub trait PilotErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors affect a single turn; the agent can keep serving
    /// further messages. Non-recoverable errors prevent the agent from being
    /// built at all.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: missing credential, invalid settings
/// - **Backend**: the language model call did not succeed
/// - **Model output**: parse or plan output did not match the expected structure
/// - **Tools**: unknown tool names (recorded in the batch, never thrown by the executor)
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, PilotErrorExt};
///
/// let error = EngineError::MalformedTask("missing task_type".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::Config("missing API key".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Backend errors
    #[error("Backend returned status {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("LLM call timed out")]
    LLMTimeout,

    // Model output errors
    #[error("Malformed task: {0}")]
    MalformedTask(String),

    #[error("Malformed plan: {0}")]
    MalformedPlan(String),

    // Tool errors
    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PilotErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml and make sure the API key is set",

            Self::Backend { status, .. } if *status == 401 || *status == 403 => {
                "The language model rejected the credential. Check your API key"
            }
            Self::Backend { status, .. } if *status == 429 => {
                "The language model is rate limiting requests. Wait a moment and try again"
            }
            Self::Backend { .. } => "The language model request failed. Try again",
            Self::LLMProvider(_) => "The language model returned an unexpected response",
            Self::LLMTimeout => "The language model took too long to respond. Try again",

            Self::MalformedTask(_) => "Could not understand the request. Try rephrasing it",
            Self::MalformedPlan(_) => "Could not plan the request. Try rephrasing it",

            Self::ToolNotFound(_) => "The requested tool is not available",

            Self::Network(_) => "Network operation failed. Check your connection",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_not_found_display() {
        let err = EngineError::ToolNotFound("teleport".to_string());
        assert_eq!(err.to_string(), "Tool 'teleport' not found");
    }

    #[test]
    fn test_backend_display() {
        let err = EngineError::Backend {
            status: 500,
            body: "upstream exploded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Backend returned status 500: upstream exploded"
        );
    }

    #[test]
    fn test_backend_hints_by_status() {
        let auth = EngineError::Backend {
            status: 401,
            body: String::new(),
        };
        assert!(auth.user_hint().contains("API key"));

        let limited = EngineError::Backend {
            status: 429,
            body: String::new(),
        };
        assert!(limited.user_hint().contains("rate limiting"));
    }

    #[test]
    fn test_recoverability() {
        assert!(!EngineError::Config("x".to_string()).is_recoverable());
        assert!(EngineError::LLMTimeout.is_recoverable());
        assert!(EngineError::MalformedPlan("x".to_string()).is_recoverable());
    }
}
