//! LLM Provider Abstraction Layer
//!
//! The pipeline consumes the language model as an opaque text-in/text-out
//! capability. The [`LLMProvider`] trait is that contract; [`openai::OpenAIProvider`]
//! is the HTTP implementation. This module also holds the conversation
//! [`Message`] type and the helpers that pull JSON out of free-form model output.

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod openai;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Backend returned status {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<LLMError> for EngineError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::Backend { status, body } => EngineError::Backend { status, body },
            LLMError::NetworkError(msg) => EngineError::Network(msg),
            LLMError::Timeout => EngineError::LLMTimeout,
            LLMError::ParseError(msg) => EngineError::LLMProvider(msg),
        }
    }
}

/// Message in the conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message
    User,

    /// Assistant message
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// LLM Provider trait that all completion backends implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "openai")
    fn name(&self) -> &str;

    /// Send a prompt and return the generated text verbatim
    ///
    /// One call is one backend request. No retry is performed here.
    ///
    /// # Returns
    /// * `Ok(String)` - Content of the first completion choice
    /// * `Err(LLMError)` - If the request does not succeed
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Extract the first JSON object (`{...}`) from model output.
///
/// See [`extract_json`] for the search policy.
pub fn extract_json_object(content: &str) -> Option<&str> {
    extract_json(content, '{', '}')
}

/// Extract the first JSON array (`[...]`) from model output.
///
/// See [`extract_json`] for the search policy.
pub fn extract_json_array(content: &str) -> Option<&str> {
    extract_json(content, '[', ']')
}

/// Best-effort extraction of the first top-level JSON value delimited by
/// `open`/`close`.
///
/// Handles the output shapes models actually produce:
/// 1. Raw JSON
/// 2. Fenced JSON (with or without surrounding prose)
/// 3. JSON embedded in prose
///
/// The body of the first markdown fence is searched first, then the whole
/// text. Only top-level values are candidates: a balanced `{...}` or `[...]`
/// is skipped as a whole when it is the wrong kind or not valid JSON, so a
/// value nested inside it is never returned. Returns `None` when nothing
/// qualifies.
pub fn extract_json(content: &str, open: char, close: char) -> Option<&str> {
    let trimmed = content.trim();

    if let Some(inner) = extract_fenced_json(trimmed) {
        if let Some(found) = scan_for_json(inner, open, close) {
            return Some(found);
        }
    }

    scan_for_json(trimmed, open, close)
}

fn scan_for_json(s: &str, open: char, close: char) -> Option<&str> {
    let mut pos = 0;
    while let Some(rel) = s[pos..].find(['{', '[']) {
        let start = pos + rel;
        let rest = &s[start..];
        match extract_balanced(rest) {
            Some(candidate) => {
                if candidate.starts_with(open)
                    && candidate.ends_with(close)
                    && serde_json::from_str::<serde_json::Value>(candidate).is_ok()
                {
                    return Some(candidate);
                }
                pos = start + candidate.len();
            }
            // Unterminated: the bracket is prose, keep looking after it
            None => pos = start + 1,
        }
    }
    None
}

/// Extract the body of the first markdown code fence in the text.
///
/// Works even when there is trailing prose after the closing ```.
/// Returns `None` if no fenced block is found.
fn extract_fenced_json(content: &str) -> Option<&str> {
    let fence_start = content.find("```")?;
    let after_opening = &content[fence_start + 3..];

    // Skip the language tag line (e.g. "json\n")
    let body_start_rel = after_opening.find('\n')? + 1;
    let body_start = fence_start + 3 + body_start_rel;

    let closing = content[body_start..].find("```")?;
    let body_end = body_start + closing;

    if body_start >= body_end {
        return None;
    }

    Some(&content[body_start..body_end])
}

/// Extract the balanced `{...}` or `[...]` slice starting at position 0 of `s`.
///
/// Both bracket kinds share one depth counter. String literals and escapes
/// are respected.
fn extract_balanced(s: &str) -> Option<&str> {
    if !s.starts_with(['{', '[']) {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
