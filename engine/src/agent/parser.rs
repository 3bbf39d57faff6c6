//! Task Parser
//!
//! First pipeline stage: asks the language model to classify a raw user
//! message into a [`Task`]. Model output is decoded leniently (fences and
//! surrounding prose are tolerated) but the task type must be one of the
//! known literals.

use crate::llm::{extract_json_object, LLMProvider};
use sdk::errors::EngineError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::types::{Task, TaskType};

pub struct TaskParser {
    llm: Arc<dyn LLMProvider>,
    retries: u32,
}

/// Intermediate deserialization type for LLM JSON output
#[derive(Debug, Deserialize)]
struct RawTask {
    task_type: Option<Value>,
    query: Option<Value>,
    #[serde(default)]
    parameters: Option<Value>,
}

impl TaskParser {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm, retries: 0 }
    }

    /// Re-ask the model up to `retries` times when its output is malformed
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Build the classification prompt for a user message
    pub fn build_prompt(message: &str) -> String {
        format!(
            "Parse the following user request into a structured task.\n\n\
            User request: {message}\n\n\
            Classify it as one of: \"search\", \"calculate\", \"weather\", \"general\".\n\
            Return ONLY a JSON object with this structure, no markdown, no explanation:\n\
            {{\"task_type\": \"search\" | \"calculate\" | \"weather\" | \"general\", \
            \"query\": \"the main query or question\", \
            \"parameters\": {{}}}}"
        )
    }

    /// Interpret `message` as a structured task
    ///
    /// Backend failures are returned as-is; only malformed output triggers
    /// a reprompt.
    pub async fn parse(&self, message: &str) -> Result<Task, EngineError> {
        let base_prompt = Self::build_prompt(message);
        let mut prompt = base_prompt.clone();
        let mut attempt = 0;

        loop {
            let output = self.llm.complete(&prompt).await?;
            debug!("Parser output ({} chars)", output.len());

            match Self::decode(&output) {
                Ok(task) => {
                    debug!("Parsed task: type={}, query={}", task.task_type, task.query);
                    return Ok(task);
                }
                Err(EngineError::MalformedTask(reason)) if attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        "Malformed task output ({}), reprompting ({}/{})",
                        reason, attempt, self.retries
                    );
                    prompt = format!(
                        "{base_prompt}\n\nYour previous reply could not be used: {reason}. \
                        Reply with the JSON object only."
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Decode model output into a task
    pub fn decode(output: &str) -> Result<Task, EngineError> {
        let json = extract_json_object(output)
            .ok_or_else(|| EngineError::MalformedTask("no JSON object in output".to_string()))?;

        let raw: RawTask = serde_json::from_str(json)
            .map_err(|e| EngineError::MalformedTask(format!("invalid task JSON: {}", e)))?;

        let task_type = match raw.task_type {
            Some(Value::String(s)) => TaskType::from_literal(&s).ok_or_else(|| {
                EngineError::MalformedTask(format!("unknown task_type '{}'", s))
            })?,
            Some(_) => {
                return Err(EngineError::MalformedTask(
                    "task_type must be a string".to_string(),
                ))
            }
            None => return Err(EngineError::MalformedTask("missing task_type".to_string())),
        };

        let query = match raw.query {
            Some(Value::String(s)) => s,
            Some(_) => return Err(EngineError::MalformedTask("query must be a string".to_string())),
            None => return Err(EngineError::MalformedTask("missing query".to_string())),
        };

        let parameters = match raw.parameters {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(EngineError::MalformedTask(
                    "parameters must be an object".to_string(),
                ))
            }
        };

        Ok(Task {
            task_type,
            query,
            parameters,
        })
    }
}
