//! Step Planner
//!
//! Second pipeline stage: turns a [`Task`] into an ordered list of tool
//! invocations. The prompt lists the registry's tools so the model can only
//! reasonably name what exists; names are not checked here, unknown tools
//! surface later as failed step outcomes.

use crate::llm::{extract_json_array, LLMProvider};
use crate::tools::ToolRegistry;
use sdk::errors::EngineError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::types::{Step, Task};

pub struct StepPlanner {
    llm: Arc<dyn LLMProvider>,
    tools: Arc<ToolRegistry>,
    retries: u32,
}

/// Intermediate deserialization type for LLM JSON output
#[derive(Debug, Deserialize)]
struct RawStep {
    tool: Option<Value>,
    #[serde(default)]
    parameters: Option<Value>,
}

impl StepPlanner {
    pub fn new(llm: Arc<dyn LLMProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            llm,
            tools,
            retries: 0,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Build the planning prompt for a task
    pub fn build_prompt(&self, task: &Task) -> String {
        let task_json = serde_json::to_string(task).unwrap_or_else(|_| task.query.clone());

        format!(
            "Given the following task, plan the steps needed to complete it.\n\n\
            Task: {task_json}\n\n\
            Available tools:\n{catalogue}\n\n\
            Return ONLY a JSON array of steps, no markdown, no explanation. \
            Each step object must have:\n\
            - \"tool\": name of one of the available tools\n\
            - \"parameters\": object with the tool's parameters\n\n\
            Example output:\n\
            [{{\"tool\": \"calculate\", \"parameters\": {{\"expression\": \"2 + 2\"}}}}]\n\n\
            Return [] if no tool is needed.",
            catalogue = self.tools.catalogue()
        )
    }

    /// Produce the ordered step list for `task`
    ///
    /// An empty list is a valid plan.
    pub async fn plan(&self, task: &Task) -> Result<Vec<Step>, EngineError> {
        let base_prompt = self.build_prompt(task);
        let mut prompt = base_prompt.clone();
        let mut attempt = 0;

        loop {
            let output = self.llm.complete(&prompt).await?;

            match Self::decode(&output) {
                Ok(steps) => {
                    debug!(
                        "Planned {} step(s): [{}]",
                        steps.len(),
                        steps
                            .iter()
                            .map(|s| s.tool.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                    return Ok(steps);
                }
                Err(EngineError::MalformedPlan(reason)) if attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        "Malformed plan output ({}), reprompting ({}/{})",
                        reason, attempt, self.retries
                    );
                    prompt = format!(
                        "{base_prompt}\n\nYour previous reply could not be used: {reason}. \
                        Reply with the JSON array only."
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Decode model output into steps
    pub fn decode(output: &str) -> Result<Vec<Step>, EngineError> {
        let json = extract_json_array(output)
            .ok_or_else(|| EngineError::MalformedPlan("no JSON array in output".to_string()))?;

        let raw_steps: Vec<RawStep> = serde_json::from_str(json)
            .map_err(|e| EngineError::MalformedPlan(format!("invalid plan JSON: {}", e)))?;

        raw_steps
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let tool = match raw.tool {
                    Some(Value::String(name)) => name,
                    Some(_) => {
                        return Err(EngineError::MalformedPlan(format!(
                            "step {}: tool must be a string",
                            i + 1
                        )))
                    }
                    None => {
                        return Err(EngineError::MalformedPlan(format!(
                            "step {}: missing tool",
                            i + 1
                        )))
                    }
                };

                let parameters = match raw.parameters {
                    None | Some(Value::Null) => Map::new(),
                    Some(Value::Object(map)) => map,
                    Some(_) => {
                        return Err(EngineError::MalformedPlan(format!(
                            "step {}: parameters must be an object",
                            i + 1
                        )))
                    }
                };

                Ok(Step { tool, parameters })
            })
            .collect()
    }
}
