//! Pipeline data model
//!
//! `Task` flows from the parser to the planner, `Step`s from the planner to
//! the executor, and the `ExecutionBatch` from the executor to the synthesizer.
//! None of these outlive a single turn.

use sdk::ToolOutput;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Intent classification of a user request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Search,
    Calculate,
    Weather,
    General,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        TaskType::Search,
        TaskType::Calculate,
        TaskType::Weather,
        TaskType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Search => "search",
            TaskType::Calculate => "calculate",
            TaskType::Weather => "weather",
            TaskType::General => "general",
        }
    }

    /// Strict lookup of the lowercase literal
    pub fn from_literal(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured interpretation of one user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_type: TaskType,
    pub query: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl Task {
    pub fn new(task_type: TaskType, query: impl Into<String>) -> Self {
        Self {
            task_type,
            query: query.into(),
            parameters: Map::new(),
        }
    }
}

/// One planned tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub tool: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl Step {
    pub fn new(tool: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            parameters,
        }
    }
}

/// Result of executing one step: exactly one of `result` or `error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepOutcome {
    Success { step: Step, result: ToolOutput },
    Failure { step: Step, error: String },
}

impl StepOutcome {
    pub fn success(step: Step, result: ToolOutput) -> Self {
        StepOutcome::Success { step, result }
    }

    pub fn failure(step: Step, error: impl Into<String>) -> Self {
        StepOutcome::Failure {
            step,
            error: error.into(),
        }
    }

    pub fn step(&self) -> &Step {
        match self {
            StepOutcome::Success { step, .. } | StepOutcome::Failure { step, .. } => step,
        }
    }

    pub fn result(&self) -> Option<&ToolOutput> {
        match self {
            StepOutcome::Success { result, .. } => Some(result),
            StepOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StepOutcome::Success { .. } => None,
            StepOutcome::Failure { error, .. } => Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Success { .. })
    }
}

/// Ordered outcomes of a plan, one per step, in step order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionBatch {
    #[serde(rename = "results")]
    outcomes: Vec<StepOutcome>,
}

impl ExecutionBatch {
    pub fn new(outcomes: Vec<StepOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_type_literals() {
        assert_eq!(TaskType::from_literal("search"), Some(TaskType::Search));
        assert_eq!(TaskType::from_literal("general"), Some(TaskType::General));
        assert_eq!(TaskType::from_literal("Search"), None);
        assert_eq!(TaskType::from_literal("translate"), None);
        assert_eq!(
            serde_json::to_string(&TaskType::Calculate).unwrap(),
            "\"calculate\""
        );
    }

    #[test]
    fn test_task_parameters_default() {
        let task: Task =
            serde_json::from_str(r#"{"task_type": "weather", "query": "Oslo"}"#).unwrap();
        assert_eq!(task, Task::new(TaskType::Weather, "Oslo"));
    }

    #[test]
    fn test_outcome_serialization_shape() {
        let step = Step::new("calculate", json!({"expression": "5*7"}).as_object().cloned().unwrap());
        let mut result = ToolOutput::new();
        result.insert("result".to_string(), json!(35));

        let batch = ExecutionBatch::new(vec![
            StepOutcome::success(step.clone(), result),
            StepOutcome::failure(Step::new("teleport", Map::new()), "Tool 'teleport' not found"),
        ]);

        let value = serde_json::to_value(&batch).unwrap();
        assert_eq!(
            value,
            json!({
                "results": [
                    {"step": {"tool": "calculate", "parameters": {"expression": "5*7"}}, "result": {"result": 35}},
                    {"step": {"tool": "teleport", "parameters": {}}, "error": "Tool 'teleport' not found"}
                ]
            })
        );
        assert_eq!(batch.failure_count(), 1);
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = StepOutcome::failure(Step::new("x", Map::new()), "boom");
        assert!(!outcome.is_success());
        assert_eq!(outcome.error(), Some("boom"));
        assert!(outcome.result().is_none());
        assert_eq!(outcome.step().tool, "x");
    }
}
