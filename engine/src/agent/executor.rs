//! Step Executor
//!
//! Third pipeline stage. Runs each planned step against the tool registry and
//! records one outcome per step, in plan order. A failing step never aborts
//! the batch: unknown tools, tool errors, timeouts and panics all become
//! failure outcomes.

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use sdk::errors::EngineError;
use sdk::ToolInput;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::types::{ExecutionBatch, Step, StepOutcome};
use crate::tools::ToolRegistry;

pub struct StepExecutor {
    tools: Arc<ToolRegistry>,
    max_concurrent: usize,
    tool_timeout: Duration,
}

impl StepExecutor {
    pub fn new(tools: Arc<ToolRegistry>, max_concurrent: usize, tool_timeout: Duration) -> Self {
        Self {
            tools,
            max_concurrent: max_concurrent.max(1),
            tool_timeout,
        }
    }

    /// Execute all steps and collect their outcomes
    ///
    /// With `max_concurrent > 1` independent steps overlap, but outcomes are
    /// still reported in step order.
    pub async fn execute(&self, steps: Vec<Step>) -> ExecutionBatch {
        let start = Instant::now();
        let count = steps.len();

        let outcomes: Vec<StepOutcome> = if self.max_concurrent == 1 {
            let mut outcomes = Vec::with_capacity(count);
            for step in steps {
                outcomes.push(self.execute_step(step).await);
            }
            outcomes
        } else {
            stream::iter(steps)
                .map(|step| self.execute_step(step))
                .buffered(self.max_concurrent)
                .collect()
                .await
        };

        let batch = ExecutionBatch::new(outcomes);
        debug!(
            "Executed {} step(s) in {}ms ({} failed)",
            count,
            start.elapsed().as_millis(),
            batch.failure_count()
        );
        batch
    }

    async fn execute_step(&self, step: Step) -> StepOutcome {
        let Some(tool) = self.tools.get(&step.tool) else {
            warn!("Plan referenced unknown tool '{}'", step.tool);
            let message = EngineError::ToolNotFound(step.tool.clone()).to_string();
            return StepOutcome::failure(step, message);
        };

        debug!("Invoking tool '{}'", step.tool);
        let input = ToolInput::from(step.parameters.clone());
        let call = AssertUnwindSafe(tool.invoke(input)).catch_unwind();

        match timeout(self.tool_timeout, call).await {
            Ok(Ok(Ok(result))) => StepOutcome::success(step, result),
            Ok(Ok(Err(e))) => {
                debug!("Tool '{}' failed: {}", step.tool, e);
                StepOutcome::failure(step, e.to_string())
            }
            Ok(Err(_)) => {
                warn!("Tool '{}' panicked", step.tool);
                let message = format!("Tool '{}' panicked", step.tool);
                StepOutcome::failure(step, message)
            }
            Err(_) => {
                let message = format!(
                    "Tool '{}' timed out after {:?}",
                    step.tool, self.tool_timeout
                );
                warn!("{}", message);
                StepOutcome::failure(step, message)
            }
        }
    }
}
