//! Tool trait
//!
//! Every capability the agent can dispatch implements [`Tool`]. The registry
//! owns tools as `Arc<dyn Tool>` and the executor only ever sees this trait,
//! so built-in and custom tools are interchangeable.

use async_trait::async_trait;

use crate::types::{ToolError, ToolInput, ToolOutput};

/// Trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the planner uses to address this tool
    fn name(&self) -> &str;

    /// One-line description advertised to the planner
    fn description(&self) -> &str;

    /// Names of the parameters the tool expects
    fn parameters(&self) -> &[&str];

    /// Invoke the tool with keyword parameters
    ///
    /// Tools hold no shared mutable state with the agent. Failures are
    /// reported as [`ToolError`] and folded into the execution batch by the
    /// caller; they never abort a turn.
    async fn invoke(&self, input: ToolInput) -> Result<ToolOutput, ToolError>;
}
