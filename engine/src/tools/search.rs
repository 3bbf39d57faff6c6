//! Web Search Tool
//!
//! Simulated search backend: returns a canned result for the query without
//! touching the network. The output shape is what a real search backend
//! would be mapped to.

use async_trait::async_trait;
use sdk::{Tool, ToolError, ToolInput, ToolOutput};
use serde_json::json;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SearchTool;

impl SearchTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web for information about a query."
    }

    fn parameters(&self) -> &[&str] {
        &["query"]
    }

    async fn invoke(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let query = input.param_str("query")?;
        debug!("Searching web for: {}", query);

        let mut output = ToolOutput::new();
        output.insert(
            "result".to_string(),
            json!(format!("Simulated search results for: {}", query)),
        );
        output.insert("source".to_string(), json!("web_search_simulation"));
        Ok(output)
    }
}
