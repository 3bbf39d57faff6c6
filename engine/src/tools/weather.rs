//! Weather Tool
//!
//! Simulated weather lookup with a fixed report for any location.

use async_trait::async_trait;
use sdk::{Tool, ToolError, ToolInput, ToolOutput};
use serde_json::json;
use tracing::debug;

#[derive(Debug, Default)]
pub struct WeatherTool;

impl WeatherTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a location."
    }

    fn parameters(&self) -> &[&str] {
        &["location"]
    }

    async fn invoke(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let location = input.param_str("location")?;
        if location.trim().is_empty() {
            return Err(ToolError::InvalidParameter {
                name: "location".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        debug!("Looking up weather for: {}", location);

        let mut output = ToolOutput::new();
        output.insert("location".to_string(), json!(location));
        output.insert("temperature".to_string(), json!("72°F"));
        output.insert("conditions".to_string(), json!("Sunny"));
        output.insert("source".to_string(), json!("weather_simulation"));
        Ok(output)
    }
}
