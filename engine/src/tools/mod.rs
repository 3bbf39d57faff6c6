pub mod calculator;
pub mod search;
pub mod weather;

pub use calculator::CalculatorTool;
pub use search::SearchTool;
pub use weather::WeatherTool;

use sdk::Tool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Registry of available tools that can be dispatched by the agent.
///
/// A closed mapping from tool name to capability, populated before the agent
/// is built. The agent only reads from it afterwards.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry with no tools enabled.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in tools
    /// (`search_web`, `calculate`, `get_weather`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(SearchTool::new()));
        registry.register(Arc::new(CalculatorTool::new()));
        registry.register(Arc::new(WeatherTool::new()));
        registry
    }

    /// Register a tool under its own name.
    ///
    /// Returns the tool previously registered under that name, if any.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        let name = tool.name().to_string();
        debug!("Registering tool '{}'", name);
        let previous = self.tools.insert(name.clone(), tool);
        if previous.is_some() {
            warn!("Tool '{}' was already registered and has been replaced", name);
        }
        previous
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Names of all registered tools, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Iterate over registered tools in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Describe the registered tools for the planner prompt.
    pub fn catalogue(&self) -> String {
        if self.tools.is_empty() {
            return "(no tools available)".to_string();
        }

        self.tools
            .values()
            .map(|tool| {
                let params = tool
                    .parameters()
                    .iter()
                    .map(|p| format!("\"{}\"", p))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "- {}: {} Parameters: {{{}}}",
                    tool.name(),
                    tool.description(),
                    params
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
