//! Pilot SDK
//!
//! Shared contracts for the Pilot engine and the tools it dispatches:
//! the [`Tool`] trait, tool input/output types and the engine error taxonomy.

/// Tool trait
pub mod tool;

/// Error types and handling
pub mod errors;

/// Tool input/output types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, PilotErrorExt};
pub use tool::Tool;
pub use types::{ToolError, ToolInput, ToolOutput};
