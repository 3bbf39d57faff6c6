//! Agent Pipeline
//!
//! A conversational turn flows through four stages:
//! [`TaskParser`] → [`StepPlanner`] → [`StepExecutor`] → [`ResponseSynthesizer`],
//! composed by [`Agent`], which also owns the [`ConversationHistory`].

pub mod core;
pub mod executor;
pub mod history;
pub mod parser;
pub mod planner;
pub mod synthesizer;
pub mod types;

pub use core::{Agent, AgentBuilder};
pub use executor::StepExecutor;
pub use history::ConversationHistory;
pub use parser::TaskParser;
pub use planner::StepPlanner;
pub use synthesizer::ResponseSynthesizer;
pub use types::{ExecutionBatch, Step, StepOutcome, Task, TaskType};
