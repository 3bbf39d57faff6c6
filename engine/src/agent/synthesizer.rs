//! Response Synthesizer
//!
//! Final pipeline stage: turns execution outcomes plus recent conversation
//! into the natural-language reply shown to the user. The model output is
//! used verbatim.

use crate::llm::{LLMProvider, Message};
use sdk::errors::EngineError;
use std::sync::Arc;
use tracing::debug;

use super::types::ExecutionBatch;

pub struct ResponseSynthesizer {
    llm: Arc<dyn LLMProvider>,
}

impl ResponseSynthesizer {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    pub fn build_prompt(batch: &ExecutionBatch, recent: &[Message]) -> String {
        let results = serde_json::to_string_pretty(batch).unwrap_or_else(|_| "{}".to_string());
        let conversation =
            serde_json::to_string_pretty(recent).unwrap_or_else(|_| "[]".to_string());

        format!(
            "Given the following execution results, generate a helpful response for the user.\n\n\
            Results: {results}\n\n\
            Prior conversation:\n{conversation}\n\n\
            If a step failed, explain what went wrong instead of inventing a result."
        )
    }

    /// Generate the reply for one turn
    pub async fn synthesize(
        &self,
        batch: &ExecutionBatch,
        recent: &[Message],
    ) -> Result<String, EngineError> {
        let prompt = Self::build_prompt(batch, recent);
        let reply = self.llm.complete(&prompt).await?;
        debug!("Synthesized reply ({} chars)", reply.len());
        Ok(reply)
    }
}
