//! Agent Core
//!
//! This module composes the four pipeline stages into a single conversational
//! turn:
//!
//! 1. Record the user message in history
//! 2. Parse it into a task (LLM call, stage timeout)
//! 3. Plan tool steps for the task (LLM call, stage timeout)
//! 4. Execute the steps against the tool registry
//! 5. Synthesize the reply from the outcomes and recent history (LLM call, stage timeout)
//! 6. Record the reply in history
//!
//! A turn holds the history lock from step 1 to step 6, so concurrent callers
//! sharing one agent are served one at a time and their exchanges never
//! interleave. A failed turn leaves only the user message behind.

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::config::{AgentConfig, Config};
use crate::llm::openai::OpenAIProvider;
use crate::llm::{LLMProvider, Message};
use crate::secrets::{resolve_api_key, SecretString};
use crate::tools::ToolRegistry;
use sdk::errors::EngineError;

use super::executor::StepExecutor;
use super::history::ConversationHistory;
use super::parser::TaskParser;
use super::planner::StepPlanner;
use super::synthesizer::ResponseSynthesizer;

/// Conversational agent driving the parse, plan, execute, synthesize pipeline
pub struct Agent {
    parser: TaskParser,
    planner: StepPlanner,
    executor: StepExecutor,
    synthesizer: ResponseSynthesizer,

    /// Registry shared with the planner and executor
    tools: Arc<ToolRegistry>,

    /// Conversation history, locked for the duration of a turn
    history: Mutex<ConversationHistory>,

    config: AgentConfig,

    provider_name: String,

    /// Monotonic turn counter (log correlation only)
    turns: AtomicU64,
}

/// Step-by-step construction of an [`Agent`]
pub struct AgentBuilder {
    config: AgentConfig,
    provider: Option<Arc<dyn LLMProvider>>,
    tools: Option<ToolRegistry>,
}

impl AgentBuilder {
    /// Completion backend used by every language model stage (required)
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Tool registry (defaults to the built-in tools)
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn build(self) -> Result<Agent, EngineError> {
        let provider = self.provider.ok_or_else(|| {
            EngineError::Config("a completion provider is required to build the agent".to_string())
        })?;
        let tools = self.tools.unwrap_or_else(ToolRegistry::with_builtins);
        Agent::new(provider, tools, self.config)
    }
}

impl Agent {
    pub fn builder(config: AgentConfig) -> AgentBuilder {
        AgentBuilder {
            config,
            provider: None,
            tools: None,
        }
    }

    /// Create an agent from its parts
    ///
    /// Fails with `EngineError::Config` if the pipeline limits are invalid.
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        tools: ToolRegistry,
        config: AgentConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let tools = Arc::new(tools);
        let parser = TaskParser::new(llm.clone()).with_retries(config.parse_retries);
        let planner =
            StepPlanner::new(llm.clone(), tools.clone()).with_retries(config.parse_retries);
        let executor = StepExecutor::new(
            tools.clone(),
            config.max_concurrent_tools,
            config.tool_timeout(),
        );
        let synthesizer = ResponseSynthesizer::new(llm.clone());

        debug!(
            "Agent ready: provider={}, tools=[{}]",
            llm.name(),
            tools.names().join(", ")
        );

        Ok(Self {
            parser,
            planner,
            executor,
            synthesizer,
            tools,
            history: Mutex::new(ConversationHistory::from_limit(config.history_limit)),
            provider_name: llm.name().to_string(),
            config,
            turns: AtomicU64::new(0),
        })
    }

    /// Create an agent backed by the OpenAI-compatible provider and the
    /// built-in tools
    ///
    /// `api_key` takes precedence over the environment variable named by
    /// `llm.api_key_env`. A missing key is a fatal configuration error.
    pub fn from_config(config: &Config, api_key: Option<SecretString>) -> Result<Self, EngineError> {
        config.validate()?;

        let api_key = resolve_api_key(api_key, &config.llm.api_key_env)?;
        let provider = OpenAIProvider::new(&config.llm, api_key)?;

        info!(
            "Using model {} at {}",
            config.llm.model, config.llm.base_url
        );

        Self::new(
            Arc::new(provider),
            ToolRegistry::with_builtins(),
            config.agent.clone(),
        )
    }

    /// Run one conversational turn and return the reply
    ///
    /// Stage failures are returned with the [`EngineError`] as root cause.
    /// Tool failures do not fail the turn; they are reported to the
    /// synthesizer as part of the execution results.
    pub async fn chat(&self, message: &str) -> Result<String> {
        let mut history = self.history.lock().await;
        let turn = self.turns.fetch_add(1, Ordering::Relaxed) + 1;
        let start = Instant::now();

        info!("Turn {}: {}", turn, message);
        history.push(Message::user(message));

        let task = self
            .run_stage("parse", self.parser.parse(message))
            .await
            .context("Failed to understand the request")?;

        let steps = self
            .run_stage("plan", self.planner.plan(&task))
            .await
            .context("Failed to plan the request")?;

        let batch = self.executor.execute(steps).await;

        let recent = history.tail(self.config.synthesis_window);
        let reply = self
            .run_stage("synthesize", self.synthesizer.synthesize(&batch, &recent))
            .await
            .context("Failed to generate a response")?;

        history.push(Message::assistant(&reply));

        info!(
            "Turn {} completed in {}ms ({} step(s), {} failed)",
            turn,
            start.elapsed().as_millis(),
            batch.len(),
            batch.failure_count()
        );

        Ok(reply)
    }

    /// Apply the stage timeout to one language model stage
    async fn run_stage<T, F>(&self, stage: &str, fut: F) -> std::result::Result<T, EngineError>
    where
        F: Future<Output = std::result::Result<T, EngineError>>,
    {
        let limit = self.config.stage_timeout();
        let started = Instant::now();

        match timeout(limit, fut).await {
            Ok(Ok(value)) => {
                debug!("Stage {} finished in {}ms", stage, started.elapsed().as_millis());
                Ok(value)
            }
            Ok(Err(e)) => {
                error!("Stage {} failed: {}", stage, e);
                Err(e)
            }
            Err(_) => {
                error!("Stage {} timed out after {}s", stage, limit.as_secs());
                Err(EngineError::LLMTimeout)
            }
        }
    }

    /// Snapshot of the conversation history, oldest first
    pub async fn history(&self) -> Vec<Message> {
        self.history.lock().await.messages()
    }

    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }

    /// Forget the conversation so far
    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn stage_timeout(&self) -> Duration {
        self.config.stage_timeout()
    }
}
