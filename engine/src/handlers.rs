//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - chat: Interactive read-eval-print loop over the agent
//! - ask: Single turn, reply printed to stdout
//! - tools: List the tool registry
//!
//! The handlers are thin wrappers; the loop bodies take generic readers and
//! writers so they can be driven from tests.

use anyhow::{Context, Result};
use serde_json::json;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::agent::Agent;
use crate::config::Config;
use crate::secrets::SecretString;
use crate::tools::ToolRegistry;
use sdk::errors::{EngineError, PilotErrorExt};

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// How a chat session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatExit {
    /// The user typed `exit`
    Command,
    /// Input stream closed
    EndOfInput,
    /// Ctrl-C
    Interrupted,
}

/// User-facing hint for a failed turn, if the root cause is an engine error
pub fn error_hint(err: &anyhow::Error) -> Option<&str> {
    err.root_cause()
        .downcast_ref::<EngineError>()
        .map(|e| e.user_hint())
}

fn build_agent(config: &Config, api_key: Option<String>) -> Result<Agent> {
    let agent = Agent::from_config(config, api_key.map(SecretString::from))
        .context("Failed to initialize the agent")?;
    Ok(agent)
}

/// Start an interactive chat session on stdin/stdout
pub async fn handle_chat(config: &Config, api_key: Option<String>, format: OutputFormat) -> Result<()> {
    let agent = build_agent(config, api_key)?;
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    let exit = run_chat_loop(&agent, stdin, &mut stdout, format).await?;
    tracing::debug!("Chat session ended: {:?}", exit);
    Ok(())
}

/// Drive the chat loop until `exit`, end of input, or Ctrl-C
///
/// A failed turn is reported and the loop continues. Ctrl-C is honoured both
/// at the prompt and while a turn is running; an interrupted turn is dropped
/// and records only the user message.
pub async fn run_chat_loop<R, W>(
    agent: &Agent,
    input: R,
    out: &mut W,
    format: OutputFormat,
) -> Result<ChatExit>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    if format == OutputFormat::Text {
        writeln!(out, "Pilot agent ready. Type 'exit' to quit.")?;
        writeln!(out, "----------------------------------------")?;
    }

    loop {
        if format == OutputFormat::Text {
            write!(out, "\nYou: ")?;
            out.flush()?;
        }

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = &mut ctrl_c => return interrupted(out, format),
        };

        let Some(line) = line else {
            if format == OutputFormat::Text {
                writeln!(out)?;
            }
            return Ok(ChatExit::EndOfInput);
        };

        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        if message.eq_ignore_ascii_case("exit") {
            match format {
                OutputFormat::Text => writeln!(out, "\nAgent: Goodbye!")?,
                OutputFormat::Json => writeln!(out, "{}", json!({ "reply": "Goodbye!" }))?,
            }
            return Ok(ChatExit::Command);
        }

        let turn = tokio::select! {
            turn = agent.chat(message) => turn,
            _ = &mut ctrl_c => {
                tracing::info!("Turn cancelled by Ctrl-C");
                return interrupted(out, format);
            }
        };

        match turn {
            Ok(reply) => match format {
                OutputFormat::Text => writeln!(out, "\nAgent: {}", reply)?,
                OutputFormat::Json => writeln!(out, "{}", json!({ "reply": reply }))?,
            },
            Err(e) => {
                tracing::warn!("Turn failed: {:#}", e);
                match format {
                    OutputFormat::Text => {
                        writeln!(out, "\nError: {:#}", e)?;
                        if let Some(hint) = error_hint(&e) {
                            writeln!(out, "Hint: {}", hint)?;
                        }
                    }
                    OutputFormat::Json => {
                        let output = json!({
                            "error": format!("{:#}", e),
                            "hint": error_hint(&e),
                        });
                        writeln!(out, "{}", output)?;
                    }
                }
            }
        }
    }
}

fn interrupted<W: Write>(out: &mut W, format: OutputFormat) -> Result<ChatExit> {
    if format == OutputFormat::Text {
        writeln!(out, "\n\nExiting...")?;
    }
    Ok(ChatExit::Interrupted)
}

/// Run one turn and print the reply
pub async fn handle_ask(
    message: String,
    config: &Config,
    api_key: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let agent = build_agent(config, api_key)?;
    ask(&agent, &message, &mut std::io::stdout(), format).await
}

/// Single-turn body of [`handle_ask`]
///
/// On failure nothing is written and the error is returned to the caller.
pub async fn ask<W: Write>(agent: &Agent, message: &str, out: &mut W, format: OutputFormat) -> Result<()> {
    let reply = agent.chat(message).await?;

    match format {
        OutputFormat::Text => writeln!(out, "{}", reply)?,
        OutputFormat::Json => {
            let output = json!({ "reply": reply });
            writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
        }
    }
    Ok(())
}

/// List the built-in tools
pub async fn handle_tools(format: OutputFormat) -> Result<()> {
    print_tools(&ToolRegistry::with_builtins(), &mut std::io::stdout(), format)
}

pub fn print_tools<W: Write>(registry: &ToolRegistry, out: &mut W, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if registry.is_empty() {
                writeln!(out, "No tools available")?;
                return Ok(());
            }

            writeln!(out, "Available tools ({}):", registry.len())?;
            writeln!(out)?;
            for tool in registry.iter() {
                writeln!(out, "  {}", tool.name())?;
                writeln!(out, "    {}", tool.description())?;
                writeln!(out, "    Parameters: {}", tool.parameters().join(", "))?;
            }
        }
        OutputFormat::Json => {
            let tools: Vec<_> = registry
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name(),
                        "description": tool.description(),
                        "parameters": tool.parameters(),
                    })
                })
                .collect();
            let output = json!({ "tools": tools });
            writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
        }
    }
    Ok(())
}
