//! CLI interface for Pilot
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for talking to the agent.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pilot conversational agent
///
/// Turns free-text requests into tool calls (web search, arithmetic, weather)
/// and answers in natural language using an OpenAI-compatible model.
#[derive(Parser, Debug)]
#[command(name = "pilot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive chat session
    Chat {
        /// API key (overrides the configured environment variable)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },

    /// Ask a single question and print the reply
    Ask {
        /// The message to send
        message: String,

        /// API key (overrides the configured environment variable)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },

    /// List the available tools
    Tools,
}
