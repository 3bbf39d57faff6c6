//! Conversation History
//!
//! Ordered record of user and assistant messages exchanged with the agent.
//! Unbounded by default; when a capacity is set the oldest messages are
//! evicted first so the most recent exchanges stay available to the
//! synthesizer.

use crate::llm::Message;
use std::collections::VecDeque;

/// Append-only conversation log with optional ring-buffer capacity
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    /// Messages in chronological order
    messages: VecDeque<Message>,

    /// Maximum number of retained messages (`None` = unbounded)
    capacity: Option<usize>,
}

impl ConversationHistory {
    /// Create an unbounded history
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history that keeps at most `capacity` messages
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    /// Create a history from an optional limit (as found in configuration)
    pub fn from_limit(limit: Option<usize>) -> Self {
        match limit {
            Some(capacity) => Self::with_capacity_limit(capacity),
            None => Self::new(),
        }
    }

    /// Append a message, evicting the oldest one when full
    pub fn push(&mut self, message: Message) {
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            while self.messages.len() >= capacity {
                self.messages.pop_front();
            }
        }
        self.messages.push_back(message);
    }

    /// Snapshot of all retained messages, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// The last `n` messages in chronological order (fewer if not available)
    pub fn tail(&self, n: usize) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
