use serde::{Deserialize, Serialize};

use super::message::Message;

/// An ordered, append-only conversation history.
///
/// The thread is owned by the caller: an agent reads it and returns new
/// messages to append, it never mutates a thread it did not create. Starting
/// a fresh conversation is an explicit `Thread::new()` rather than a nullable
/// sentinel, so "forget the history" is visible at the call site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    messages: Vec<Message>,
}

impl Thread {
    /// Start a fresh conversation with no memory of prior turns
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from an existing history
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Append a message. This is the only mutation a thread supports.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
