use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;

use super::base::{CompletionStream, Provider, StreamDelta, Usage};
use crate::errors::ProviderError;
use crate::models::message::{Message, MessageContent};
use crate::models::tool::Tool;

/// A mock provider that returns pre-configured responses for testing.
///
/// Streaming splits text content into word-sized fragments so relay behavior
/// is observable; tool requests are delivered at the end of the stream, as
/// the real wire format does. A call counter allows tests to assert how many
/// remote calls a run performed.
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Message>>>,
    calls: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of complete/complete_stream calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> Message {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Fall back to an empty response when the script runs out
            Message::assistant().with_text("")
        } else {
            responses.remove(0)
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        _system: &str,
        _messages: &[Message],
        _tools: &[Tool],
    ) -> Result<(Message, Usage), ProviderError> {
        Ok((self.next_response(), Usage::default()))
    }

    async fn complete_stream(
        &self,
        _system: &str,
        _messages: &[Message],
        _tools: &[Tool],
    ) -> Result<CompletionStream, ProviderError> {
        let response = self.next_response();

        let mut deltas = Vec::new();
        let mut tool_calls = Vec::new();
        for content in response.content {
            match content {
                MessageContent::Text(text) => {
                    deltas.extend(
                        text.split_inclusive(' ')
                            .map(|fragment| StreamDelta::Text(fragment.to_string())),
                    );
                }
                MessageContent::ToolRequest(request) => {
                    tool_calls.push(StreamDelta::ToolCall {
                        id: request.id,
                        call: request.tool_call,
                    });
                }
                MessageContent::ToolResponse(_) => {}
            }
        }
        deltas.extend(tool_calls);

        Ok(Box::pin(stream::iter(deltas.into_iter().map(Ok))))
    }
}
