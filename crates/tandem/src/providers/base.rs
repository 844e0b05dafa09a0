use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::errors::{ProviderError, ToolResult};
use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// An incremental unit of a streamed completion.
///
/// Text arrives as it is generated; a tool call is emitted only once its
/// fragments have been fully accumulated, which for the chat-completion wire
/// format means at the end of the underlying stream. A malformed call is
/// carried as `Err` so the caller can feed the failure back to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamDelta {
    Text(String),
    ToolCall {
        id: String,
        call: ToolResult<ToolCall>,
    },
}

/// A finite, non-restartable sequence of completion deltas. Dropping it
/// abandons the in-flight request (best effort).
pub type CompletionStream = BoxStream<'static, Result<StreamDelta, ProviderError>>;

/// Base trait for completion providers (OpenAI-compatible endpoints, mocks)
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next message for the given conversation.
    ///
    /// The returned message has the assistant role; a request to invoke a
    /// tool surfaces as ToolRequest content, which the caller resolves and
    /// resubmits. The conversation must contain at least one message.
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<(Message, Usage), ProviderError>;

    /// Like [`complete`](Provider::complete), but yields the response
    /// incrementally instead of buffering it.
    async fn complete_stream(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<CompletionStream, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_serialization() {
        let usage = Usage::new(Some(10), Some(20), Some(30));
        let serialized = serde_json::to_string(&usage).unwrap();
        let deserialized: Usage = serde_json::from_str(&serialized).unwrap();

        assert_eq!(usage.input_tokens, deserialized.input_tokens);
        assert_eq!(usage.output_tokens, deserialized.output_tokens);
        assert_eq!(usage.total_tokens, deserialized.total_tokens);
    }
}
