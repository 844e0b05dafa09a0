use std::sync::Arc;

use futures::future::join_all;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::errors::{AgentError, ToolResult};
use crate::models::message::{Message, ToolRequest};
use crate::models::thread::Thread;
use crate::providers::base::{Provider, StreamDelta};
use crate::registry::ToolRegistry;

pub const DEFAULT_MAX_TOOL_TURNS: usize = 8;

/// An agent pairs a completion provider with fixed instructions and a set of
/// registered tools.
///
/// The agent holds no cross-call state: conversation history is passed in by
/// the caller as a [`Thread`] and never mutated, so one agent can serve many
/// concurrent runs.
pub struct Agent {
    name: String,
    instructions: String,
    registry: ToolRegistry,
    provider: Arc<dyn Provider>,
    max_tool_turns: usize,
}

impl Agent {
    pub fn new(provider: Arc<dyn Provider>, instructions: impl Into<String>) -> Self {
        Self {
            name: "agent".to_string(),
            instructions: instructions.into(),
            registry: ToolRegistry::new(),
            provider,
            max_tool_turns: DEFAULT_MAX_TOOL_TURNS,
        }
    }

    /// Name used to tag pipeline events produced by this agent
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Safety limit on tool round trips within a single turn
    pub fn with_max_tool_turns(mut self, max_tool_turns: usize) -> Self {
        self.max_tool_turns = max_tool_turns;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Run one conversation turn to completion and return the final
    /// assistant message.
    ///
    /// Tool requests from the model are dispatched against the registry, the
    /// results appended as a tool-role message, and the conversation
    /// resubmitted, until the model produces plain text. Tool failures are
    /// embedded in the tool response so the model can react; only provider
    /// failures and the round-trip limit abort the turn.
    pub async fn run(&self, thread: &Thread) -> Result<Message, AgentError> {
        if thread.is_empty() {
            return Err(AgentError::EmptyConversation);
        }

        let mut messages = thread.messages().to_vec();
        let mut turns = 0;

        loop {
            let (response, _usage) = self
                .provider
                .complete(&self.instructions, &messages, self.registry.tools())
                .await?;

            let requests: Vec<ToolRequest> =
                response.tool_requests().into_iter().cloned().collect();
            if requests.is_empty() {
                return Ok(response);
            }
            if turns >= self.max_tool_turns {
                // Refuse the round trip before dispatching anything further
                return Err(AgentError::ToolLoopExceeded {
                    limit: self.max_tool_turns,
                });
            }
            turns += 1;

            let outputs = join_all(requests.iter().map(|request| self.dispatch(request))).await;

            let mut tool_message = Message::tool();
            for (request, output) in requests.iter().zip(outputs) {
                tool_message = tool_message.with_tool_response(request.id.clone(), output);
            }

            messages.push(response);
            messages.push(tool_message);
        }
    }

    /// Run one conversation turn, relaying text fragments as they arrive.
    ///
    /// Tool calls are resolved once the underlying stream completes, after
    /// which streaming resumes with the next model turn. The sequence is
    /// finite; dropping it abandons the in-flight request.
    pub async fn run_streaming(
        &self,
        thread: &Thread,
    ) -> Result<BoxStream<'_, Result<String, AgentError>>, AgentError> {
        if thread.is_empty() {
            return Err(AgentError::EmptyConversation);
        }

        let mut messages = thread.messages().to_vec();

        Ok(Box::pin(async_stream::try_stream! {
            let mut turns = 0;

            loop {
                let mut stream = self
                    .provider
                    .complete_stream(&self.instructions, &messages, self.registry.tools())
                    .await?;

                let mut text = String::new();
                let mut requests: Vec<ToolRequest> = Vec::new();

                while let Some(delta) = stream.next().await {
                    match delta? {
                        StreamDelta::Text(fragment) => {
                            text.push_str(&fragment);
                            yield fragment;
                        }
                        StreamDelta::ToolCall { id, call } => {
                            requests.push(ToolRequest { id, tool_call: call });
                        }
                    }
                }
                drop(stream);

                if requests.is_empty() {
                    break;
                }
                if turns >= self.max_tool_turns {
                    Err::<(), _>(AgentError::ToolLoopExceeded {
                        limit: self.max_tool_turns,
                    })?;
                }
                turns += 1;

                let outputs =
                    join_all(requests.iter().map(|request| self.dispatch(request))).await;

                let mut assistant = Message::assistant();
                if !text.is_empty() {
                    assistant = assistant.with_text(text);
                }
                let mut tool_message = Message::tool();
                for (request, output) in requests.iter().zip(outputs) {
                    assistant =
                        assistant.with_tool_request(request.id.clone(), request.tool_call.clone());
                    tool_message = tool_message.with_tool_response(request.id.clone(), output);
                }

                messages.push(assistant);
                messages.push(tool_message);
            }
        }))
    }

    /// Dispatch a single tool request against the registry. A request the
    /// service itself marked malformed short-circuits to its error.
    async fn dispatch(&self, request: &ToolRequest) -> ToolResult<String> {
        let call = request.tool_call.clone()?;
        self.registry.dispatch(&call).await
    }
}
