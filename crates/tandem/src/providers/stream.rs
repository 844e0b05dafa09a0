//! Incremental parser for the chat-completion SSE stream.
//!
//! Text deltas are emitted as they arrive. Tool-call fragments are
//! accumulated per call index and flushed once the stream signals completion,
//! since argument JSON arrives split across chunks.

use serde::Deserialize;

use super::base::StreamDelta;
use super::utils::parse_tool_call;
use crate::errors::ProviderError;

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<DeltaPayload>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeltaPayload {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<DeltaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct DeltaToolCall {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<DeltaFunction>,
}

#[derive(Debug, Deserialize)]
struct DeltaFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Assembles raw network chunks into complete lines.
///
/// A chunk boundary can fall inside a multibyte UTF-8 character, so bytes are
/// buffered as-is and decoded only once a full line is available.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Next complete line, including its newline
    pub fn next_line(&mut self) -> Option<String> {
        let newline = self.bytes.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.bytes.drain(..=newline).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Whatever is left once the body ends without a trailing newline
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.bytes.is_empty() {
            return None;
        }
        let remainder = String::from_utf8_lossy(&self.bytes).into_owned();
        self.bytes.clear();
        Some(remainder)
    }
}

#[derive(Debug, Default)]
pub(crate) struct StreamParser {
    partial: Vec<PartialToolCall>,
    finished: bool,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line of the event stream, returning any deltas it completes.
    pub fn feed(&mut self, line: &str) -> Result<Vec<StreamDelta>, ProviderError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        // Ignore comments and non-data fields
        let Some(data) = trimmed.strip_prefix("data:") else {
            return Ok(Vec::new());
        };
        let data = data.trim_start();

        if data == "[DONE]" {
            return Ok(self.finish());
        }

        let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| {
            ProviderError::MalformedResponse(format!("bad stream chunk: {}", e))
        })?;

        let mut deltas = Vec::new();
        for choice in chunk.choices {
            if let Some(payload) = choice.delta {
                if let Some(content) = payload.content {
                    if !content.is_empty() {
                        deltas.push(StreamDelta::Text(content));
                    }
                }
                if let Some(tool_calls) = payload.tool_calls {
                    for tool_call in tool_calls {
                        self.accumulate(tool_call);
                    }
                }
            }
            if choice.finish_reason.is_some() {
                deltas.extend(self.finish());
            }
        }

        Ok(deltas)
    }

    /// Flush accumulated tool calls. Called for the terminal chunk; safe to
    /// call again when the body ends without a `[DONE]` marker.
    pub fn finish(&mut self) -> Vec<StreamDelta> {
        self.finished = true;
        self.partial
            .drain(..)
            .map(|partial| StreamDelta::ToolCall {
                id: partial.id,
                call: parse_tool_call(&partial.name, &partial.arguments),
            })
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn accumulate(&mut self, tool_call: DeltaToolCall) {
        let index = tool_call.index.unwrap_or(self.partial.len().saturating_sub(1));
        while self.partial.len() <= index {
            self.partial.push(PartialToolCall::default());
        }
        let partial = &mut self.partial[index];

        if let Some(id) = tool_call.id {
            partial.id = id;
        }
        if let Some(function) = tool_call.function {
            if let Some(name) = function.name {
                partial.name = name;
            }
            if let Some(arguments) = function.arguments {
                partial.arguments.push_str(&arguments);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ToolError;
    use serde_json::json;

    #[test]
    fn test_text_delta() {
        let mut parser = StreamParser::new();
        let deltas = parser
            .feed(r#"data: {"choices": [{"delta": {"content": "Hello"}}]}"#)
            .unwrap();
        assert_eq!(deltas, vec![StreamDelta::Text("Hello".to_string())]);
    }

    #[test]
    fn test_blank_and_comment_lines_ignored() {
        let mut parser = StreamParser::new();
        assert!(parser.feed("").unwrap().is_empty());
        assert!(parser.feed(": keep-alive").unwrap().is_empty());
        assert!(parser.feed("event: message").unwrap().is_empty());
    }

    #[test]
    fn test_done_signal_marks_finished() {
        let mut parser = StreamParser::new();
        let deltas = parser.feed("data: [DONE]").unwrap();
        assert!(deltas.is_empty());
        assert!(parser.is_finished());
    }

    #[test]
    fn test_tool_call_accumulated_across_chunks() {
        let mut parser = StreamParser::new();
        parser
            .feed(r#"data: {"choices": [{"delta": {"tool_calls": [{"index": 0, "id": "call_1", "function": {"name": "echo", "arguments": "{\"mess"}}]}}]}"#)
            .unwrap();
        parser
            .feed(r#"data: {"choices": [{"delta": {"tool_calls": [{"index": 0, "function": {"arguments": "age\":\"hi\"}"}}]}}]}"#)
            .unwrap();
        let deltas = parser
            .feed(r#"data: {"choices": [{"finish_reason": "tool_calls"}]}"#)
            .unwrap();

        assert_eq!(deltas.len(), 1);
        match &deltas[0] {
            StreamDelta::ToolCall { id, call } => {
                assert_eq!(id, "call_1");
                let call = call.as_ref().unwrap();
                assert_eq!(call.name, "echo");
                assert_eq!(call.arguments, json!({"message": "hi"}));
            }
            other => panic!("expected tool call, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_arguments_surface_as_call_error() {
        let mut parser = StreamParser::new();
        parser
            .feed(r#"data: {"choices": [{"delta": {"tool_calls": [{"index": 0, "id": "call_1", "function": {"name": "echo", "arguments": "{broken"}}]}}]}"#)
            .unwrap();
        let deltas = parser.feed("data: [DONE]").unwrap();
        assert_eq!(deltas.len(), 1);
        match &deltas[0] {
            StreamDelta::ToolCall { call, .. } => {
                assert!(matches!(call, Err(ToolError::InvalidParameters(_))));
            }
            other => panic!("expected tool call, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_chunk_is_error() {
        let mut parser = StreamParser::new();
        assert!(parser.feed("data: {not json").is_err());
    }

    #[test]
    fn test_multibyte_content_split_across_chunks() {
        let line = "data: {\"choices\": [{\"delta\": {\"content\": \"café\"}}]}\n";
        let bytes = line.as_bytes();
        // Split between the two bytes of the encoded é
        let mid = bytes.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut buffer = LineBuffer::new();
        buffer.extend(&bytes[..mid]);
        assert!(buffer.next_line().is_none());

        buffer.extend(&bytes[mid..]);
        let line = buffer.next_line().unwrap();
        let mut parser = StreamParser::new();
        let deltas = parser.feed(&line).unwrap();
        assert_eq!(deltas, vec![StreamDelta::Text("café".to_string())]);
    }

    #[test]
    fn test_line_buffer_remainder_without_newline() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"data: [DO");
        buffer.extend(b"NE]");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.take_remainder().as_deref(), Some("data: [DONE]"));
        assert!(buffer.take_remainder().is_none());
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut parser = StreamParser::new();
        parser
            .feed(r#"data: {"choices": [{"delta": {"tool_calls": [{"index": 0, "id": "call_1", "function": {"name": "echo", "arguments": "{}"}}]}}]}"#)
            .unwrap();
        assert_eq!(parser.finish().len(), 1);
        assert!(parser.finish().is_empty());
    }
}
