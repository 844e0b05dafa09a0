use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};

use super::base::{CompletionStream, Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::stream::{LineBuffer, StreamParser};
use super::utils::{messages_to_openai_spec, response_to_message, tools_to_openai_spec};
use crate::errors::ProviderError;
use crate::models::message::Message;
use crate::models::tool::Tool;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(OpenAiProviderConfig::from_env()?)
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        )
    }

    fn build_payload(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
        stream: bool,
    ) -> Result<Value, ProviderError> {
        if messages.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "conversation must contain at least one message".to_string(),
            ));
        }

        // System message goes first, then the conversation
        let mut messages_array = vec![json!({
            "role": "system",
            "content": system
        })];
        messages_array.extend(messages_to_openai_spec(messages));

        let mut body = serde_json::Map::new();
        body.insert("model".to_string(), json!(self.config.model));
        body.insert("messages".to_string(), json!(messages_array));

        if !tools.is_empty() {
            body.insert("tools".to_string(), json!(tools_to_openai_spec(tools)?));
        }
        if let Some(temperature) = self.config.temperature {
            body.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = self.config.max_tokens {
            body.insert("max_tokens".to_string(), json!(max_tokens));
        }
        if stream {
            body.insert("stream".to_string(), json!(true));
        }

        Ok(Value::Object(body))
    }

    fn get_usage(response: &Value) -> Usage {
        let as_i32 = |key: &str| {
            response
                .get("usage")
                .and_then(|usage| usage.get(key))
                .and_then(|v| v.as_i64())
                .map(|v| v as i32)
        };
        Usage::new(
            as_i32("prompt_tokens"),
            as_i32("completion_tokens"),
            as_i32("total_tokens"),
        )
    }

    async fn post(&self, payload: Value) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: Value = response.json().await?;
                if let Some(error) = body.get("error") {
                    return Err(ProviderError::Api {
                        status: StatusCode::OK.as_u16(),
                        message: error.to_string(),
                    });
                }
                Ok(body)
            }
            status => Err(ProviderError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<(Message, Usage), ProviderError> {
        let payload = self.build_payload(system, messages, tools, false)?;
        let response = self.post(payload).await?;

        let message = response_to_message(&response)?;
        let usage = Self::get_usage(&response);

        Ok((message, usage))
    }

    async fn complete_stream(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<CompletionStream, ProviderError> {
        let payload = self.build_payload(system, messages, tools, true)?;

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.bytes_stream();
        let stream = async_stream::try_stream! {
            futures::pin_mut!(body);

            let mut parser = StreamParser::new();
            let mut buffer = LineBuffer::new();

            // Chunk boundaries can split a multibyte character, so the
            // buffer holds raw bytes and decodes whole lines only.
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                buffer.extend(&chunk);

                while let Some(line) = buffer.next_line() {
                    for delta in parser.feed(&line)? {
                        yield delta;
                    }
                }
            }

            // Trailing line without a newline, then flush any pending calls
            // if the body ended without a [DONE] marker.
            if let Some(line) = buffer.take_remainder() {
                for delta in parser.feed(&line)? {
                    yield delta;
                }
            }
            if !parser.is_finished() {
                for delta in parser.finish() {
                    yield delta;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::base::StreamDelta;
    use futures::TryStreamExt;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(host: String) -> OpenAiProviderConfig {
        OpenAiProviderConfig::new(host, "test_api_key".to_string(), "gpt-4o-mini".to_string())
    }

    async fn setup_mock_server(response_body: Value) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(test_config(mock_server.uri())).unwrap();
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_complete_basic() {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello! How can I assist you today?",
                    "tool_calls": null
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        });

        let (_server, provider) = setup_mock_server(response_body).await;

        let messages = vec![Message::user().with_text("Hello?")];
        let (message, usage) = provider
            .complete("You are a helpful assistant.", &messages, &[])
            .await
            .unwrap();

        assert_eq!(message.text(), "Hello! How can I assist you today?");
        assert_eq!(usage.input_tokens, Some(12));
        assert_eq!(usage.output_tokens, Some(15));
        assert_eq!(usage.total_tokens, Some(27));
    }

    #[tokio::test]
    async fn test_complete_tool_request() {
        let response_body = json!({
            "id": "chatcmpl-tool",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "get_weather",
                            "arguments": "{\"location\":\"San Francisco, CA\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {
                "prompt_tokens": 20,
                "completion_tokens": 15,
                "total_tokens": 35
            }
        });

        let (_server, provider) = setup_mock_server(response_body).await;

        let messages = vec![Message::user().with_text("What's the weather in San Francisco?")];
        let tool = Tool::new(
            "get_weather",
            "Gets the current weather for a location",
            json!({
                "type": "object",
                "properties": {
                    "location": {"type": "string"}
                },
                "required": ["location"]
            }),
        );

        let (message, _usage) = provider
            .complete("You are a helpful assistant.", &messages, &[tool])
            .await
            .unwrap();

        let requests = message.tool_requests();
        assert_eq!(requests.len(), 1);
        let call = requests[0].tool_call.as_ref().unwrap();
        assert_eq!(call.name, "get_weather");
        assert_eq!(call.arguments, json!({"location": "San Francisco, CA"}));
    }

    #[tokio::test]
    async fn test_complete_empty_conversation_rejected() {
        let provider =
            OpenAiProvider::new(test_config("http://localhost:9".to_string())).unwrap();
        let result = provider.complete("system", &[], &[]).await;
        assert!(matches!(result, Err(ProviderError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_complete_server_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(test_config(mock_server.uri())).unwrap();
        let messages = vec![Message::user().with_text("Hello?")];
        let result = provider.complete("system", &messages, &[]).await;

        match result {
            Err(ProviderError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_stream_text() {
        let sse = concat!(
            "data: {\"choices\": [{\"delta\": {\"content\": \"Hel\"}}]}\n\n",
            "data: {\"choices\": [{\"delta\": {\"content\": \"lo!\"}}]}\n\n",
            "data: {\"choices\": [{\"finish_reason\": \"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(test_config(mock_server.uri())).unwrap();
        let messages = vec![Message::user().with_text("Hello?")];
        let stream = provider
            .complete_stream("system", &messages, &[])
            .await
            .unwrap();

        let deltas: Vec<StreamDelta> = stream.try_collect().await.unwrap();
        assert_eq!(
            deltas,
            vec![
                StreamDelta::Text("Hel".to_string()),
                StreamDelta::Text("lo!".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_complete_stream_non_ascii_text() {
        let sse = concat!(
            "data: {\"choices\": [{\"delta\": {\"content\": \"café ☕\"}}]}\n\n",
            "data: [DONE]\n\n",
        );

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(test_config(mock_server.uri())).unwrap();
        let messages = vec![Message::user().with_text("Coffee?")];
        let stream = provider
            .complete_stream("system", &messages, &[])
            .await
            .unwrap();

        let deltas: Vec<StreamDelta> = stream.try_collect().await.unwrap();
        assert_eq!(deltas, vec![StreamDelta::Text("café ☕".to_string())]);
    }

    #[tokio::test]
    async fn test_complete_stream_tool_call_after_text() {
        let sse = concat!(
            "data: {\"choices\": [{\"delta\": {\"content\": \"checking\"}}]}\n\n",
            "data: {\"choices\": [{\"delta\": {\"tool_calls\": [{\"index\": 0, \"id\": \"call_1\", \"function\": {\"name\": \"echo\", \"arguments\": \"{\\\"message\\\"\"}}]}}]}\n\n",
            "data: {\"choices\": [{\"delta\": {\"tool_calls\": [{\"index\": 0, \"function\": {\"arguments\": \": \\\"hi\\\"}\"}}]}}]}\n\n",
            "data: {\"choices\": [{\"finish_reason\": \"tool_calls\"}]}\n\n",
            "data: [DONE]\n\n",
        );

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(test_config(mock_server.uri())).unwrap();
        let messages = vec![Message::user().with_text("Echo hi")];
        let stream = provider
            .complete_stream("system", &messages, &[])
            .await
            .unwrap();

        let deltas: Vec<StreamDelta> = stream.try_collect().await.unwrap();
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0], StreamDelta::Text("checking".to_string()));
        match &deltas[1] {
            StreamDelta::ToolCall { id, call } => {
                assert_eq!(id, "call_1");
                let call = call.as_ref().unwrap();
                assert_eq!(call.name, "echo");
                assert_eq!(call.arguments, json!({"message": "hi"}));
            }
            other => panic!("expected tool call, got {:?}", other),
        }
    }
}
