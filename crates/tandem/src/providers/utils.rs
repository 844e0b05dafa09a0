use serde_json::{json, Value};

use crate::errors::{ProviderError, ToolError};
use crate::models::message::{Message, MessageContent};
use crate::models::tool::{Tool, ToolCall};

/// Convert internal messages to the chat-completion API message list.
///
/// Tool responses become separate tool-role entries keyed by the call id, as
/// the wire format requires; a failed tool result is rendered as text so the
/// model can read the error and react.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        let mut converted = json!({
            "role": message.role
        });

        let mut output = Vec::new();

        for content in &message.content {
            match content {
                MessageContent::Text(text) => {
                    if !text.is_empty() {
                        converted["content"] = json!(text);
                    }
                }
                MessageContent::ToolRequest(request) => match &request.tool_call {
                    Ok(tool_call) => {
                        let tool_calls = converted
                            .as_object_mut()
                            .expect("converted message is always an object")
                            .entry("tool_calls")
                            .or_insert(json!([]));

                        tool_calls
                            .as_array_mut()
                            .expect("tool_calls is always an array")
                            .push(json!({
                                "id": request.id,
                                "type": "function",
                                "function": {
                                    "name": tool_call.name,
                                    "arguments": tool_call.arguments.to_string(),
                                }
                            }));
                    }
                    Err(e) => {
                        output.push(json!({
                            "role": "tool",
                            "content": format!("Error: {}", e),
                            "tool_call_id": request.id
                        }));
                    }
                },
                MessageContent::ToolResponse(response) => match &response.tool_result {
                    Ok(result) => {
                        output.push(json!({
                            "role": "tool",
                            "content": result,
                            "tool_call_id": response.id
                        }));
                    }
                    Err(e) => {
                        output.push(json!({
                            "role": "tool",
                            "content": format!("The tool call returned the following error:\n{}", e),
                            "tool_call_id": response.id
                        }));
                    }
                },
            }
        }

        if converted.get("content").is_some() || converted.get("tool_calls").is_some() {
            output.insert(0, converted);
        }
        messages_spec.extend(output);
    }

    messages_spec
}

/// Convert internal Tool format to the API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>, ProviderError> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(ProviderError::InvalidRequest(format!(
                "duplicate tool name: {}",
                tool.name
            )));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.input_schema,
            }
        }));
    }

    Ok(result)
}

/// Convert a chat-completion API response to the internal Message format.
///
/// Tool-call arguments that fail to parse are carried as an error inside the
/// request rather than failing the whole response.
pub fn response_to_message(response: &Value) -> Result<Message, ProviderError> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| {
            ProviderError::MalformedResponse("response has no choices[0].message".to_string())
        })?;

    let mut message = Message::assistant();

    if let Some(text) = original.get("content").and_then(|content| content.as_str()) {
        if !text.is_empty() {
            message = message.with_text(text);
        }
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(|calls| calls.as_array()) {
        for tool_call in tool_calls {
            let id = tool_call["id"].as_str().unwrap_or_default().to_string();
            let name = tool_call["function"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let arguments = tool_call["function"]["arguments"].as_str().unwrap_or("{}");

            let parsed = parse_tool_call(&name, arguments);
            message = message.with_tool_request(id, parsed);
        }
    }

    Ok(message)
}

pub(crate) fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall, ToolError> {
    let arguments = if arguments.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(arguments).map_err(|e| {
            ToolError::InvalidParameters(format!("could not parse arguments for {}: {}", name, e))
        })?
    };
    Ok(ToolCall::new(name, arguments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;

    #[test]
    fn test_messages_to_spec_text() {
        let messages = vec![
            Message::user().with_text("hello"),
            Message::assistant().with_text("hi there"),
        ];
        let spec = messages_to_openai_spec(&messages);
        assert_eq!(spec.len(), 2);
        assert_eq!(spec[0]["role"], "user");
        assert_eq!(spec[0]["content"], "hello");
        assert_eq!(spec[1]["role"], "assistant");
    }

    #[test]
    fn test_messages_to_spec_tool_round() {
        let call = ToolCall::new("echo", json!({"message": "hi"}));
        let messages = vec![
            Message::assistant().with_tool_request("call_1", Ok(call)),
            Message::tool().with_tool_response("call_1", Ok("hi".to_string())),
        ];
        let spec = messages_to_openai_spec(&messages);
        assert_eq!(spec.len(), 2);
        assert_eq!(spec[0]["tool_calls"][0]["id"], "call_1");
        assert_eq!(spec[0]["tool_calls"][0]["function"]["name"], "echo");
        assert_eq!(spec[1]["role"], "tool");
        assert_eq!(spec[1]["tool_call_id"], "call_1");
        assert_eq!(spec[1]["content"], "hi");
    }

    #[test]
    fn test_failed_tool_result_is_model_visible() {
        let messages = vec![Message::tool()
            .with_tool_response("call_1", Err(ToolError::NotFound("echo".to_string())))];
        let spec = messages_to_openai_spec(&messages);
        assert_eq!(spec.len(), 1);
        let content = spec[0]["content"].as_str().unwrap();
        assert!(content.contains("tool not found: echo"));
    }

    #[test]
    fn test_tools_to_spec_rejects_duplicates() {
        let schema = json!({"type": "object", "properties": {}});
        let tools = vec![
            Tool::new("echo", "first", schema.clone()),
            Tool::new("echo", "second", schema),
        ];
        let result = tools_to_openai_spec(&tools);
        assert!(matches!(result, Err(ProviderError::InvalidRequest(_))));
    }

    #[test]
    fn test_response_to_message_text() {
        let response = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Hello!"}
            }]
        });
        let message = response_to_message(&response).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text(), "Hello!");
    }

    #[test]
    fn test_response_to_message_tool_call() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "echo", "arguments": "{\"message\":\"hi\"}"}
                    }]
                }
            }]
        });
        let message = response_to_message(&response).unwrap();
        let requests = message.tool_requests();
        assert_eq!(requests.len(), 1);
        let call = requests[0].tool_call.as_ref().unwrap();
        assert_eq!(call.name, "echo");
        assert_eq!(call.arguments, json!({"message": "hi"}));
    }

    #[test]
    fn test_malformed_arguments_become_request_error() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "id": "call_1",
                        "function": {"name": "echo", "arguments": "{not json"}
                    }]
                }
            }]
        });
        let message = response_to_message(&response).unwrap();
        let requests = message.tool_requests();
        assert!(matches!(
            requests[0].tool_call,
            Err(ToolError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_missing_choices_is_malformed() {
        let result = response_to_message(&json!({"error": "nope"}));
        assert!(matches!(result, Err(ProviderError::MalformedResponse(_))));
    }
}
