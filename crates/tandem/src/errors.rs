use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures talking to the remote completion service. These propagate to the
/// caller of a run; no retry is attempted anywhere in this crate.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request to model endpoint failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response from model endpoint: {0}")]
    MalformedResponse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),
}

/// Failures executing a tool. These are embedded in a tool-role message so the
/// model can react to them; they never abort a turn on their own.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("tool execution failed: {0}")]
    ExecutionFailed(String),
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Per-turn failures surfaced by [`Agent::run`](crate::agent::Agent::run).
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("exceeded {limit} tool round trips without a final response")]
    ToolLoopExceeded { limit: usize },

    #[error("conversation must contain at least one message")]
    EmptyConversation,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_round_trips_through_json() {
        let error = ToolError::NotFound("tasks__create".to_string());
        let serialized = serde_json::to_string(&error).unwrap();
        let deserialized: ToolError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(error, deserialized);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ToolError::NotFound("echo".into()).to_string(),
            "tool not found: echo"
        );
        assert_eq!(
            AgentError::ToolLoopExceeded { limit: 3 }.to_string(),
            "exceeded 3 tool round trips without a final response"
        );
    }
}
