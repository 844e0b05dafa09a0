//! Explicit tool registry.
//!
//! Every tool is registered by name at startup with its schema and handler;
//! nothing is discovered implicitly at runtime. Handlers close over whatever
//! state they need, so shared state is an explicit object behind its own
//! lock rather than a process-wide static.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use serde_json::Value;

use crate::errors::{ToolError, ToolResult};
use crate::models::tool::{Tool, ToolCall};

pub type ToolHandler = Box<dyn Fn(Value) -> BoxFuture<'static, ToolResult<String>> + Send + Sync>;

/// An external process that advertises tools and executes them on request.
///
/// The discovery and invocation wire protocol lives behind this trait; the
/// registry only sees an opaque synchronous RPC.
pub trait ToolSource: Send + Sync {
    fn discover(&self) -> Result<Vec<Tool>>;
    fn invoke(&self, call: &ToolCall) -> ToolResult<String>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with an async handler. Duplicate names are rejected,
    /// since the completion API requires unique tool names.
    pub fn register<F, Fut>(&mut self, tool: Tool, handler: F) -> Result<()>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult<String>> + Send + 'static,
    {
        if self.handlers.contains_key(&tool.name) {
            return Err(anyhow!("tool already registered: {}", tool.name));
        }
        self.handlers.insert(
            tool.name.clone(),
            Box::new(move |arguments| Box::pin(handler(arguments))),
        );
        self.tools.push(tool);
        Ok(())
    }

    /// Register a tool with a synchronous handler
    pub fn register_fn<F>(&mut self, tool: Tool, handler: F) -> Result<()>
    where
        F: Fn(Value) -> ToolResult<String> + Send + Sync + 'static,
    {
        self.register(tool, move |arguments| {
            futures::future::ready(handler(arguments))
        })
    }

    /// Register every tool advertised by an external source, delegating
    /// execution back to it.
    pub fn register_source(&mut self, source: Arc<dyn ToolSource>) -> Result<()> {
        for tool in source.discover()? {
            let name = tool.name.clone();
            let source = source.clone();
            self.register_fn(tool, move |arguments| {
                source.invoke(&ToolCall::new(name.clone(), arguments))
            })?;
        }
        Ok(())
    }

    /// The registered tool descriptors, in registration order
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool call. An unknown name is a `NotFound` result, which the
    /// agent embeds in a tool response for the model to react to.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult<String> {
        let handler = self
            .handlers
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        handler(call.arguments.clone()).await
    }
}
