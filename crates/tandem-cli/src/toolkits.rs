//! Demo toolkits backed by in-process state.
//!
//! Each toolkit owns its state explicitly (a store behind `Arc<Mutex<..>>`
//! that the handlers close over) so two sessions never share tasks or
//! tickets by accident.

pub mod correspondence;
pub mod productivity;
pub mod support;

use anyhow::Result;
use serde_json::Value;
use tandem::errors::{ToolError, ToolResult};
use tandem::registry::ToolRegistry;

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Toolkit {
    Productivity,
    Correspondence,
    Support,
    All,
}

impl Toolkit {
    pub fn registry(&self) -> Result<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        match self {
            Toolkit::Productivity => productivity::register(&mut registry)?,
            Toolkit::Correspondence => correspondence::register(&mut registry)?,
            Toolkit::Support => support::register(&mut registry)?,
            Toolkit::All => {
                productivity::register(&mut registry)?;
                correspondence::register(&mut registry)?;
                support::register(&mut registry)?;
            }
        }
        Ok(registry)
    }

    pub fn instructions(&self) -> &'static str {
        match self {
            Toolkit::Productivity => {
                "You are a personal productivity assistant. Use the available tools \
                 to manage tasks and calendar events. Always confirm what you did."
            }
            Toolkit::Correspondence => {
                "You are an email assistant. Use the available tools to look up \
                 contacts, fetch templates, and send emails. Always confirm what \
                 you sent and to whom."
            }
            Toolkit::Support => {
                "You are a customer support assistant. Search the knowledge base \
                 before creating a ticket, and keep ticket status up to date."
            }
            Toolkit::All => {
                "You are a helpful office assistant. Use the available tools for \
                 tasks, calendar, email, and support work. Always confirm what \
                 you did."
            }
        }
    }
}

pub(crate) fn required_str(arguments: &Value, key: &str) -> ToolResult<String> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing required parameter: {}", key)))
}

pub(crate) fn optional_str(arguments: &Value, key: &str, default: &str) -> String {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
        .to_string()
}

pub(crate) fn required_i64(arguments: &Value, key: &str) -> ToolResult<i64> {
    arguments
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing required parameter: {}", key)))
}
