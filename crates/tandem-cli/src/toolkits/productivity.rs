//! Task and calendar tools.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Weekday};
use serde_json::json;
use tandem::errors::ToolError;
use tandem::models::tool::Tool;
use tandem::registry::ToolRegistry;

use super::{optional_str, required_i64, required_str};

struct TaskItem {
    id: usize,
    title: String,
    priority: String,
    due_date: Option<String>,
    status: String,
}

pub fn register(registry: &mut ToolRegistry) -> Result<()> {
    let tasks: Arc<Mutex<Vec<TaskItem>>> = Arc::new(Mutex::new(Vec::new()));

    let store = tasks.clone();
    registry.register_fn(
        Tool::new(
            "create_task",
            "Create a new task with priority and deadline",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Task title"},
                    "description": {"type": "string", "description": "Task description"},
                    "priority": {"type": "string", "description": "Priority: Low, Medium, High, Critical"},
                    "due_date": {"type": "string", "description": "Due date (YYYY-MM-DD)"}
                },
                "required": ["title"]
            }),
        ),
        move |arguments| {
            let title = required_str(&arguments, "title")?;
            let priority = optional_str(&arguments, "priority", "Medium");
            let due_date = arguments
                .get("due_date")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            let mut tasks = store.lock().unwrap();
            let id = tasks.len() + 1;
            tasks.push(TaskItem {
                id,
                title: title.clone(),
                priority: priority.clone(),
                due_date,
                status: "Pending".to_string(),
            });
            Ok(format!(
                "Task created: #{} - {} (Priority: {})",
                id, title, priority
            ))
        },
    )?;

    let store = tasks.clone();
    registry.register_fn(
        Tool::new(
            "list_tasks",
            "List all tasks with their status",
            json!({"type": "object", "properties": {}}),
        ),
        move |_arguments| {
            let tasks = store.lock().unwrap();
            if tasks.is_empty() {
                return Ok("No tasks found".to_string());
            }
            let lines: Vec<String> = tasks
                .iter()
                .map(|task| {
                    let due = task
                        .due_date
                        .as_deref()
                        .map(|date| format!(" - Due: {}", date))
                        .unwrap_or_default();
                    format!(
                        "#{}: {} - {} (Priority: {}){}",
                        task.id, task.title, task.status, task.priority, due
                    )
                })
                .collect();
            Ok(format!("Current Tasks:\n{}", lines.join("\n")))
        },
    )?;

    let store = tasks;
    registry.register_fn(
        Tool::new(
            "update_task_status",
            "Update task status",
            json!({
                "type": "object",
                "properties": {
                    "task_id": {"type": "integer", "description": "Task ID"},
                    "status": {"type": "string", "description": "New status: Pending, In Progress, Completed"}
                },
                "required": ["task_id", "status"]
            }),
        ),
        move |arguments| {
            let task_id = required_i64(&arguments, "task_id")? as usize;
            let status = required_str(&arguments, "status")?;

            let mut tasks = store.lock().unwrap();
            match tasks.iter_mut().find(|task| task.id == task_id) {
                Some(task) => {
                    task.status = status.clone();
                    Ok(format!("Task #{} status updated to: {}", task_id, status))
                }
                None => Ok(format!("Task #{} not found", task_id)),
            }
        },
    )?;

    registry.register_fn(
        Tool::new(
            "check_availability",
            "Check calendar availability for a specific date",
            json!({
                "type": "object",
                "properties": {
                    "date": {"type": "string", "description": "Date to check (YYYY-MM-DD)"}
                },
                "required": ["date"]
            }),
        ),
        |arguments| {
            let date = required_str(&arguments, "date")?;
            let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
                ToolError::InvalidParameters(format!("date must be YYYY-MM-DD: {}", e))
            })?;
            let availability = match parsed.weekday() {
                Weekday::Sat | Weekday::Sun => "Limited availability (Weekend)",
                _ => "Available",
            };
            Ok(format!("{}: {}", date, availability))
        },
    )?;

    registry.register_fn(
        Tool::new(
            "schedule_event",
            "Schedule a calendar event",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Event title"},
                    "date": {"type": "string", "description": "Event date (YYYY-MM-DD)"},
                    "time": {"type": "string", "description": "Event time (HH:MM)"},
                    "duration": {"type": "integer", "description": "Duration in minutes"}
                },
                "required": ["title", "date", "time"]
            }),
        ),
        |arguments| {
            let title = required_str(&arguments, "title")?;
            let date = required_str(&arguments, "date")?;
            let time = required_str(&arguments, "time")?;
            let duration = arguments.get("duration").and_then(|v| v.as_i64()).unwrap_or(60);
            Ok(format!(
                "Event scheduled: '{}' on {} at {} ({} minutes)",
                title, date, time, duration
            ))
        },
    )?;

    Ok(())
}
