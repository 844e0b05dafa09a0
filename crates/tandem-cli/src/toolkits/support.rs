//! Support ticket and knowledge base tools.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde_json::json;
use tandem::models::tool::Tool;
use tandem::registry::ToolRegistry;

use super::{optional_str, required_str};

struct SupportTicket {
    id: String,
    status: String,
}

const SOLUTIONS: &[(&str, &str)] = &[
    (
        "database connection",
        "Common solutions: 1) Check connection string, 2) Verify network \
         connectivity, 3) Restart database service, 4) Check firewall settings, \
         5) Review connection pooling settings",
    ),
    (
        "login issues",
        "Troubleshooting steps: 1) Verify credentials, 2) Check account status, \
         3) Clear browser cache, 4) Try incognito mode, 5) Reset password if needed",
    ),
    (
        "performance",
        "Performance optimization: 1) Check system resources, 2) Analyze slow \
         queries, 3) Review indexing strategy, 4) Monitor memory usage, \
         5) Consider caching solutions",
    ),
];

pub fn register(registry: &mut ToolRegistry) -> Result<()> {
    let tickets: Arc<Mutex<Vec<SupportTicket>>> = Arc::new(Mutex::new(Vec::new()));

    let store = tickets.clone();
    registry.register_fn(
        Tool::new(
            "create_ticket",
            "Create a support ticket",
            json!({
                "type": "object",
                "properties": {
                    "issue": {"type": "string", "description": "Customer issue description"},
                    "priority": {"type": "string", "description": "Priority level: Low, Medium, High, Critical"},
                    "category": {"type": "string", "description": "Category: Technical, Billing, General"}
                },
                "required": ["issue", "priority"]
            }),
        ),
        move |arguments| {
            let _issue = required_str(&arguments, "issue")?;
            let priority = required_str(&arguments, "priority")?;
            let category = optional_str(&arguments, "category", "General");

            let mut tickets = store.lock().unwrap();
            let id = format!("TKT-{}", tickets.len() + 1001);
            tickets.push(SupportTicket {
                id: id.clone(),
                status: "Open".to_string(),
            });
            Ok(format!(
                "Support ticket created: {} (Priority: {}, Category: {})",
                id, priority, category
            ))
        },
    )?;

    let store = tickets;
    registry.register_fn(
        Tool::new(
            "update_ticket_status",
            "Update ticket status",
            json!({
                "type": "object",
                "properties": {
                    "ticket_id": {"type": "string", "description": "Ticket ID"},
                    "status": {"type": "string", "description": "New status: Open, In Progress, Resolved, Closed"}
                },
                "required": ["ticket_id", "status"]
            }),
        ),
        move |arguments| {
            let ticket_id = required_str(&arguments, "ticket_id")?;
            let status = required_str(&arguments, "status")?;

            let mut tickets = store.lock().unwrap();
            match tickets.iter_mut().find(|ticket| ticket.id == ticket_id) {
                Some(ticket) => {
                    ticket.status = status.clone();
                    Ok(format!("Ticket {} status updated to: {}", ticket_id, status))
                }
                None => Ok(format!("Ticket {} not found", ticket_id)),
            }
        },
    )?;

    registry.register_fn(
        Tool::new(
            "search_solutions",
            "Search knowledge base for solutions",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search term or issue description"}
                },
                "required": ["query"]
            }),
        ),
        |arguments| {
            let query = required_str(&arguments, "query")?.to_lowercase();
            let solution = SOLUTIONS
                .iter()
                .find(|(topic, _)| query.contains(topic))
                .map(|(_, solution)| (*solution).to_string());
            Ok(solution.unwrap_or_else(|| {
                "No specific solution found. Please escalate to technical team.".to_string()
            }))
        },
    )?;

    Ok(())
}
