//! Email and contact tools. Sending is simulated; no SMTP involved.

use anyhow::Result;
use serde_json::json;
use tandem::errors::ToolError;
use tandem::models::tool::Tool;
use tandem::registry::ToolRegistry;

use super::{optional_str, required_str};

const CONTACTS: &[(&str, &str)] = &[
    ("john", "john.smith@company.com"),
    ("sarah", "sarah.jones@company.com"),
    ("mike", "mike.wilson@company.com"),
    ("team", "team@company.com"),
];

pub fn register(registry: &mut ToolRegistry) -> Result<()> {
    registry.register_fn(
        Tool::new(
            "send_email",
            "Send an email to specified recipient",
            json!({
                "type": "object",
                "properties": {
                    "to_email": {"type": "string", "description": "Recipient email address"},
                    "subject": {"type": "string", "description": "Email subject"},
                    "body": {"type": "string", "description": "Email body content"},
                    "from_name": {"type": "string", "description": "Sender name (optional)"}
                },
                "required": ["to_email", "subject", "body"]
            }),
        ),
        |arguments| {
            let to_email = required_str(&arguments, "to_email")?;
            let subject = required_str(&arguments, "subject")?;
            let _body = required_str(&arguments, "body")?;
            let from_name = optional_str(&arguments, "from_name", "System");
            Ok(format!(
                "Email sent to {} (Subject: '{}', From: {})",
                to_email, subject, from_name
            ))
        },
    )?;

    registry.register_fn(
        Tool::new(
            "get_email_template",
            "Get email template for specific purpose",
            json!({
                "type": "object",
                "properties": {
                    "template_type": {
                        "type": "string",
                        "description": "Template type: meeting, followup, announcement"
                    }
                },
                "required": ["template_type"]
            }),
        ),
        |arguments| {
            let template_type = required_str(&arguments, "template_type")?;
            match template_type.to_lowercase().as_str() {
                "meeting" => Ok("Subject: Meeting Request\n\nHi [Name],\n\nI'd like to \
                    schedule a meeting to discuss [Topic]. Please let me know your \
                    availability.\n\nBest regards,\n[Your Name]"
                    .to_string()),
                "followup" => Ok("Subject: Following up on [Topic]\n\nHi [Name],\n\nI \
                    wanted to follow up on our previous discussion about [Topic]. Please \
                    let me know if you need any additional information.\n\nBest \
                    regards,\n[Your Name]"
                    .to_string()),
                "announcement" => Ok("Subject: Important Update: [Topic]\n\nTeam,\n\nI \
                    wanted to share an important update about [Topic]. [Details]\n\n\
                    Please reach out if you have any questions.\n\nBest regards,\n\
                    [Your Name]"
                    .to_string()),
                other => Err(ToolError::InvalidParameters(format!(
                    "unknown template type '{}'; expected meeting, followup, or announcement",
                    other
                ))),
            }
        },
    )?;

    registry.register_fn(
        Tool::new(
            "get_contact_email",
            "Get email address for a contact",
            json!({
                "type": "object",
                "properties": {
                    "contact_name": {"type": "string", "description": "Contact name or alias"}
                },
                "required": ["contact_name"]
            }),
        ),
        |arguments| {
            let contact_name = required_str(&arguments, "contact_name")?;
            let lookup = contact_name.to_lowercase();
            let email = CONTACTS
                .iter()
                .find(|(name, _)| *name == lookup)
                .map(|(_, email)| (*email).to_string());
            Ok(email.unwrap_or_else(|| format!("No contact named '{}'", contact_name)))
        },
    )?;

    registry.register_fn(
        Tool::new(
            "list_contacts",
            "List all available contacts",
            json!({"type": "object", "properties": {}}),
        ),
        |_arguments| {
            let contacts: Vec<String> = CONTACTS
                .iter()
                .map(|(name, email)| format!("{} ({})", name, email))
                .collect();
            Ok(contacts.join(", "))
        },
    )?;

    Ok(())
}
