use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use console::style;
use futures::StreamExt;
use tandem::agent::Agent;
use tandem::pipeline::{PipelineBuilder, PipelineEvent};
use tandem::providers::base::Provider;

const WRITER_INSTRUCTIONS: &str =
    "You are a release notes writer. Given raw commit messages and a list of \
     changes, group them and produce concise technical release notes for \
     developers.";

const REVIEWER_INSTRUCTIONS: &str =
    "You are a product marketing writer. You receive technical release notes \
     and turn them into customer-friendly bullets for end-users, keeping it \
     short and clear.";

const DEFAULT_CHANGES: &str = "\
- Fix: thread serialization bug when using approval-required tools
- Feature: add hosted tool-server integration sample to docs
- Change: improve pipeline event logging and tracing
- Fix: panic in custom tool handler error path";

/// Writer -> reviewer release-notes pipeline, streamed live with each
/// fragment tagged by the node that produced it.
pub async fn run(provider: Arc<dyn Provider>, changes: Option<String>) -> Result<()> {
    let changes = changes.unwrap_or_else(|| DEFAULT_CHANGES.to_string());

    let writer = Agent::new(provider.clone(), WRITER_INSTRUCTIONS).with_name("writer");
    let reviewer = Agent::new(provider, REVIEWER_INSTRUCTIONS).with_name("reviewer");

    let pipeline = PipelineBuilder::new()
        .add_node(writer)
        .add_node(reviewer)
        .add_edge("writer", "reviewer")
        .build()?;

    let initial = format!(
        "Here is a list of internal changes. First, write technical release \
         notes. Then refine them for customers.\n\n{}",
        changes
    );

    println!("{}", style("=== Release notes (streamed) ===").bold());

    let mut stream = pipeline.run_streaming(&initial);
    let mut current_node: Option<String> = None;
    while let Some(event) = stream.next().await {
        match event? {
            PipelineEvent::Fragment { node, text, .. } => {
                if current_node.as_deref() != Some(node.as_str()) {
                    println!("\n{}", style(format!("[{}]", node)).cyan().bold());
                    current_node = Some(node);
                }
                print!("{}", text);
                io::stdout().flush()?;
            }
            PipelineEvent::NodeComplete { node, .. } => {
                println!();
                println!("{}", style(format!("[{} done]", node)).dim());
            }
        }
    }

    println!("\n{}", style("Done.").dim());
    Ok(())
}
