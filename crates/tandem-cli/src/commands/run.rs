use std::sync::Arc;

use anyhow::Result;
use tandem::agent::Agent;
use tandem::models::message::Message;
use tandem::models::thread::Thread;
use tandem::providers::base::Provider;

use crate::toolkits::Toolkit;

/// Headless one-shot turn: send the prompt, print the final reply.
pub async fn run(provider: Arc<dyn Provider>, prompt: String, toolkit: Toolkit) -> Result<()> {
    let agent = Agent::new(provider, toolkit.instructions())
        .with_registry(toolkit.registry()?);

    let mut thread = Thread::new();
    thread.push(Message::user().with_text(&prompt));

    let response = agent.run(&thread).await?;
    println!("{}", response.text());
    Ok(())
}
