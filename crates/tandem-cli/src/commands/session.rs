use std::sync::Arc;

use anyhow::Result;
use bat::PrettyPrinter;
use cliclack::{input, spinner};
use console::style;
use tandem::agent::Agent;
use tandem::models::message::Message;
use tandem::models::thread::Thread;
use tandem::providers::base::Provider;

use crate::toolkits::Toolkit;

/// Interactive chat loop. The thread persists across turns; `new` starts a
/// fresh one and `exit` quits.
pub async fn run(provider: Arc<dyn Provider>, toolkit: Toolkit) -> Result<()> {
    let agent = Agent::new(provider, toolkit.instructions())
        .with_registry(toolkit.registry()?);

    println!(
        "tandem session {}",
        style("- \"new\" starts a fresh thread, \"exit\" ends the session").dim()
    );
    println!();

    let mut thread = Thread::new();
    loop {
        let message_text: String = input("Message:").placeholder("").multiline().interact()?;
        let trimmed = message_text.trim();

        if trimmed.eq_ignore_ascii_case("exit") {
            break;
        }
        if trimmed.eq_ignore_ascii_case("new") {
            thread = Thread::new();
            println!("{}", style("started a fresh thread").dim());
            continue;
        }

        thread.push(Message::user().with_text(&message_text));

        let spin = spinner();
        spin.start("awaiting reply");
        let response = agent.run(&thread).await?;
        spin.stop("");

        render(&response.text());
        thread.push(response);

        println!();
    }
    Ok(())
}

fn render(content: &str) {
    let rendered = PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print();
    if rendered.is_err() {
        println!("{}", content);
    }
}
