use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tandem::providers::configs::OpenAiProviderConfig;
use tandem::providers::openai::OpenAiProvider;

mod commands;
mod toolkits;

use toolkits::Toolkit;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Model to use (overrides OPENAI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat session with a demo toolkit
    Session {
        /// Toolkit to expose to the model
        #[arg(long, value_enum, default_value = "all")]
        toolkit: Toolkit,
    },
    /// Send a single prompt and print the reply
    Run {
        /// The prompt to send
        prompt: String,

        /// Toolkit to expose to the model
        #[arg(long, value_enum, default_value = "all")]
        toolkit: Toolkit,
    },
    /// Stream a writer -> reviewer release-notes pipeline
    Notes {
        /// Raw change list; a sample is used when omitted
        #[arg(long)]
        changes: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = OpenAiProviderConfig::from_env()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    let provider = Arc::new(OpenAiProvider::new(config)?);

    match cli.command {
        Command::Session { toolkit } => commands::session::run(provider, toolkit).await,
        Command::Run { prompt, toolkit } => commands::run::run(provider, prompt, toolkit).await,
        Command::Notes { changes } => commands::notes::run(provider, changes).await,
    }
}
