mod agents;
mod arxiv;
mod config;
mod console;
mod llm;
mod pipeline;
mod types;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Config;
use crate::console::{Console, SessionState};
use crate::pipeline::ReviewPipeline;

#[derive(Debug, Parser)]
#[command(about = "Two-agent arXiv literature review (search agent -> summarizer)")]
struct Args {
    /// Run the fixed demo: prompt for a key, review "Artificial Intelligence" with 5 papers
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Review this topic once instead of running the interactive loop
    #[arg(long)]
    topic: Option<String>,

    /// Number of papers to include (1-10)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
    papers: Option<u8>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    // logging goes to stderr; stdout carries the conversation
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter_layer)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting literature review agents");

    let cfg = Config::load()?;
    tracing::info!("Model {} ({} family) via {}", cfg.model, cfg.model_info.family, cfg.base_url);
    let pipeline = ReviewPipeline::from_config(&cfg)?;

    if args.demo {
        tracing::info!("Demo mode: topic '{}', {} papers", console::DEMO_TOPIC, console::DEMO_PAPERS);
        return Console::run_demo(&pipeline).await;
    }

    let shell = Console::new(Arc::new(pipeline));
    let mut session = SessionState::new(cfg.api_key.clone());
    if let Some(n) = args.papers {
        session.num_papers = n;
    }

    match args.topic {
        Some(topic) => {
            session.topic = topic;
            if session.credential.is_empty() {
                session.credential = console::prompt_credential().await?;
            }
            shell.submit(&session).await?;
        }
        None => {
            Console::display_notice(
                "ℹ️  Interactive mode: enter a key, a topic and a paper count; the agents' turns are shown as they finish.",
            );
            shell.run(&mut session).await?;
        }
    }

    Ok(())
}
