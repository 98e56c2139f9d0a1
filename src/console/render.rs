use anyhow::Error;
use colored::*;

use crate::agents::AgentError;
use crate::arxiv::SearchError;
use crate::llm::LlmError;
use crate::pipeline::PipelineError;
use crate::types::{ConversationLine, ReviewRequest, RoleId};

pub fn display_welcome() {
    println!(
        "{}",
        "📚 Multi-Agent Literature Review".bright_blue().bold()
    );
    println!(
        "{}",
        "A search agent finds papers on arXiv, then a summarizer writes a short review."
            .blue()
    );
    println!(
        "{}",
        "You'll be asked for your Groq API key, a research topic and the number of papers (1-10)."
            .blue()
    );
    println!("{}", "Type '/quit' or '/exit' at the topic prompt to stop.\n".blue());
}

pub fn display_running(request: &ReviewRequest) {
    println!(
        "{} {} {}",
        "🔄 Generating review on".blue().italic(),
        request.topic.bright_white().bold(),
        format!("({} papers)...", request.num_papers).blue().italic()
    );
}

/// Print one finished turn under a header naming its role.
pub fn display_line(line: &ConversationLine) {
    let header = format!("── {} ", line.source);
    let header = match line.source {
        RoleId::SearchAgent => header.bright_cyan().bold(),
        RoleId::Summarizer => header.bright_green().bold(),
    };
    println!("\n{}{}", header, line.source.description().dimmed());
    for text in line.content.lines() {
        println!("  {}", text);
    }
}

pub fn display_done() {
    println!("\n{}\n", "✅ Review complete.".bright_green().bold());
}

pub fn display_warning(message: &str) {
    println!("{} {}\n", "⚠️".bright_yellow(), message.bright_yellow());
}

pub fn display_error(error: &Error) {
    if let Some(pipeline_error) = error.downcast_ref::<PipelineError>() {
        display_pipeline_error(pipeline_error);
    } else {
        println!(
            "{} {}",
            "❌ Error:".bright_red().bold(),
            error.to_string().red()
        );
        println!(
            "{}",
            "Please check your configuration and try again.\n".red()
        );
    }
}

pub fn display_pipeline_error(error: &PipelineError) {
    match error {
        PipelineError::Configuration(message) => {
            display_warning(&format!("Configuration error: {message}"));
        }
        PipelineError::Upstream { role, source } => {
            println!(
                "\n{} {}",
                format!("❌ {role} turn failed:").bright_red().bold(),
                source.to_string().red()
            );
            match source {
                AgentError::Llm(llm_error) => display_llm_error(llm_error),
                AgentError::Search(search_error) => display_search_error(search_error),
                AgentError::Serde(_) | AgentError::UnexpectedReply(_) => {
                    println!(
                        "{}",
                        "💡 Tip: The model replied in an unexpected shape. Try again or rephrase the topic."
                            .magenta()
                    );
                    println!();
                }
            }
        }
    }
}

pub fn display_llm_error(error: &LlmError) {
    let user_message = error.user_message();
    match error {
        LlmError::ServerBusy => {
            println!("{}", user_message.bright_yellow().bold());
            println!(
                "{}",
                "💡 Tip: Free-tier rate limits reset quickly. Try again in a minute.".yellow()
            );
        }
        LlmError::NetworkError { .. } => {
            println!("{}", user_message.bright_red().bold());
            println!(
                "{}",
                "💡 Tip: Check your internet connection and firewall settings.".red()
            );
        }
        LlmError::Timeout { .. } => {
            println!("{}", user_message.bright_yellow().bold());
            println!(
                "{}",
                "💡 Tip: Raise LITREV_TIMEOUT_SECS or try again later.".yellow()
            );
        }
        LlmError::ApiError { status, .. } => {
            println!("{}", user_message.bright_red().bold());
            match *status {
                401 => println!(
                    "{}",
                    "💡 Tip: Check that you pasted the full Groq API key.".red()
                ),
                404 => println!(
                    "{}",
                    "💡 Tip: Check LITREV_MODEL and LITREV_BASE_URL.".red()
                ),
                _ => println!(
                    "{}",
                    "💡 Tip: Check the backend's API documentation for more details.".red()
                ),
            }
        }
        LlmError::ParseError { .. } => {
            println!("{}", user_message.bright_magenta().bold());
            println!(
                "{}",
                "💡 Tip: The server response was unexpected. Try again.".magenta()
            );
        }
        LlmError::ConfigError { .. } => {
            println!("{}", user_message.bright_red().bold());
            println!(
                "{}",
                "💡 Tip: Check your environment variables and configuration.".red()
            );
        }
    }
    println!();
}

fn display_search_error(error: &SearchError) {
    let tip = match error {
        SearchError::EmptyQuery => "💡 Tip: The model produced an empty query. Try a more specific topic.",
        SearchError::Status { status: 429 | 503 } => "💡 Tip: arXiv is throttling requests. Wait a few seconds.",
        _ => "💡 Tip: arXiv could not be reached. Check your connection and try again.",
    };
    println!("{}", tip.yellow());
    println!();
}

pub fn display_goodbye() {
    println!("{}", "👋 Goodbye!".bright_yellow().bold());
}
