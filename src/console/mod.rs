use std::sync::Arc;

use anyhow::Result;
use colored::*;
use futures::StreamExt;
use tokio::select;
use tokio::sync::mpsc;

use crate::pipeline::{PipelineError, ReviewPipeline, ReviewStream};
use crate::types::{ConversationLine, ReviewRequest};

mod input;
mod render;

pub const DEMO_TOPIC: &str = "Artificial Intelligence";
pub const DEMO_PAPERS: u8 = 5;
pub const DEFAULT_PAPERS: u8 = 5;

/// Ask for the credential once, outside the interactive loop.
pub async fn prompt_credential() -> Result<String> {
    input::prompt_secret("🔑 Enter your Groq API key: ").await
}

/// Form values that persist across review runs within one session.
#[derive(Clone)]
pub struct SessionState {
    pub credential: String,
    pub topic: String,
    pub num_papers: u8,
}

impl SessionState {
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
            topic: String::new(),
            num_papers: DEFAULT_PAPERS,
        }
    }

    /// Keep a newly entered key; blank input keeps the current one. Returns
    /// `false` when the input was a quit command.
    fn accept_credential(&mut self, entered: String) -> bool {
        if input::is_quit_command(&entered) {
            return false;
        }
        if !entered.is_empty() {
            self.credential = entered;
        }
        true
    }

    /// Build a request from the current form, or the warning to show instead.
    pub fn submission(&self) -> Result<ReviewRequest, &'static str> {
        if self.credential.trim().is_empty() {
            return Err("Please enter your Groq API key.");
        }
        if self.topic.trim().is_empty() {
            return Err("Please enter a topic.");
        }
        Ok(ReviewRequest::new(
            self.topic.trim(),
            self.num_papers,
            self.credential.trim(),
        ))
    }
}

/// What the user chose at the prompts.
enum FormAction {
    Submit,
    Quit,
}

/// Interactive front end for the review pipeline
pub struct Console {
    pipeline: Arc<ReviewPipeline>,
}

impl Console {
    pub fn new(pipeline: Arc<ReviewPipeline>) -> Self {
        Self { pipeline }
    }

    /// Run the main console loop (interactive mode)
    pub async fn run(&self, session: &mut SessionState) -> Result<()> {
        render::display_welcome();

        loop {
            select! {
                _ = tokio::signal::ctrl_c() => {
                    render::display_goodbye();
                    // The blocking stdin read is still pending and would hold up runtime shutdown.
                    std::process::exit(0);
                }
                action = Self::collect(session) => {
                    match action {
                        Ok(FormAction::Quit) => {
                            render::display_goodbye();
                            break;
                        }
                        Ok(FormAction::Submit) => self.submit(session).await?,
                        Err(e) => {
                            render::display_error(&e);
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Validate the session form and run a single review.
    pub async fn submit(&self, session: &SessionState) -> Result<()> {
        match session.submission() {
            Ok(request) => self.run_review(request).await,
            Err(warning) => {
                render::display_warning(warning);
                Ok(())
            }
        }
    }

    async fn collect(session: &mut SessionState) -> Result<FormAction> {
        let key_prompt = if session.credential.is_empty() {
            "🔑 Enter your Groq API key: ".to_string()
        } else {
            "🔑 Groq API key (Enter to keep current): ".to_string()
        };
        let credential = input::prompt_secret(&key_prompt).await?;
        if !session.accept_credential(credential) {
            return Ok(FormAction::Quit);
        }

        let topic_prompt = if session.topic.is_empty() {
            "📚 Research topic: ".to_string()
        } else {
            format!("📚 Research topic [{}]: ", session.topic)
        };
        let topic = input::prompt_user(&topic_prompt).await?;
        if input::is_quit_command(&topic) {
            return Ok(FormAction::Quit);
        }
        if !topic.is_empty() {
            session.topic = topic;
        }

        let count = input::prompt_user(&format!(
            "🔢 Number of papers (1-10) [{}]: ",
            session.num_papers
        ))
        .await?;
        session.num_papers = input::parse_paper_count(&count, session.num_papers);

        Ok(FormAction::Submit)
    }

    /// Drive one pipeline run and render each turn as it arrives.
    async fn run_review(&self, request: ReviewRequest) -> Result<()> {
        render::display_running(&request);

        let stream = match self.pipeline.review(request) {
            Ok(stream) => stream,
            Err(e) => {
                render::display_pipeline_error(&e);
                return Ok(());
            }
        };

        let mut failed = false;
        relay(stream, |item| match item {
            Ok(line) => render::display_line(&line),
            Err(e) => {
                render::display_pipeline_error(&e);
                failed = true;
            }
        })
        .await?;

        if !failed {
            render::display_done();
        }
        Ok(())
    }

    /// Fixed-topic demo: ask for a key, then print `source: content` lines.
    pub async fn run_demo(pipeline: &ReviewPipeline) -> Result<()> {
        let key = input::prompt_user("Enter your Groq API key: ").await?;
        let mut stream = pipeline.review(ReviewRequest::new(DEMO_TOPIC, DEMO_PAPERS, key))?;
        while let Some(line) = stream.next().await {
            println!("{}", line?);
        }
        Ok(())
    }

    pub fn display_notice(message: &str) {
        println!("{}", message.blue());
    }
}

/// Poll `stream` on a worker task and hand each item to `on_item` in
/// arrival order. Returns once the stream has ended.
async fn relay<F>(mut stream: ReviewStream, mut on_item: F) -> Result<()>
where
    F: FnMut(Result<ConversationLine, PipelineError>),
{
    let (tx, mut rx) = mpsc::channel::<Result<ConversationLine, PipelineError>>(4);
    let worker = tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            if tx.send(item).await.is_err() {
                break;
            }
        }
    });

    while let Some(item) = rx.recv().await {
        on_item(item);
    }
    worker.await?;
    Ok(())
}
