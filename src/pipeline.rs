//! Two-turn literature review: the search agent speaks once, then the
//! summarizer speaks once, and each finished turn is streamed to the caller.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use thiserror::Error;
use tracing::{error, info};

use crate::agents::{
    Agent, AgentError, SearchAgent, SearchInput, SummarizerAgent, SummaryInput,
};
use crate::arxiv::{ArxivClient, PaperSearch};
use crate::config::Config;
use crate::llm::{ChatClient, LlmClient, LlmError};
use crate::types::{ConversationLine, PaperRecord, ReviewRequest, RoleId};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{role} turn failed: {source}")]
    Upstream {
        role: RoleId,
        #[source]
        source: AgentError,
    },
}

/// One-shot, forward-only sequence of finished turns.
pub type ReviewStream = BoxStream<'static, Result<ConversationLine, PipelineError>>;

/// Builds a chat client bound to a credential.
pub trait ModelConnector: Send + Sync {
    fn connect(&self, credential: &str) -> Result<Arc<dyn LlmClient>, LlmError>;
}

impl ModelConnector for Config {
    fn connect(&self, credential: &str) -> Result<Arc<dyn LlmClient>, LlmError> {
        let client: Arc<dyn LlmClient> = Arc::new(ChatClient::new(self.with_credential(credential))?);
        Ok(client)
    }
}

pub struct ReviewPipeline {
    connector: Arc<dyn ModelConnector>,
    search: Arc<dyn PaperSearch>,
}

impl ReviewPipeline {
    pub fn new(connector: Arc<dyn ModelConnector>, search: Arc<dyn PaperSearch>) -> Self {
        Self { connector, search }
    }

    /// Pipeline talking to the configured chat backend and arXiv.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let search = ArxivClient::new(config.arxiv_base_url.clone())
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;
        Ok(Self::new(Arc::new(config.clone()), Arc::new(search)))
    }

    /// Start a review run.
    ///
    /// Credential and count are checked here, before any client exists; the
    /// returned stream does no work until polled.
    pub fn review(&self, request: ReviewRequest) -> Result<ReviewStream, PipelineError> {
        if request.credential.trim().is_empty() {
            return Err(PipelineError::Configuration("credential required".to_string()));
        }
        if request.num_papers == 0 {
            return Err(PipelineError::Configuration(
                "number of papers must be at least 1".to_string(),
            ));
        }

        let client = self
            .connector
            .connect(&request.credential)
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;

        info!(
            "Review pipeline: topic='{}', papers={} (search_agent -> summarizer)",
            request.topic, request.num_papers
        );
        let run = Run {
            searcher: SearchAgent::new(client.clone(), self.search.clone()),
            summarizer: SummarizerAgent::new(client),
            request,
        };

        Ok(stream::unfold(Turn::Searching(run), next_turn).fuse().boxed())
    }
}

struct Run {
    searcher: SearchAgent,
    summarizer: SummarizerAgent,
    request: ReviewRequest,
}

enum Turn {
    Searching(Run),
    Summarizing(Run, Vec<PaperRecord>),
    Done,
}

type Step = Option<(Result<ConversationLine, PipelineError>, Turn)>;

async fn next_turn(turn: Turn) -> Step {
    match turn {
        Turn::Searching(run) => match search_turn(&run).await {
            Ok((content, papers)) => {
                info!("search_agent turn complete, handing {} papers to summarizer", papers.len());
                let line = ConversationLine { source: RoleId::SearchAgent, content };
                Some((Ok(line), Turn::Summarizing(run, papers)))
            }
            Err(source) => Some((Err(upstream(RoleId::SearchAgent, source)), Turn::Done)),
        },
        Turn::Summarizing(run, papers) => {
            let input = SummaryInput {
                topic: run.request.topic.clone(),
                papers,
            };
            match run.summarizer.execute(&input).await {
                Ok(content) => {
                    info!("summarizer turn complete, review finished");
                    let line = ConversationLine { source: RoleId::Summarizer, content };
                    Some((Ok(line), Turn::Done))
                }
                Err(source) => Some((Err(upstream(RoleId::Summarizer, source)), Turn::Done)),
            }
        }
        Turn::Done => None,
    }
}

async fn search_turn(run: &Run) -> Result<(String, Vec<PaperRecord>), AgentError> {
    let input = SearchInput {
        task: run.request.task_prompt(),
        num_papers: run.request.num_papers,
    };
    let turn = run.searcher.execute(&input).await?;
    info!(
        "search_agent queried '{}' and kept {} of {} candidates",
        turn.query,
        turn.papers.len(),
        turn.candidates
    );
    let content = turn.content()?;
    Ok((content, turn.papers))
}

fn upstream(role: RoleId, source: AgentError) -> PipelineError {
    error!("{} turn failed: {}", role, source);
    PipelineError::Upstream { role, source }
}
