use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::arxiv::{self, PaperSearch};
use crate::llm::{ChatMessage, CompletionRequest, LlmClient};
use crate::types::{PaperRecord, RoleId};

use super::{Agent, AgentError};

/// How many candidates to fetch per requested paper.
pub const CANDIDATE_FACTOR: usize = 5;

const SYSTEM_PROMPT: &str = "\
Given a user topic, think of the best arXiv query and call the provided tool. \
Fetch five-times the requested number, then select exactly the requested number \
and pass them as JSON.";

#[derive(Clone)]
pub struct SearchAgent {
    client: Arc<dyn LlmClient>,
    search: Arc<dyn PaperSearch>,
}

impl SearchAgent {
    pub fn new(client: Arc<dyn LlmClient>, search: Arc<dyn PaperSearch>) -> Self {
        Self { client, search }
    }
}

pub struct SearchInput {
    /// Opening task message
    pub task: String,
    pub num_papers: u8,
}

#[derive(Debug, Clone)]
pub struct SearchTurn {
    pub query: String,
    pub candidates: usize,
    pub papers: Vec<PaperRecord>,
}

impl SearchTurn {
    /// The structured list handed to the next role.
    pub fn content(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.papers)
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    max_results: Option<u64>,
}

/// Keep the first `n` papers in relevance order, skipping repeated titles.
pub fn select_papers(candidates: Vec<PaperRecord>, n: usize) -> Vec<PaperRecord> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|p| seen.insert(p.title.to_lowercase()))
        .take(n)
        .collect()
}

#[async_trait]
impl Agent for SearchAgent {
    type Input = SearchInput;
    type Output = SearchTurn;

    fn role(&self) -> RoleId {
        RoleId::SearchAgent
    }

    async fn execute(&self, input: &Self::Input) -> Result<Self::Output, AgentError> {
        let request = CompletionRequest {
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(&input.task)],
            tools: vec![arxiv::tool_definition()],
            require_tool: true,
            json_output: false,
        };

        info!("SearchAgent: asking model for an arXiv query");
        let reply = self.client.complete(request).await?;

        let call = reply.tool_calls.first().ok_or_else(|| {
            AgentError::UnexpectedReply(format!(
                "{} answered without calling {}",
                self.role(),
                arxiv::TOOL_NAME
            ))
        })?;
        if call.function.name != arxiv::TOOL_NAME {
            return Err(AgentError::UnexpectedReply(format!(
                "{} called unknown tool '{}'",
                self.role(),
                call.function.name
            )));
        }
        if reply.tool_calls.len() > 1 {
            warn!(
                "SearchAgent: model issued {} tool calls, using the first",
                reply.tool_calls.len()
            );
        }

        let args: SearchArgs = call.parse_arguments().and_then(serde_json::from_value).map_err(|e| {
            AgentError::UnexpectedReply(format!("invalid {} arguments: {e}", arxiv::TOOL_NAME))
        })?;

        let wanted = usize::from(input.num_papers);
        let fetch = wanted * CANDIDATE_FACTOR;
        if let Some(requested) = args.max_results
            && requested != fetch as u64
        {
            debug!("SearchAgent: overriding max_results {} with {}", requested, fetch);
        }

        info!("SearchAgent: searching arXiv for '{}' ({} candidates)", args.query, fetch);
        let candidates = self.search.search(&args.query, fetch).await?;
        let candidate_count = candidates.len();
        let papers = select_papers(candidates, wanted);
        if papers.len() < wanted {
            warn!(
                "SearchAgent: only {} of {} requested papers available",
                papers.len(),
                wanted
            );
        }
        debug!("SearchAgent: selected {} of {} candidates", papers.len(), candidate_count);

        Ok(SearchTurn {
            query: args.query,
            candidates: candidate_count,
            papers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{ScriptedLlm, StubSearch, paper, text_reply, tool_call_reply};

    fn input(n: u8) -> SearchInput {
        SearchInput {
            task: "Conduct a literature review on **transformers** and return exactly 3 papers.".into(),
            num_papers: n,
        }
    }

    #[test]
    fn select_keeps_relevance_order_and_drops_duplicates() {
        let mut dup = paper(1);
        dup.pdf_url = "elsewhere".into();
        let picked = select_papers(vec![paper(1), dup, paper(2), paper(3), paper(4)], 3);
        let titles: Vec<_> = picked.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Paper 1", "Paper 2", "Paper 3"]);
        assert_eq!(picked[0].pdf_url, paper(1).pdf_url);
    }

    #[tokio::test]
    async fn fetches_five_times_and_selects_requested_count() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(tool_call_reply("all:transformers", 5))]));
        let search = Arc::new(StubSearch::new());
        let agent = SearchAgent::new(llm.clone(), search.clone());

        let turn = agent.execute(&input(3)).await.unwrap();

        assert_eq!(*search.limits.lock().unwrap(), vec![15]);
        assert_eq!(*search.queries.lock().unwrap(), vec!["all:transformers".to_string()]);
        assert_eq!(turn.candidates, 15);
        assert_eq!(turn.papers.len(), 3);

        let listed: Vec<PaperRecord> = serde_json::from_str(&turn.content().unwrap()).unwrap();
        assert_eq!(listed, turn.papers);

        let requests = llm.requests.lock().unwrap();
        assert!(requests[0].require_tool);
        assert_eq!(requests[0].tools[0].name, "arxiv_search");
    }

    #[tokio::test]
    async fn text_reply_is_rejected_without_searching() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(text_reply("here are some papers"))]));
        let search = Arc::new(StubSearch::new());
        let agent = SearchAgent::new(llm, search.clone());

        let err = agent.execute(&input(2)).await.unwrap_err();
        assert!(matches!(err, AgentError::UnexpectedReply(_)));
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test]
    async fn search_failure_propagates() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(tool_call_reply("llm", 10))]));
        let search = Arc::new(StubSearch::failing());
        let agent = SearchAgent::new(llm, search);

        let err = agent.execute(&input(2)).await.unwrap_err();
        assert!(matches!(err, AgentError::Search(_)));
    }
}
