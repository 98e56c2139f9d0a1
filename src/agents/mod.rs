use async_trait::async_trait;

use crate::types::RoleId;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] crate::llm::LlmError),
    #[error(transparent)]
    Search(#[from] crate::arxiv::SearchError),
    #[error("malformed structured output: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unexpected model reply: {0}")]
    UnexpectedReply(String),
}

/// A conversational participant that produces one turn per call.
#[async_trait]
pub trait Agent {
    type Input: Send + Sync;
    type Output: Send + Sync;
    fn role(&self) -> RoleId;
    async fn execute(&self, input: &Self::Input) -> Result<Self::Output, AgentError>;
}

pub mod searcher;
pub mod summarizer;

pub use searcher::{SearchAgent, SearchInput};
pub use summarizer::{SummarizerAgent, SummaryInput};

/// Strip a Markdown code fence the model may wrap around JSON.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::arxiv::{PaperSearch, SearchError};
    use crate::llm::{ChatReply, CompletionRequest, FunctionCall, LlmClient, LlmError, ToolCall};
    use crate::types::PaperRecord;

    /// LLM stub that replays scripted replies in order.
    pub struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<ChatReply, LlmError>>>,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedLlm {
        pub fn new(replies: Vec<Result<ChatReply, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, request: CompletionRequest) -> Result<ChatReply, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::ParseError { message: "script exhausted".into() }))
        }
    }

    pub fn tool_call_reply(query: &str, max_results: u32) -> ChatReply {
        ChatReply {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_0".into(),
                call_type: "function".into(),
                function: FunctionCall {
                    name: "arxiv_search".into(),
                    arguments: serde_json::json!({"query": query, "max_results": max_results}).to_string(),
                },
            }],
        }
    }

    pub fn text_reply(content: &str) -> ChatReply {
        ChatReply {
            content: Some(content.to_string()),
            tool_calls: Vec::new(),
        }
    }

    pub fn paper(i: usize) -> PaperRecord {
        PaperRecord {
            title: format!("Paper {i}"),
            authors: vec![format!("Author {i}")],
            published: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            summary: format!("Paper {i} studies problem {i}. It proposes method {i}."),
            pdf_url: format!("http://arxiv.org/pdf/2401.{i:05}"),
        }
    }

    /// Search stub returning deterministic ranked fixtures and counting calls.
    pub struct StubSearch {
        pub calls: AtomicUsize,
        pub limits: Mutex<Vec<usize>>,
        pub queries: Mutex<Vec<String>>,
        pub fail: bool,
    }

    impl StubSearch {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                limits: Mutex::new(Vec::new()),
                queries: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self { fail: true, ..Self::new() }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaperSearch for StubSearch {
        async fn search(&self, query: &str, limit: usize) -> Result<Vec<PaperRecord>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.limits.lock().unwrap().push(limit);
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(SearchError::Status { status: 503 });
            }
            Ok((1..=limit).map(paper).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::strip_code_fence;

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }
}
