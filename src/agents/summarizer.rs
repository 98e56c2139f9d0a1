use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::llm::{ChatMessage, CompletionRequest, LlmClient};
use crate::types::{PaperNotes, PaperRecord, ReviewDraft, RoleId};

use super::{Agent, AgentError, strip_code_fence};

const SYSTEM_PROMPT: &str = r#"
You are an expert researcher. When given paper JSON, write a short literature review.
Respond ONLY with a JSON object of this shape:
{
  "introduction": "2-3 sentence introduction to the topic (string)",
  "papers": [
    {
      "problem": "The problem this paper addresses, one sentence (string)",
      "contribution": "The paper's main contribution, one sentence (string)"
    }
  ],
  "takeaway": "One-sentence takeaway across all papers (string)"
}
The "papers" array must have exactly one entry per input paper, in the same order.
"#;

const NOT_STATED: &str = "Not stated.";

#[derive(Clone)]
pub struct SummarizerAgent {
    client: Arc<dyn LlmClient>,
}

impl SummarizerAgent {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

pub struct SummaryInput {
    pub topic: String,
    pub papers: Vec<PaperRecord>,
}

#[async_trait]
impl Agent for SummarizerAgent {
    type Input = SummaryInput;
    type Output = String;

    fn role(&self) -> RoleId {
        RoleId::Summarizer
    }

    async fn execute(&self, input: &Self::Input) -> Result<Self::Output, AgentError> {
        let papers_json = serde_json::to_string_pretty(&input.papers)?;
        let prompt = format!("Topic: {}\n\nPapers:\n{}", input.topic, papers_json);
        let request = CompletionRequest {
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            tools: Vec::new(),
            require_tool: false,
            json_output: true,
        };

        info!("SummarizerAgent: summarizing {} papers", input.papers.len());
        let reply = self.client.complete(request).await?;
        if !reply.tool_calls.is_empty() {
            return Err(AgentError::UnexpectedReply(format!(
                "{} issued a tool call instead of a review",
                self.role()
            )));
        }
        let raw = reply.content.ok_or_else(|| {
            AgentError::UnexpectedReply(format!("{} returned no content", self.role()))
        })?;

        let draft: ReviewDraft = serde_json::from_str(strip_code_fence(&raw))?;
        if draft.papers.len() != input.papers.len() {
            warn!(
                "SummarizerAgent: model described {} papers, expected {}",
                draft.papers.len(),
                input.papers.len()
            );
        }
        Ok(render_review(&input.topic, &draft, &input.papers))
    }
}

/// Render the fixed-format Markdown report: introduction, one bullet per
/// paper, takeaway. Notes are matched to papers by position.
pub fn render_review(topic: &str, draft: &ReviewDraft, papers: &[PaperRecord]) -> String {
    let mut out = String::new();

    let intro = draft.introduction.trim();
    if intro.is_empty() {
        out.push_str(&format!("This review covers {} papers on {}.", papers.len(), topic));
    } else {
        out.push_str(intro);
    }
    out.push_str("\n\n");

    let fallback = PaperNotes::default();
    for (paper, notes) in papers
        .iter()
        .zip(draft.papers.iter().chain(std::iter::repeat(&fallback)))
    {
        let problem = non_empty(&notes.problem).unwrap_or_else(|| first_sentence(&paper.summary));
        let contribution = non_empty(&notes.contribution).unwrap_or(NOT_STATED);
        out.push_str(&format!(
            "- [{}]({}) by {} ({}). **Problem:** {} **Contribution:** {}\n",
            escape_link_text(&paper.title),
            paper.pdf_url,
            format_authors(&paper.authors),
            paper.published.format("%Y"),
            problem,
            contribution
        ));
    }

    let takeaway = non_empty(&draft.takeaway).unwrap_or(NOT_STATED);
    out.push_str(&format!("\n**Takeaway:** {}", takeaway));
    out
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    if text.is_empty() {
        return NOT_STATED;
    }
    match text.find(". ") {
        Some(idx) => &text[..=idx],
        None => text,
    }
}

fn format_authors(authors: &[String]) -> String {
    match authors {
        [] => "unknown authors".to_string(),
        [a] => a.clone(),
        [a, b] => format!("{a} and {b}"),
        [a, b, c] => format!("{a}, {b} and {c}"),
        [a, ..] => format!("{a} et al."),
    }
}

fn escape_link_text(title: &str) -> String {
    title.replace('[', "\\[").replace(']', "\\]")
}
