use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One paper as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(with = "published_date")]
    pub published: NaiveDate,
    pub summary: String,
    pub pdf_url: String,
}

mod published_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

pub const MIN_PAPERS: u8 = 1;
pub const MAX_PAPERS: u8 = 10;

/// Input for a single review run.
#[derive(Clone)]
pub struct ReviewRequest {
    pub topic: String,
    pub num_papers: u8,
    pub credential: String,
}

impl ReviewRequest {
    pub fn new(topic: impl Into<String>, num_papers: u8, credential: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            num_papers,
            credential: credential.into(),
        }
    }

    /// Opening message handed to the first role.
    pub fn task_prompt(&self) -> String {
        format!(
            "Conduct a literature review on **{}** and return exactly {} papers.",
            self.topic, self.num_papers
        )
    }
}

impl fmt::Debug for ReviewRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewRequest")
            .field("topic", &self.topic)
            .field("num_papers", &self.num_papers)
            .field("credential", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleId {
    SearchAgent,
    Summarizer,
}

impl RoleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleId::SearchAgent => "search_agent",
            RoleId::Summarizer => "summarizer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RoleId::SearchAgent => "Crafts arXiv queries and retrieves candidate papers.",
            RoleId::Summarizer => "Produces a Markdown literature review.",
        }
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed turn, labeled with the role that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationLine {
    pub source: RoleId,
    pub content: String,
}

impl fmt::Display for ConversationLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.content)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperNotes {
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub contribution: String,
}

/// Structured summarizer output; rendered into Markdown by the summarizer agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewDraft {
    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub papers: Vec<PaperNotes>,
    #[serde(default)]
    pub takeaway: String,
}
