//! arXiv search adapter.
//!
//! Queries the public Atom API (https://info.arxiv.org/help/api/) and turns the
//! feed entries into [`PaperRecord`]s, keeping the feed's relevance order.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::ToolDefinition;
use crate::types::PaperRecord;

pub const TOOL_NAME: &str = "arxiv_search";
pub const TOOL_DESCRIPTION: &str = "Searches arXiv and returns relevant papers.";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search query must not be empty")]
    EmptyQuery,

    #[error("arXiv request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("arXiv returned status {status}")]
    Status { status: u16 },

    #[error("failed to parse arXiv feed: {0}")]
    Parse(String),
}

/// Relevance-ranked lookup against a paper catalog.
#[async_trait]
pub trait PaperSearch: Send + Sync {
    /// Return at most `limit` papers for `query`, best match first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PaperRecord>, SearchError>;
}

/// Definition of the search tool offered to the model.
pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: TOOL_NAME.to_string(),
        description: TOOL_DESCRIPTION.to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "arXiv search query, e.g. 'all:transformers AND cat:cs.CL'"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of papers to return",
                    "default": 5
                }
            },
            "required": ["query"]
        }),
    }
}

/// Client for the arXiv API
#[derive(Debug, Clone)]
pub struct ArxivClient {
    client: Client,
    base_url: String,
}

impl ArxivClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("litrev_agents/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create a new client with an existing reqwest client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaperSearch for ArxivClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PaperRecord>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/api/query?search_query={}&start=0&max_results={}&sortBy=relevance&sortOrder=descending",
            self.base_url,
            urlencoding::encode(query),
            limit
        );
        debug!("arXiv search: {} (limit {})", query, limit);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(SearchError::Status {
                status: resp.status().as_u16(),
            });
        }
        let feed = resp.text().await?;

        let mut papers = parse_feed(&feed)?;
        papers.truncate(limit);
        debug!("arXiv returned {} papers for '{}'", papers.len(), query);
        Ok(papers)
    }
}

static ENTRY: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)<entry>(.*?)</entry>"));
static ID: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)<id>(.*?)</id>"));
static TITLE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)<title[^>]*>(.*?)</title>"));
static SUMMARY: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)<summary[^>]*>(.*?)</summary>"));
static PUBLISHED: LazyLock<Regex> = LazyLock::new(|| compile(r"<published>([^<]+)</published>"));
static AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?s)<author>\s*<name>(.*?)</name>"));
static LINK: LazyLock<Regex> = LazyLock::new(|| compile(r"<link\s[^>]*>"));
static HREF: LazyLock<Regex> = LazyLock::new(|| compile(r#"href="([^"]+)""#));
static FEED_ERROR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?s)<id>https?://arxiv\.org/api/errors[^<]*</id>.*?<summary>(.*?)</summary>"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex must compile")
}

/// Parse an Atom feed into paper records, in document order.
///
/// Entries missing any of id, title, abstract, authors or a parseable publish
/// date are skipped.
pub fn parse_feed(xml: &str) -> Result<Vec<PaperRecord>, SearchError> {
    if !xml.contains("<feed") {
        return Err(SearchError::Parse("response is not an Atom feed".to_string()));
    }
    if let Some(cap) = FEED_ERROR.captures(xml) {
        return Err(SearchError::Parse(clean_text(&cap[1])));
    }

    let mut papers = Vec::new();
    for entry in ENTRY.captures_iter(xml) {
        match parse_entry(&entry[1]) {
            Some(paper) => papers.push(paper),
            None => warn!("Skipping incomplete arXiv entry"),
        }
    }
    Ok(papers)
}

fn parse_entry(entry: &str) -> Option<PaperRecord> {
    let id = clean_text(&ID.captures(entry)?[1]);
    let title = clean_text(&TITLE.captures(entry)?[1]);
    if id.is_empty() || title.is_empty() {
        return None;
    }

    let summary = clean_text(&SUMMARY.captures(entry)?[1]);
    let published = parse_published(&PUBLISHED.captures(entry)?[1])?;
    let authors: Vec<String> = AUTHOR
        .captures_iter(entry)
        .map(|c| clean_text(&c[1]))
        .filter(|name| !name.is_empty())
        .collect();
    if summary.is_empty() || authors.is_empty() {
        return None;
    }

    let pdf_url = LINK
        .find_iter(entry)
        .map(|m| m.as_str())
        .find(|tag| tag.contains(r#"title="pdf""#))
        .and_then(|tag| HREF.captures(tag).map(|c| decode_entities(&c[1])))
        .unwrap_or_else(|| id.replacen("/abs/", "/pdf/", 1));

    Some(PaperRecord {
        title,
        authors,
        published,
        summary,
        pdf_url,
    })
}

fn parse_published(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok())
}

/// Decode XML entities and collapse runs of whitespace.
fn clean_text(raw: &str) -> String {
    decode_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

static CHAR_REF: LazyLock<Regex> = LazyLock::new(|| compile(r"&#(x[0-9a-fA-F]+|[0-9]+);"));

fn decode_entities(raw: &str) -> String {
    let numeric = CHAR_REF.replace_all(raw, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    numeric
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
