//! NCBI E-utilities client for PubMed Central.
//!
//! Covers the three upstream surfaces the pipeline needs:
//! - `esearch.fcgi` full-text search returning an ordered id list
//! - `efetch.fcgi` per-article structured content (JATS XML, reduced to a
//!   title/abstract/excerpt JSON payload)
//! - the public article HTML page, fetched raw for figure extraction
//!
//! Every request carries the configured contact email and, when present, the
//! NCBI API key. Ids are bare PMC accession numbers (digits, no `PMC` prefix).

use crate::error::{PipelineError, Result};
use crate::pipeline::LiteratureStore;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Default E-utilities base URL
pub const DEFAULT_EUTILS_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Base URL for public PMC article pages
pub const PMC_ARTICLE_BASE: &str = "https://www.ncbi.nlm.nih.gov/pmc/articles";

/// Search term filter restricting results to freely available full text
const FULL_TEXT_FILTER: &str = "free fulltext[filter]";

/// Character cap on the body excerpt included in content payloads
const BODY_EXCERPT_CHARS: usize = 4000;

/// Canonical public URL for a PMC article, from its bare numeric id
pub fn article_url(id: &str) -> String {
    format!("{}/PMC{}/", PMC_ARTICLE_BASE, id.trim())
}

/// Search result ordering requested from esearch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Upstream relevance ranking
    #[default]
    Relevance,
    /// Most recent publication first
    Date,
}

impl SortMode {
    /// Parse a CLI/config string
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "relevance" => Ok(Self::Relevance),
            "date" => Ok(Self::Date),
            other => Err(PipelineError::Config(format!(
                "Invalid sort mode '{}' (expected 'relevance' or 'date')",
                other
            ))),
        }
    }

    /// Value of the esearch `sort` parameter
    fn as_param(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Date => "pub date",
        }
    }
}

/// PubMed Central client over NCBI E-utilities
pub struct PmcClient {
    client: reqwest::Client,
    base_url: String,
    email: String,
    api_key: Option<String>,
}

// === esearch response types ===

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    esearchresult: EsearchResult,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

impl PmcClient {
    /// Create a new PmcClient
    ///
    /// # Arguments
    ///
    /// * `email` - Contact email sent with every E-utilities request
    /// * `api_key` - Optional NCBI API key (raises the rate limit)
    pub fn new(email: String, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("bioanswer/1.0 (mailto:{})", email))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFAULT_EUTILS_URL.to_string(),
            email,
            api_key,
        })
    }

    /// Build an E-utilities endpoint URL with the shared identity parameters
    fn build_eutils_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, endpoint))
            .map_err(|e| PipelineError::Config(format!("Invalid E-utilities URL: {}", e)))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("db", "pmc");
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("email", &self.email);
            if let Some(key) = &self.api_key {
                pairs.append_pair("api_key", key);
            }
        }

        Ok(url)
    }

    /// Build the esearch URL for a keyword term
    fn build_search_url(&self, term: &str, sort: SortMode, retmax: u32) -> Result<Url> {
        let filtered_term = format!("{} AND {}", term, FULL_TEXT_FILTER);
        self.build_eutils_url(
            "esearch.fcgi",
            &[
                ("term", filtered_term.as_str()),
                ("retmode", "json"),
                ("sort", sort.as_param()),
                ("retmax", &retmax.to_string()),
            ],
        )
    }

    /// Send a GET request and surface rate-limit/API failures as typed errors
    async fn fetch_text(&self, url: Url) -> Result<String> {
        let response = self
            .client
            .get(url.as_str())
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PipelineError::RateLimited(60));
        }

        if !status.is_success() {
            return Err(PipelineError::Api {
                code: status.as_u16() as i32,
                message: format!("HTTP error: {}", status),
            });
        }

        response.text().await.map_err(PipelineError::Network)
    }
}

#[async_trait]
impl LiteratureStore for PmcClient {
    async fn search(&self, term: &str, sort: SortMode, retmax: u32) -> Result<Vec<String>> {
        let url = self.build_search_url(term, sort, retmax)?;
        debug!(url = %url, "esearch request");

        let body = self.fetch_text(url).await?;
        let data: EsearchResponse = serde_json::from_str(&body)
            .map_err(|e| PipelineError::Parse(format!("Failed to parse esearch response: {}", e)))?;

        info!(count = data.esearchresult.idlist.len(), "esearch complete");
        Ok(data.esearchresult.idlist)
    }

    async fn fetch_content(&self, id: &str) -> Result<serde_json::Value> {
        let url = self.build_eutils_url("efetch.fcgi", &[("id", id), ("retmode", "xml")])?;
        debug!(id = %id, "efetch request");

        let xml = self.fetch_text(url).await?;
        Ok(parse_article_xml(&xml, id))
    }

    async fn fetch_article_html(&self, id: &str) -> Result<String> {
        let url = Url::parse(&article_url(id))
            .map_err(|e| PipelineError::Config(format!("Invalid article URL: {}", e)))?;
        debug!(id = %id, "article page request");

        self.fetch_text(url).await
    }

    fn article_page_url(&self, id: &str) -> String {
        article_url(id)
    }
}

/// Reduce a JATS efetch document to the payload fields the synthesizer uses.
///
/// Field extraction is pattern based and best effort; a payload with default
/// title/abstract strings is still a valid success payload.
fn parse_article_xml(xml: &str, id: &str) -> serde_json::Value {
    let title =
        capture_tag_text(xml, "article-title").unwrap_or_else(|| "No title available".to_string());
    let abstract_text =
        capture_tag_text(xml, "abstract").unwrap_or_else(|| "No abstract available".to_string());
    let excerpt = capture_tag_text(xml, "body")
        .map(|text| truncate_chars(&text, BODY_EXCERPT_CHARS))
        .unwrap_or_default();

    serde_json::json!({
        "id": id,
        "title": title,
        "abstract": abstract_text,
        "excerpt": excerpt,
    })
}

/// First occurrence of `<tag ...>...</tag>`, tags stripped, whitespace collapsed
fn capture_tag_text(xml: &str, tag: &str) -> Option<String> {
    let pattern = format!(r"(?s)<{tag}[^>]*>(.*?)</{tag}>");
    let re = Regex::new(&pattern).ok()?;
    let inner = re.captures(xml)?.get(1)?.as_str();
    let text = normalize_whitespace(&strip_tags(inner));
    (!text.is_empty()).then_some(text)
}

/// Strip XML/HTML tags from text
fn strip_tags(text: &str) -> String {
    match Regex::new(r"<[^>]+>") {
        Ok(re) => re.replace_all(text, " ").into_owned(),
        Err(_) => text.to_string(),
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}
