//! Per-article content and figure fetching.
//!
//! For every article id the fetcher runs two independent upstream calls: the
//! structured-content fetch and the article-page fetch feeding figure
//! extraction. Document availability is per-article and flaky, so each
//! failure is recorded as an inline error marker keyed by id; no per-article
//! failure ever aborts the batch. Fan-out is concurrent with bounded
//! parallelism to respect the upstream rate limit.

use crate::figures::{extract_figures, FigureInfo};
use crate::pipeline::LiteratureStore;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Maximum concurrent article fetches (NCBI allows 3 req/s unauthenticated)
const MAX_CONCURRENT_FETCHES: usize = 3;

/// Error marker stored when the structured-content fetch fails
pub const SUMMARY_ERROR: &str = "Failed to fetch summary";

/// Error marker stored when the article-page/figure fetch fails
pub const FIGURES_ERROR: &str = "Failed to fetch figures";

/// Per-article figure outcome: an ordered capped list, or an error marker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FigureEntry {
    /// Figures extracted from the article page, in document order
    Figures(Vec<FigureInfo>),
    /// The page could not be fetched
    Error { error: String },
}

impl FigureEntry {
    /// True when this entry is an error marker
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// The two keyed result maps produced by one fan-out run.
///
/// Both maps cover exactly the requested id set; each entry is independently
/// a success payload or an error marker.
#[derive(Debug, Default)]
pub struct FetchedContent {
    /// Structured content payload (or `{"error": ...}`) per id
    pub summaries: HashMap<String, serde_json::Value>,
    /// Extracted figures (or error marker) per id
    pub figures: HashMap<String, FigureEntry>,
}

/// Fetch content and figures for every id, capturing per-id failures inline.
pub async fn fetch_articles(
    store: &dyn LiteratureStore,
    ids: &[String],
    figure_cap: usize,
) -> FetchedContent {
    if ids.is_empty() {
        return FetchedContent::default();
    }

    info!(count = ids.len(), figure_cap = figure_cap, "Starting article fan-out");

    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES));

    let entries: Vec<(String, serde_json::Value, FigureEntry)> =
        stream::iter(ids.iter().cloned())
            .map(|id| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    let _permit = semaphore.acquire().await.ok()?;

                    let summary = match store.fetch_content(&id).await {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(id = %id, error = %e, "Content fetch failed");
                            serde_json::json!({ "error": SUMMARY_ERROR })
                        }
                    };

                    let figures = match store.fetch_article_html(&id).await {
                        Ok(html) => FigureEntry::Figures(extract_figures(
                            &html,
                            &store.article_page_url(&id),
                            figure_cap,
                        )),
                        Err(e) => {
                            warn!(id = %id, error = %e, "Figure fetch failed");
                            FigureEntry::Error {
                                error: FIGURES_ERROR.to_string(),
                            }
                        }
                    };

                    Some((id, summary, figures))
                }
            })
            .buffer_unordered(MAX_CONCURRENT_FETCHES)
            .filter_map(|entry| async { entry })
            .collect()
            .await;

    let mut content = FetchedContent::default();
    for (id, summary, figures) in entries {
        content.summaries.insert(id.clone(), summary);
        content.figures.insert(id, figures);
    }

    info!(
        summaries = content.summaries.len(),
        figures = content.figures.len(),
        "Article fan-out complete"
    );

    content
}
