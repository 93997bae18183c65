//! Query orchestration pipeline.
//!
//! Sequences keyword extraction, article search, per-article content/figure
//! fetching and answer synthesis, then assembles the result envelope. Stage
//! transitions are strictly forward with no retries; an empty search result
//! is the distinct [`PipelineOutcome::NoResults`] terminal state rather than
//! an error. Upstream services are injected as trait objects at
//! construction, so the orchestrator itself carries no ambient state.

use crate::error::{PipelineError, Result};
use crate::fetcher::{self, FigureEntry};
use crate::keywords;
use crate::pmc::SortMode;
use crate::synthesis;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Generative-language service: one prompt in, one text completion out
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one chat completion with a system and user prompt
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Literature database: search, per-article content, and article pages
#[async_trait]
pub trait LiteratureStore: Send + Sync {
    /// Full-text search returning an ordered list of article ids
    async fn search(&self, term: &str, sort: SortMode, retmax: u32) -> Result<Vec<String>>;

    /// Structured content payload for one article
    async fn fetch_content(&self, id: &str) -> Result<serde_json::Value>;

    /// Raw HTML of the article's public page
    async fn fetch_article_html(&self, id: &str) -> Result<String>;

    /// Public page URL for an article (citation targets, figure-link bases)
    fn article_page_url(&self, id: &str) -> String;
}

/// Per-request pipeline tuning
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Search result ordering
    pub sort: SortMode,
    /// Maximum article ids requested from the search
    pub retmax: u32,
    /// Maximum figures extracted per article
    pub figure_cap: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sort: SortMode::Relevance,
            retmax: 20,
            figure_cap: 1,
        }
    }
}

/// The externally visible result of one successful pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultEnvelope {
    /// Cited narrative answer (HTML anchors on citations)
    pub summary: String,
    /// Extracted figures (or error marker) keyed by article id
    pub figures: HashMap<String, FigureEntry>,
}

/// Terminal pipeline states that are not failures
#[derive(Debug)]
pub enum PipelineOutcome {
    /// All stages ran; the envelope carries the answer and figures
    Complete(SearchResultEnvelope),
    /// The search matched no articles; later stages never ran
    NoResults,
}

/// Query orchestration pipeline over injected upstream services
pub struct Pipeline {
    model: Arc<dyn TextGenerator>,
    literature: Arc<dyn LiteratureStore>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline over the given upstream handles
    pub fn new(
        model: Arc<dyn TextGenerator>,
        literature: Arc<dyn LiteratureStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            model,
            literature,
            config,
        }
    }

    /// Run the full pipeline for one question.
    ///
    /// Fatal stage failures surface as stage-tagged errors; per-article fetch
    /// failures are captured inline in the envelope instead.
    pub async fn run(&self, question: &str) -> Result<PipelineOutcome> {
        info!(question = %question, "Pipeline start");

        let term = keywords::extract_keywords(self.model.as_ref(), question).await?;
        info!(keywords = %term, "Extracted search keywords");

        let ids = self
            .literature
            .search(&term, self.config.sort, self.config.retmax)
            .await
            .map_err(|e| PipelineError::Search(e.to_string()))?;

        if ids.is_empty() {
            info!("No articles found");
            return Ok(PipelineOutcome::NoResults);
        }
        info!(count = ids.len(), "Located articles");

        let content =
            fetcher::fetch_articles(self.literature.as_ref(), &ids, self.config.figure_cap).await;

        let summary =
            synthesis::synthesize_answer(self.model.as_ref(), question, &content.summaries).await?;

        Ok(PipelineOutcome::Complete(SearchResultEnvelope {
            summary,
            figures: content.figures,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::fetcher::{FIGURES_ERROR, SUMMARY_ERROR};
    use crate::prompts;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Model stub answering the keyword prompt with fixed keywords and the
    /// synthesis prompt with a fixed cited answer, recording what it saw.
    struct ScriptedModel {
        keywords: String,
        answer: String,
        fail_keywords: bool,
        fail_synthesis: bool,
        synthesis_prompts: Mutex<Vec<String>>,
        synthesis_calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(keywords: &str, answer: &str) -> Self {
            Self {
                keywords: keywords.to_string(),
                answer: answer.to_string(),
                fail_keywords: false,
                fail_synthesis: false,
                synthesis_prompts: Mutex::new(Vec::new()),
                synthesis_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedModel {
        async fn complete(&self, system: &str, user: &str) -> Result<String> {
            if system == prompts::keyword_extraction::SYSTEM_PROMPT {
                if self.fail_keywords {
                    return Err(PipelineError::Api {
                        code: 500,
                        message: "model down".to_string(),
                    });
                }
                return Ok(self.keywords.clone());
            }

            self.synthesis_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_synthesis {
                return Err(PipelineError::Api {
                    code: 500,
                    message: "model down".to_string(),
                });
            }
            self.synthesis_prompts
                .lock()
                .expect("prompt log lock")
                .push(user.to_string());
            Ok(self.answer.clone())
        }
    }

    /// Literature stub serving a fixed id list and per-id scripted failures.
    struct ScriptedStore {
        ids: Vec<String>,
        failing_content: HashSet<String>,
        failing_pages: HashSet<String>,
        content_calls: AtomicUsize,
        page_calls: AtomicUsize,
    }

    impl ScriptedStore {
        fn new(ids: &[&str]) -> Self {
            Self {
                ids: ids.iter().map(|s| s.to_string()).collect(),
                failing_content: HashSet::new(),
                failing_pages: HashSet::new(),
                content_calls: AtomicUsize::new(0),
                page_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LiteratureStore for ScriptedStore {
        async fn search(&self, _term: &str, _sort: SortMode, _retmax: u32) -> Result<Vec<String>> {
            Ok(self.ids.clone())
        }

        async fn fetch_content(&self, id: &str) -> Result<serde_json::Value> {
            self.content_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_content.contains(id) {
                return Err(PipelineError::Api {
                    code: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(serde_json::json!({ "id": id, "title": format!("Article {id}") }))
        }

        async fn fetch_article_html(&self, id: &str) -> Result<String> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_pages.contains(id) {
                return Err(PipelineError::Api {
                    code: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(format!(
                r#"<html><body><a href="/pmc/articles/PMC{id}/figure/F1/"><img src="/pmc/articles/PMC{id}/bin/f1.jpg"></a></body></html>"#
            ))
        }

        fn article_page_url(&self, id: &str) -> String {
            format!("https://www.ncbi.nlm.nih.gov/pmc/articles/PMC{id}/")
        }
    }

    fn pipeline_with(model: ScriptedModel, store: ScriptedStore) -> (Pipeline, Arc<ScriptedModel>, Arc<ScriptedStore>) {
        let model = Arc::new(model);
        let store = Arc::new(store);
        let pipeline = Pipeline::new(
            Arc::clone(&model) as Arc<dyn TextGenerator>,
            Arc::clone(&store) as Arc<dyn LiteratureStore>,
            PipelineConfig::default(),
        );
        (pipeline, model, store)
    }

    #[tokio::test]
    async fn test_happy_path_envelope() {
        let model = ScriptedModel::new("gene editing cancer", "Editing helps [PMC1, PMC2]. Done.");
        let store = ScriptedStore::new(&["1", "2"]);
        let (pipeline, _model, _store) = pipeline_with(model, store);

        let outcome = pipeline.run("Does gene editing help?").await.expect("runs");
        let envelope = match outcome {
            PipelineOutcome::Complete(envelope) => envelope,
            PipelineOutcome::NoResults => panic!("expected a complete envelope"),
        };

        assert!(!envelope.summary.is_empty());
        // citation markers were rewritten into anchors
        assert!(envelope.summary.contains(r#"<a href="https://www.ncbi.nlm.nih.gov/pmc/articles/PMC1/""#));
        assert!(envelope.summary.contains(">PMC2</a>"));
        // figure keys match the located id set
        let mut keys: Vec<&str> = envelope.figures.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_no_results_short_circuits() {
        let model = ScriptedModel::new("rare disease", "unused");
        let store = ScriptedStore::new(&[]);
        let (pipeline, model, store) = pipeline_with(model, store);

        let outcome = pipeline.run("Anything on this?").await.expect("runs");
        assert!(matches!(outcome, PipelineOutcome::NoResults));
        // neither the fetcher nor the synthesizer ever ran
        assert_eq!(store.content_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.page_calls.load(Ordering::SeqCst), 0);
        assert_eq!(model.synthesis_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mixed_per_article_failures() {
        let model = ScriptedModel::new("sepsis outcomes", "Mixed evidence [PMC1]. Gaps remain.");
        let mut store = ScriptedStore::new(&["1", "2", "3"]);
        store.failing_content.insert("2".to_string());
        store.failing_pages.insert("3".to_string());
        let (pipeline, model, _store) = pipeline_with(model, store);

        let outcome = pipeline.run("What do we know?").await.expect("runs");
        let envelope = match outcome {
            PipelineOutcome::Complete(envelope) => envelope,
            PipelineOutcome::NoResults => panic!("expected a complete envelope"),
        };

        // all three ids appear in figures; id 3 as an error marker
        assert_eq!(envelope.figures.len(), 3);
        assert!(envelope.figures["3"].is_error());
        assert!(!envelope.figures["1"].is_error());

        // the synthesizer still ran, and saw both good payloads and the marker
        let prompts = model.synthesis_prompts.lock().expect("prompt log lock");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Article 1"));
        assert!(prompts[0].contains("Article 3"));
        assert!(prompts[0].contains(SUMMARY_ERROR));
        assert!(!envelope.summary.is_empty());
    }

    #[tokio::test]
    async fn test_keyword_failure_is_fatal_and_tagged() {
        let mut model = ScriptedModel::new("unused", "unused");
        model.fail_keywords = true;
        let store = ScriptedStore::new(&["1"]);
        let (pipeline, _model, store) = pipeline_with(model, store);

        let err = pipeline.run("Question?").await.expect_err("must fail");
        assert!(matches!(err, PipelineError::Keyword(_)));
        assert_eq!(store.content_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_synthesis_failure_is_fatal_and_tagged() {
        let mut model = ScriptedModel::new("terms", "unused");
        model.fail_synthesis = true;
        let store = ScriptedStore::new(&["1"]);
        let (pipeline, _model, _store) = pipeline_with(model, store);

        let err = pipeline.run("Question?").await.expect_err("must fail");
        assert!(matches!(err, PipelineError::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_figure_error_marker_serializes_into_envelope() {
        let model = ScriptedModel::new("terms", "Answer [PMC1].");
        let mut store = ScriptedStore::new(&["1", "2"]);
        store.failing_pages.insert("2".to_string());
        let (pipeline, _model, _store) = pipeline_with(model, store);

        let outcome = pipeline.run("Question?").await.expect("runs");
        let envelope = match outcome {
            PipelineOutcome::Complete(envelope) => envelope,
            PipelineOutcome::NoResults => panic!("expected a complete envelope"),
        };

        let value = serde_json::to_value(&envelope).expect("serializes");
        assert_eq!(value["figures"]["2"]["error"], FIGURES_ERROR);
        assert!(value["figures"]["1"].is_array());
        assert!(value["summary"].is_string());
    }
}
