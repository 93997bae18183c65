//! # bioanswer
//!
//! Biomedical Literature Question-Answering Pipeline - Rust Microservice
//!
//! Turns a natural-language research question into a cited narrative answer
//! plus a gallery of source figures, backed by PubMed Central full text.
//!
//! ## Modules
//!
//! - [`pipeline`] - Stage orchestration and upstream traits
//! - [`keywords`] - Search-term extraction via a generative model
//! - [`pmc`] - NCBI E-utilities client (esearch/efetch) and article pages
//! - [`fetcher`] - Per-article content/figure fan-out with partial-failure capture
//! - [`figures`] - Best-effort figure extraction from article HTML
//! - [`synthesis`] - Cited answer generation
//! - [`citations`] - Citation-marker to link rewriting
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bioanswer::llm::{LlmClient, LlmConfig};
//! use bioanswer::pipeline::{Pipeline, PipelineConfig};
//! use bioanswer::pmc::PmcClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let model = LlmClient::new(LlmConfig {
//!         base_url: "https://api.openai.com/v1".into(),
//!         api_key: "sk-...".into(),
//!         model: "gpt-4o-mini".into(),
//!     })?;
//!     let literature = PmcClient::new("me@example.com".into(), None)?;
//!     let pipeline = Pipeline::new(Arc::new(model), Arc::new(literature), PipelineConfig::default());
//!     let outcome = pipeline.run("What drives antibiotic resistance?").await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod citations;
pub mod error;
pub mod fetcher;
pub mod figures;
pub mod keywords;
pub mod llm;
pub mod pipeline;
pub mod pmc;
pub mod prompts;
pub mod synthesis;

pub use error::{PipelineError, Result};
