//! Cited answer synthesis.
//!
//! One model call over the original question plus every per-article payload,
//! error markers included so the model can acknowledge missing sources. The
//! returned prose is post-processed by the citation rewriter before it
//! reaches the caller. No partial synthesis: a model failure here fails the
//! request.

use crate::citations::rewrite_citations;
use crate::error::{PipelineError, Result};
use crate::pipeline::TextGenerator;
use crate::prompts::synthesis::{build_user_prompt, SYSTEM_PROMPT};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Generate the final cited answer for a question over the fetched payloads.
pub async fn synthesize_answer(
    model: &dyn TextGenerator,
    question: &str,
    summaries: &HashMap<String, serde_json::Value>,
) -> Result<String> {
    let corpus = render_corpus(summaries)?;
    let user_prompt = build_user_prompt(question, &corpus);

    let raw = model
        .complete(SYSTEM_PROMPT, &user_prompt)
        .await
        .map_err(|e| PipelineError::Synthesis(e.to_string()))?;

    info!(chars = raw.len(), "Synthesis complete");
    Ok(rewrite_citations(&raw))
}

/// Serialize the payload map with a stable key order for the prompt
fn render_corpus(summaries: &HashMap<String, serde_json::Value>) -> Result<String> {
    let ordered: BTreeMap<&String, &serde_json::Value> = summaries.iter().collect();
    Ok(serde_json::to_string_pretty(&ordered)?)
}
