//! Search-term extraction from a research question.
//!
//! One model call, no retries; a failure here is fatal to the request.
//! Models sometimes ignore formatting instructions and wrap the keywords in
//! code fences, quotes, or an assignment, so the raw response is cleaned
//! before use as an esearch term.

use crate::error::{PipelineError, Result};
use crate::pipeline::TextGenerator;
use crate::prompts::keyword_extraction::{build_user_prompt, SYSTEM_PROMPT};
use regex::Regex;
use tracing::debug;

/// Extract a search-term phrase for the given question.
pub async fn extract_keywords(model: &dyn TextGenerator, question: &str) -> Result<String> {
    let user_prompt = build_user_prompt(question);

    let raw = model
        .complete(SYSTEM_PROMPT, &user_prompt)
        .await
        .map_err(|e| PipelineError::Keyword(e.to_string()))?;

    let keywords = clean_keyword_response(&raw);
    debug!(raw = %raw, keywords = %keywords, "Keyword response cleaned");

    if keywords.is_empty() {
        return Err(PipelineError::Keyword(
            "model returned no usable keywords".to_string(),
        ));
    }

    Ok(keywords)
}

/// Reduce a raw model response to a bare space-separated keyword phrase.
///
/// Handles code fences, surrounding quotes/backticks, `query = '...'`
/// assignments, and stray whitespace. A trailing period is dropped.
pub fn clean_keyword_response(raw: &str) -> String {
    let body = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join(" ");
    let body = body.trim();

    let assigned = Regex::new(r#"(?i)(?:const|let|var)?\s*\w*query\w*\s*=\s*['"`]([^'"`]+)['"`]"#)
        .ok()
        .and_then(|re| re.captures(body))
        .map(|caps| caps[1].to_string());

    let text = assigned.unwrap_or_else(|| body.to_string());
    let text = text
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`');

    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches('.')
        .to_string()
}
