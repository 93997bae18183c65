//! Answer synthesis prompts.
//!
//! Contains system and user prompt templates for generating a cited, balanced
//! narrative answer from retrieved article content.

/// System prompt for cited answer synthesis
pub const SYSTEM_PROMPT: &str = r#"You are a biomedical research assistant answering a question from retrieved PubMed Central articles.

Rules you MUST follow:
- Base every claim on the provided article data; do NOT fabricate content.
- Cite sources inline with bracketed PMC ids, e.g. [PMC7096777]. Group multiple supporting sources in one bracket, comma separated: [PMC7096777, PMC8123456].
- Explicitly mention conflicting findings between sources when they disagree.
- Explicitly mention gaps where information is missing or a source could not be retrieved.
- End with a closing paragraph that synthesizes the overall answer.
- Write plain prose paragraphs; no headings, no bullet lists, no markdown."#;

/// User prompt template for answer synthesis
/// Placeholders: {question}, {articles_json}
pub const USER_PROMPT_TEMPLATE: &str = r#"Question:
{question}

Article data (JSON, keyed by PMC id; an entry whose value carries an "error" field could not be retrieved):
{articles_json}

Provide a comprehensive, balanced answer with inline [PMCid] citations."#;

/// Build user prompt with the question and serialized article data
pub fn build_user_prompt(question: &str, articles_json: &str) -> String {
    USER_PROMPT_TEMPLATE
        .replace("{question}", question)
        .replace("{articles_json}", articles_json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_user_prompt() {
        let prompt = build_user_prompt("What causes sepsis?", r#"{"123": {"title": "t"}}"#);
        assert!(prompt.contains("What causes sepsis?"));
        assert!(prompt.contains(r#"{"123": {"title": "t"}}"#));
    }
}
