//! Keyword extraction prompts for literature search.
//!
//! Contains system and user prompt templates for turning a research question
//! into a PubMed Central search phrase.

/// System prompt for search-term extraction
pub const SYSTEM_PROMPT: &str = r#"You extract search terms for the NCBI PubMed Central full-text database.

Rules you MUST follow:
- Respond with the keywords only, as a single short space-separated phrase.
- Do NOT explain the selection of your keywords.
- Do NOT wrap the keywords in quotes, code blocks, or variable assignments.
- Prefer specific biomedical terms; drop stop words and question phrasing."#;

/// User prompt template for keyword extraction
/// Placeholders: {question}
pub const USER_PROMPT_TEMPLATE: &str = r#"Identify the key words in this question for a PubMed Central search: {question}

For example, for the question 'What are the effects of gene editing on cancer treatment?', the response would be: gene editing cancer treatment"#;

/// Build user prompt with the research question
pub fn build_user_prompt(question: &str) -> String {
    USER_PROMPT_TEMPLATE.replace("{question}", question)
}
