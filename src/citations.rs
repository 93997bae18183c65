//! Citation-marker rewriting.
//!
//! The synthesizer asks the model for bracketed `[PMCnnn]` citation markers.
//! This module rewrites every well-formed marker group into the same bracketed
//! group with each id wrapped in an anchor to the public PMC article page.
//! Prose outside markers is never touched, and marker-like text that does not
//! parse is left alone.

use crate::pmc;
use regex::{Captures, Regex};

/// Matches a full citation group: one or more PMC ids, comma separated, in brackets
const GROUP_PATTERN: &str = r"\[\s*PMC\d+(?:\s*,\s*PMC\d+)*\s*\]";

/// Matches one id inside a group
const ID_PATTERN: &str = r"PMC(\d+)";

/// Rewrite citation marker groups into clickable references.
///
/// `[PMC123, PMC456]` becomes `[<a ...>PMC123</a>, <a ...>PMC456</a>]`,
/// preserving id order and comma grouping. Input without markers is returned
/// unchanged.
pub fn rewrite_citations(text: &str) -> String {
    let (Ok(group_re), Ok(id_re)) = (Regex::new(GROUP_PATTERN), Regex::new(ID_PATTERN)) else {
        return text.to_string();
    };

    group_re
        .replace_all(text, |caps: &Captures| {
            let links: Vec<String> = id_re
                .captures_iter(&caps[0])
                .map(|id_caps| citation_link(&id_caps[1]))
                .collect();
            format!("[{}]", links.join(", "))
        })
        .into_owned()
}

/// Build one anchor for a bare numeric PMC id
fn citation_link(id: &str) -> String {
    format!(
        r#"<a href="{}" target="_blank" rel="noopener noreferrer">PMC{}</a>"#,
        pmc::article_url(id),
        id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_markers_unchanged() {
        let prose = "Gene editing shows promise in oncology. Further trials are needed.";
        assert_eq!(rewrite_citations(prose), prose);
    }

    #[test]
    fn test_single_marker() {
        let out = rewrite_citations("CRISPR improves outcomes [PMC123].");
        assert!(out.starts_with("CRISPR improves outcomes ["));
        assert!(out.contains(r#"href="https://www.ncbi.nlm.nih.gov/pmc/articles/PMC123/""#));
        assert!(out.contains(">PMC123</a>"));
        assert!(out.ends_with("]."));
    }

    #[test]
    fn test_group_preserves_order_and_commas() {
        let out = rewrite_citations("Two studies agree [PMC123, PMC456].");
        let first = out.find("PMC123").expect("first id present");
        let second = out.find("PMC456").expect("second id present");
        assert!(first < second);
        assert_eq!(out.matches("<a href=").count(), 2);
        assert!(out.contains("</a>, <a href="));
    }

    #[test]
    fn test_prose_outside_markers_untouched() {
        let out = rewrite_citations("Before [PMC9] after.");
        assert!(out.starts_with("Before ["));
        assert!(out.ends_with("] after."));
    }

    #[test]
    fn test_unparseable_markers_left_alone() {
        let prose = "See [PMC] and [PMC123 and PMC456] and [pmc123] for details.";
        assert_eq!(rewrite_citations(prose), prose);
    }

    #[test]
    fn test_whitespace_tolerant_group() {
        let out = rewrite_citations("Results [ PMC1 , PMC2 ] hold.");
        assert_eq!(out.matches("<a href=").count(), 2);
        assert!(out.contains(">PMC1</a>"));
        assert!(out.contains(">PMC2</a>"));
    }

    #[test]
    fn test_multiple_groups() {
        let out = rewrite_citations("First [PMC1]. Second [PMC2, PMC3].");
        assert_eq!(out.matches("<a href=").count(), 3);
    }
}
