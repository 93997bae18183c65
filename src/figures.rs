//! Best-effort figure extraction from article HTML.
//!
//! PMC article pages link each figure through an anchor whose href contains a
//! `/figure/` path segment, wrapping (or immediately followed by) an `img`
//! whose src points into the article's `/bin/` asset directory. This module
//! scans a page for those pairs in document order, up to a configured cap.
//! It makes no completeness guarantee; pages that render figures differently
//! simply yield fewer entries.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Path segment identifying a figure detail page
pub const FIGURE_PATH_SEGMENT: &str = "/figure/";

/// Path segment identifying a binary image asset
pub const BINARY_PATH_SEGMENT: &str = "/bin/";

/// One extracted figure: the image asset plus the figure detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureInfo {
    /// Absolute URL of the figure image
    pub image_url: String,
    /// Absolute URL of the figure detail page
    pub figure_link: String,
}

/// Extract up to `cap` figure image/detail-link pairs from article HTML.
///
/// Matches are collected in document order; relative links are resolved
/// against `base_url` (the article page URL). Entries whose URLs cannot be
/// resolved are skipped rather than reported as errors.
pub fn extract_figures(html: &str, base_url: &str, cap: usize) -> Vec<FigureInfo> {
    if cap == 0 {
        return Vec::new();
    }

    let document = Html::parse_document(html);
    let (Ok(anchor_selector), Ok(image_selector)) = (
        Selector::parse(&format!(r#"a[href*="{FIGURE_PATH_SEGMENT}"]"#)),
        Selector::parse(&format!(r#"img[src*="{BINARY_PATH_SEGMENT}"]"#)),
    ) else {
        return Vec::new();
    };
    let base = Url::parse(base_url).ok();

    let mut figures = Vec::new();
    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        let image_src = anchor
            .select(&image_selector)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string)
            .or_else(|| following_sibling_image(&anchor, &image_selector));

        let Some(src) = image_src else {
            continue;
        };

        let (Some(image_url), Some(figure_link)) =
            (absolutize(base.as_ref(), &src), absolutize(base.as_ref(), href))
        else {
            continue;
        };

        figures.push(FigureInfo {
            image_url,
            figure_link,
        });
        if figures.len() >= cap {
            break;
        }
    }

    figures
}

/// Look for a binary-asset image in the element immediately following the anchor
fn following_sibling_image(anchor: &ElementRef, image_selector: &Selector) -> Option<String> {
    let sibling = anchor.next_siblings().find_map(ElementRef::wrap)?;

    if sibling.value().name() == "img" {
        let src = sibling.value().attr("src")?;
        return src.contains(BINARY_PATH_SEGMENT).then(|| src.to_string());
    }

    sibling
        .select(image_selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
}

/// Resolve a possibly-relative link against the article page URL
fn absolutize(base: Option<&Url>, link: &str) -> Option<String> {
    if link.starts_with("http://") || link.starts_with("https://") {
        return Some(link.to_string());
    }
    base?.join(link).ok().map(|url| url.to_string())
}
