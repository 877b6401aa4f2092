//! Page metadata extraction: title, description, favicon, source type.
//!
//! Works over the parsed DOM and degrades field-by-field; a page with no
//! usable metadata still yields an [`ExtractedContent`] with the readability
//! text (or `None`) attached by the caller.

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use marque_core::ExtractedContent;

use crate::readability;

/// Extract content and metadata from a fetched HTML document.
///
/// `base_url` is the final post-redirect URL, used to resolve relative
/// favicon links and for host-based source type heuristics.
pub fn extract(html: &str, base_url: &str) -> ExtractedContent {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let title = extract_title(&document);
    let meta_description = extract_meta_description(&document);
    let favicon_url = extract_favicon(&document, base.as_ref());
    let source_type = classify_source(&document, base.as_ref());
    let text_content = readability::extract_text(&document);

    debug!(
        subsystem = "extract",
        component = "extractor",
        op = "extract",
        url = %base_url,
        has_title = title.is_some(),
        has_text = text_content.is_some(),
        source_type = %source_type,
        "Extracted page content"
    );

    ExtractedContent {
        title,
        meta_description,
        favicon_url,
        source_type,
        text_content,
    }
}

fn selector(css: &str) -> Selector {
    // All selectors in this module are static literals.
    Selector::parse(css).unwrap()
}

fn extract_title(document: &Html) -> Option<String> {
    // og:title is usually cleaner than <title> (no site-name suffix).
    meta_content(document, "meta[property=\"og:title\"]")
        .or_else(|| {
            document
                .select(&selector("title"))
                .next()
                .map(|el| el.text().collect::<String>())
        })
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn extract_meta_description(document: &Html) -> Option<String> {
    meta_content(document, "meta[name=\"description\"]")
        .or_else(|| meta_content(document, "meta[property=\"og:description\"]"))
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    document
        .select(&selector(css))
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.to_string())
}

/// Favicon href from link tags, resolved against the page URL. Relative
/// hrefs without a parsable base are dropped rather than stored broken.
fn extract_favicon(document: &Html, base: Option<&Url>) -> Option<String> {
    let href = document
        .select(&selector("link[rel~=\"icon\"]"))
        .next()
        .or_else(|| document.select(&selector("link[rel=\"shortcut icon\"]")).next())
        .and_then(|el| el.value().attr("href"))?;

    match base {
        Some(base) => base.join(href).ok().map(|u| u.to_string()),
        None => Url::parse(href).ok().map(|u| u.to_string()),
    }
}

/// Classify the page: og:type wins, then host heuristics, then "article".
fn classify_source(document: &Html, base: Option<&Url>) -> String {
    if let Some(og_type) = meta_content(document, "meta[property=\"og:type\"]") {
        let og_type = og_type.trim().to_lowercase();
        if !og_type.is_empty() && og_type != "website" {
            // "video.other" and friends collapse to their first segment.
            return og_type.split('.').next().unwrap_or(&og_type).to_string();
        }
    }

    if let Some(host) = base.and_then(|u| u.host_str()) {
        let host = host.trim_start_matches("www.");
        if host == "youtube.com" || host == "youtu.be" {
            return "video".to_string();
        }
        if host == "twitter.com" || host == "x.com" {
            return "tweet".to_string();
        }
    }

    "article".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"
        <html>
        <head>
            <title>Plain Title | Site Name</title>
            <meta property="og:title" content="Clean Title" />
            <meta name="description" content="A description." />
            <link rel="icon" href="/static/favicon.ico" />
        </head>
        <body><p>Body text.</p></body>
        </html>
    "#;

    #[test]
    fn test_extract_prefers_og_title() {
        let result = extract(ARTICLE_HTML, "https://example.com/post");
        assert_eq!(result.title.as_deref(), Some("Clean Title"));
    }

    #[test]
    fn test_extract_falls_back_to_title_tag() {
        let html = "<html><head><title>  Only Title  </title></head><body></body></html>";
        let result = extract(html, "https://example.com/");
        assert_eq!(result.title.as_deref(), Some("Only Title"));
    }

    #[test]
    fn test_extract_meta_description_fallback_to_og() {
        let html = r#"<html><head>
            <meta property="og:description" content="From OG." />
        </head><body></body></html>"#;
        let result = extract(html, "https://example.com/");
        assert_eq!(result.meta_description.as_deref(), Some("From OG."));
    }

    #[test]
    fn test_extract_resolves_relative_favicon() {
        let result = extract(ARTICLE_HTML, "https://example.com/deep/post");
        assert_eq!(
            result.favicon_url.as_deref(),
            Some("https://example.com/static/favicon.ico")
        );
    }

    #[test]
    fn test_source_type_from_og_type() {
        let html = r#"<html><head>
            <meta property="og:type" content="video.other" />
        </head><body></body></html>"#;
        let result = extract(html, "https://example.com/");
        assert_eq!(result.source_type, "video");
    }

    #[test]
    fn test_source_type_website_falls_through_to_host() {
        let html = r#"<html><head>
            <meta property="og:type" content="website" />
        </head><body></body></html>"#;
        let result = extract(html, "https://www.youtube.com/watch?v=abc");
        assert_eq!(result.source_type, "video");
    }

    #[test]
    fn test_source_type_host_heuristics() {
        let html = "<html><body></body></html>";
        assert_eq!(extract(html, "https://youtu.be/abc").source_type, "video");
        assert_eq!(
            extract(html, "https://x.com/user/status/1").source_type,
            "tweet"
        );
        assert_eq!(
            extract(html, "https://example.com/post").source_type,
            "article"
        );
    }

    #[test]
    fn test_extract_handles_bare_page() {
        let result = extract("<html><body></body></html>", "https://example.com/");
        assert_eq!(result.title, None);
        assert_eq!(result.meta_description, None);
        assert_eq!(result.favicon_url, None);
        assert_eq!(result.source_type, "article");
        assert_eq!(result.text_content, None);
    }
}
