//! Readability-style main content extraction.
//!
//! Finds the dominant article container and flattens it to plain text.
//! Chrome elements (scripts, nav, footers) are skipped during traversal,
//! candidates with heavy link density are rejected, and anything below the
//! minimum text floor degrades to `None` rather than storing junk.

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};

use marque_core::defaults::READABILITY_MIN_TEXT_LEN;

/// Elements whose subtrees never contribute article text.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "button",
    "iframe", "svg", "template",
];

/// Container candidates tried in priority order before the paragraph sweep.
const CANDIDATE_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=\"main\"]",
    "#content",
    ".post-content",
    ".article-body",
    ".entry-content",
];

/// Candidates where links make up more than this share of the text are
/// navigation, not articles.
const MAX_LINK_DENSITY: f64 = 0.5;

/// Extract the main article text from a parsed document.
///
/// Returns `None` when no candidate clears the link-density and length
/// floors. That is a graceful degrade, not an error.
pub fn extract_text(document: &Html) -> Option<String> {
    for css in CANDIDATE_SELECTORS {
        let sel = Selector::parse(css).unwrap();
        if let Some(best) = document
            .select(&sel)
            .map(candidate_text)
            .filter(|t| accept(t))
            .max_by_key(|t| t.len())
        {
            return Some(best);
        }
    }

    // No recognizable container: sweep body paragraphs.
    let p = Selector::parse("p").unwrap();
    let swept = document
        .select(&p)
        .map(candidate_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    if accept(&swept) {
        return Some(swept);
    }

    None
}

// Link-heavy candidates already came back empty from candidate_text, so a
// length floor is the only remaining gate.
fn accept(text: &str) -> bool {
    text.len() >= READABILITY_MIN_TEXT_LEN
}

/// Flatten one candidate element to whitespace-normalized text, or empty
/// when its link density disqualifies it.
fn candidate_text(el: ElementRef) -> String {
    let mut total = String::new();
    collect_text(*el, &mut total);
    let total = normalize_whitespace(&total);
    if total.is_empty() {
        return total;
    }

    let mut link_text = String::new();
    let a = Selector::parse("a").unwrap();
    for anchor in el.select(&a) {
        collect_text(*anchor, &mut link_text);
    }
    let link_text = normalize_whitespace(&link_text);

    if link_text.len() as f64 / total.len() as f64 > MAX_LINK_DENSITY {
        return String::new();
    }
    total
}

/// Depth-first text collection that skips chrome subtrees.
fn collect_text(node: NodeRef<Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            out.push_str(&text.text);
            out.push(' ');
        }
        Node::Element(el) => {
            if SKIPPED_TAGS.contains(&el.name()) {
                return;
            }
            for child in node.children() {
                collect_text(child, out);
            }
        }
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    fn long_paragraph() -> String {
        "The quick brown fox jumps over the lazy dog near the riverbank. ".repeat(5)
    }

    #[test]
    fn test_extracts_article_container() {
        let html = format!(
            "<html><body><nav>Home About Contact</nav><article><p>{}</p></article>\
             <footer>Copyright</footer></body></html>",
            long_paragraph()
        );
        let text = extract_text(&parse(&html)).unwrap();
        assert!(text.contains("quick brown fox"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("About"));
    }

    #[test]
    fn test_skips_script_and_style_inside_article() {
        let html = format!(
            "<html><body><article><script>var secret = 1;</script>\
             <style>.x {{ color: red; }}</style><p>{}</p></article></body></html>",
            long_paragraph()
        );
        let text = extract_text(&parse(&html)).unwrap();
        assert!(!text.contains("secret"));
        assert!(!text.contains("color"));
        assert!(text.contains("lazy dog"));
    }

    #[test]
    fn test_paragraph_sweep_without_container() {
        let html = format!(
            "<html><body><div><p>{}</p><p>{}</p></div></body></html>",
            long_paragraph(),
            long_paragraph()
        );
        let text = extract_text(&parse(&html)).unwrap();
        assert!(text.contains("riverbank"));
    }

    #[test]
    fn test_short_content_degrades_to_none() {
        let html = "<html><body><article><p>Too short.</p></article></body></html>";
        assert_eq!(extract_text(&parse(html)), None);
    }

    #[test]
    fn test_link_heavy_container_rejected() {
        // A "related links" list long enough to pass the length floor but
        // made almost entirely of anchor text.
        let links: String = (0..40)
            .map(|i| format!("<a href=\"/p/{i}\">Interesting related article number {i}</a> "))
            .collect();
        let html = format!("<html><body><article>{}</article></body></html>", links);
        assert_eq!(extract_text(&parse(&html)), None);
    }

    #[test]
    fn test_collects_text_across_nested_inline_markup() {
        let padding = long_paragraph();
        let html = format!(
            "<html><body><article><p>The <em>quick</em> brown <strong>fox \
             <code>jumps</code></strong> over. {}</p></article></body></html>",
            padding
        );
        let text = extract_text(&parse(&html)).unwrap();
        assert!(text.contains("The quick brown fox jumps over."));
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let body = long_paragraph();
        let html = format!(
            "<html><body><article><p>  {}\n\n\t{}  </p></article></body></html>",
            body, body
        );
        let text = extract_text(&parse(&html)).unwrap();
        assert!(!text.contains("\n"));
        assert!(!text.contains("  "));
    }
}
