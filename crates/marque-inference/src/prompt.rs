//! Prompt construction for bookmark enrichment.
//!
//! Both modes ask for the same JSON shape so the response parser is shared.
//! Content prompts carry the extracted text (truncated); grounded prompts
//! carry only the URL and rely on the model's own retrieval.

use marque_core::defaults::ENRICH_CONTENT_CHAR_LIMIT;
use marque_core::EnrichmentRequest;

/// System prompt shared by both enrichment modes.
pub const SYSTEM_PROMPT: &str = "You are a bookmark enrichment assistant. \
Given a web page, produce metadata about it. Respond with a single JSON \
object with exactly these fields: \
\"title\" (string, the page's title), \
\"language\" (string, ISO 639-1 code of the page's primary language), \
\"category\" (string or null, one broad topic such as \"technology\" or \"finance\"), \
\"tags\" (array of 1-5 short lowercase topic strings), \
\"summary_short\" (string, one sentence), \
\"summary_long\" (string, one paragraph). \
Output only the JSON object, no other text.";

/// Build the user prompt for an enrichment request.
pub fn build_prompt(req: &EnrichmentRequest) -> String {
    match req {
        EnrichmentRequest::Content {
            url,
            title,
            meta_description,
            content_text,
        } => {
            let mut prompt = format!("URL: {}\n", url);
            if let Some(title) = title {
                prompt.push_str(&format!("Page title: {}\n", title));
            }
            if let Some(desc) = meta_description {
                prompt.push_str(&format!("Meta description: {}\n", desc));
            }
            match content_text {
                Some(text) => {
                    prompt.push_str("\nPage content:\n");
                    prompt.push_str(truncate_chars(text, ENRICH_CONTENT_CHAR_LIMIT));
                }
                None => {
                    // Metadata-only degrade: the model works from what we have.
                    prompt.push_str(
                        "\nNo page content could be extracted. \
                         Work from the URL and metadata above.",
                    );
                }
            }
            prompt
        }
        EnrichmentRequest::Grounded { url } => {
            format!(
                "Retrieve and analyze the page at this URL: {}\n\
                 Base your answer on the page's actual content.",
                url
            )
        }
    }
}

/// Truncate to a character budget without splitting a UTF-8 code point.
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
