//! Content fingerprinting for idempotency/change detection.

use sha2::{Digest, Sha256};

use crate::models::{Enrichment, ExtractedContent};

/// Compute the SHA-256 fingerprint of canonical text.
///
/// Pure and deterministic; the `sha256:` prefix keeps room for future
/// algorithm migration.
pub fn content_hash(canonical_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_text.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Select the canonical text that feeds the hasher for a run.
///
/// Priority: extracted article text, else the long summary, else the short
/// summary, else the enriched title. The fallbacks cover grounded mode,
/// where no local extraction runs.
pub fn canonical_text<'a>(
    extracted: Option<&'a ExtractedContent>,
    enrichment: &'a Enrichment,
) -> &'a str {
    if let Some(text) = extracted.and_then(|e| e.text_content.as_deref()) {
        return text;
    }
    enrichment
        .summary_long
        .as_deref()
        .or(enrichment.summary_short.as_deref())
        .unwrap_or(&enrichment.title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enrichment(short: Option<&str>, long: Option<&str>) -> Enrichment {
        Enrichment {
            title: "Example Article".to_string(),
            language: "en".to_string(),
            category: None,
            tags: vec![],
            summary_short: short.map(String::from),
            summary_long: long.map(String::from),
        }
    }

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(content_hash("hello"), content_hash("hello"));
        assert_ne!(content_hash("hello"), content_hash("hello "));
    }

    #[test]
    fn test_hash_format() {
        let hash = content_hash("hello");
        assert!(hash.starts_with("sha256:"));
        // 32-byte digest, hex-encoded
        assert_eq!(hash.len(), "sha256:".len() + 64);
    }

    #[test]
    fn test_canonical_text_prefers_extracted() {
        let extracted = ExtractedContent {
            title: None,
            meta_description: None,
            favicon_url: None,
            source_type: "article".to_string(),
            text_content: Some("the article body".to_string()),
        };
        let e = enrichment(Some("short"), Some("long"));
        assert_eq!(canonical_text(Some(&extracted), &e), "the article body");
    }

    #[test]
    fn test_canonical_text_fallback_chain() {
        let e = enrichment(Some("short"), Some("long"));
        assert_eq!(canonical_text(None, &e), "long");

        let e = enrichment(Some("short"), None);
        assert_eq!(canonical_text(None, &e), "short");

        let e = enrichment(None, None);
        assert_eq!(canonical_text(None, &e), "Example Article");
    }

    #[test]
    fn test_canonical_text_skips_null_extraction() {
        // Extraction ran but readability degraded to no article body.
        let extracted = ExtractedContent {
            title: Some("Page".to_string()),
            meta_description: None,
            favicon_url: None,
            source_type: "article".to_string(),
            text_content: None,
        };
        let e = enrichment(None, Some("long"));
        assert_eq!(canonical_text(Some(&extracted), &e), "long");
    }
}
