//! Core data models for marque.
//!
//! These types are shared across all marque crates and represent the
//! bookmark processing domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// BOOKMARK TYPES
// =============================================================================

/// Processing status of a bookmark.
///
/// `pending` is the initial state and is re-entered on forced reprocessing.
/// `processed` and `failed` are terminal per run; `failed` can transition
/// back to `pending` via a forced reprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "bookmark_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookmarkStatus {
    Pending,
    Processed,
    Failed,
}

impl std::fmt::Display for BookmarkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processed => write!(f, "processed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A user's saved URL plus its processing status.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    /// URL exactly as submitted.
    pub url: String,
    /// Canonicalized URL used for per-user dedup.
    pub normalized_url: String,
    pub title: Option<String>,
    /// User-supplied note, never touched by the pipeline.
    pub description: Option<String>,
    /// "article", "video", "tweet", or an og:type value.
    pub source_type: Option<String>,
    pub favicon_url: Option<String>,
    pub status: BookmarkStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_processed_at: Option<DateTime<Utc>>,
}

/// AI-derived enrichment attached 1:1 to a bookmark.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookmarkContent {
    pub bookmark_id: Uuid,
    /// Canonical extracted text, NULL in grounded mode.
    pub raw_content: Option<String>,
    /// Deterministic fingerprint of the canonical text for this run.
    pub content_hash: Option<String>,
    pub summary_short: Option<String>,
    pub summary_long: Option<String>,
    pub language: Option<String>,
    pub enricher_model: Option<String>,
    pub enricher_version: Option<String>,
    /// Open key/value map from the enricher (e.g. category).
    pub meta: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written to a bookmark content row on every processing run.
///
/// Every run overwrites the previous row unconditionally; `content_hash`
/// is stored so downstream consumers can detect unchanged content.
#[derive(Debug, Clone)]
pub struct ContentUpsert {
    pub raw_content: Option<String>,
    pub content_hash: String,
    pub summary_short: Option<String>,
    pub summary_long: Option<String>,
    pub language: String,
    pub enricher_model: String,
    pub enricher_version: String,
    pub meta: Option<JsonValue>,
}

/// Derived bookmark fields discovered during a successful run.
///
/// The state store applies these conservatively: title only if the bookmark
/// has none, source type and favicon only if not already set.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredFields {
    pub title: Option<String>,
    pub source_type: Option<String>,
    pub favicon_url: Option<String>,
}

// =============================================================================
// TAG TYPES
// =============================================================================

/// Per-user named label. (user_id, lowercase(name)) is unique.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// EXTRACTION TYPES
// =============================================================================

/// Canonical plain-text article plus metadata produced by the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub favicon_url: Option<String>,
    pub source_type: String,
    /// Flattened main-content text. None when the readability pass found
    /// no article body (graceful degrade, not an error).
    pub text_content: Option<String>,
}

// =============================================================================
// ENRICHMENT TYPES
// =============================================================================

/// Which invocation mode the enricher runs in.
///
/// A static deployment decision, not a per-call negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentMode {
    /// The model reasons only over locally extracted text.
    Content,
    /// The model retrieves and reasons over the URL itself; no local
    /// fetch/extract runs.
    Grounded,
}

impl std::str::FromStr for EnrichmentMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "content" => Ok(Self::Content),
            "grounded" => Ok(Self::Grounded),
            other => Err(crate::Error::Config(format!(
                "Unknown enrichment mode: {} (expected \"content\" or \"grounded\")",
                other
            ))),
        }
    }
}

/// Input handed to the enricher for one run.
#[derive(Debug, Clone)]
pub enum EnrichmentRequest {
    Content {
        url: String,
        title: Option<String>,
        meta_description: Option<String>,
        content_text: Option<String>,
    },
    Grounded {
        url: String,
    },
}

impl EnrichmentRequest {
    pub fn url(&self) -> &str {
        match self {
            Self::Content { url, .. } => url,
            Self::Grounded { url } => url,
        }
    }
}

/// Validated structured output of the enricher.
///
/// The raw model JSON is parsed into [`RawEnrichment`] and promoted to this
/// type only after shape validation; see
/// [`RawEnrichment::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub title: String,
    pub language: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub summary_short: Option<String>,
    pub summary_long: Option<String>,
}

/// Enricher output as deserialized from model JSON, before validation.
///
/// AI output is never trusted verbatim: any shape deviation is an
/// `EnrichmentValidation` error, never a silently-accepted partial object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEnrichment {
    pub title: Option<String>,
    pub language: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub summary_short: Option<String>,
    pub summary_long: Option<String>,
}

impl RawEnrichment {
    /// Validate the raw model output into a strict [`Enrichment`].
    ///
    /// `title` and `language` are required and must be non-blank. Tags are
    /// trimmed and blanks dropped; empty optional strings become `None`.
    pub fn validate(self) -> crate::Result<Enrichment> {
        let title = match self.title.map(|t| t.trim().to_string()) {
            Some(t) if !t.is_empty() => t,
            _ => {
                return Err(crate::Error::EnrichmentValidation(
                    "missing required field: title".to_string(),
                ))
            }
        };
        let language = match self.language.map(|l| l.trim().to_string()) {
            Some(l) if !l.is_empty() => l,
            _ => {
                return Err(crate::Error::EnrichmentValidation(
                    "missing required field: language".to_string(),
                ))
            }
        };

        let tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Enrichment {
            title,
            language,
            category: none_if_blank(self.category),
            tags,
            summary_short: none_if_blank(self.summary_short),
            summary_long: none_if_blank(self.summary_long),
        })
    }
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Enrichment {
    /// Meta payload persisted alongside summaries (currently the category).
    pub fn meta(&self) -> Option<JsonValue> {
        self.category
            .as_ref()
            .map(|c| serde_json::json!({ "category": c }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(BookmarkStatus::Pending.to_string(), "pending");
        assert_eq!(BookmarkStatus::Processed.to_string(), "processed");
        assert_eq!(BookmarkStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_enrichment_mode_parse() {
        assert_eq!(
            "content".parse::<EnrichmentMode>().unwrap(),
            EnrichmentMode::Content
        );
        assert_eq!(
            "Grounded".parse::<EnrichmentMode>().unwrap(),
            EnrichmentMode::Grounded
        );
        assert!("hybrid".parse::<EnrichmentMode>().is_err());
    }

    #[test]
    fn test_validate_requires_title() {
        let raw = RawEnrichment {
            language: Some("en".to_string()),
            ..Default::default()
        };
        let err = raw.validate().unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_validate_requires_language() {
        let raw = RawEnrichment {
            title: Some("Example".to_string()),
            language: Some("   ".to_string()),
            ..Default::default()
        };
        let err = raw.validate().unwrap_err();
        assert!(err.to_string().contains("language"));
    }

    #[test]
    fn test_validate_trims_tags_and_blanks() {
        let raw = RawEnrichment {
            title: Some("Example".to_string()),
            language: Some("en".to_string()),
            tags: vec![" AI ".to_string(), "".to_string(), "rust".to_string()],
            summary_short: Some("".to_string()),
            ..Default::default()
        };
        let enrichment = raw.validate().unwrap();
        assert_eq!(enrichment.tags, vec!["AI", "rust"]);
        assert_eq!(enrichment.summary_short, None);
    }

    #[test]
    fn test_enrichment_meta_carries_category() {
        let enrichment = Enrichment {
            title: "Example".to_string(),
            language: "en".to_string(),
            category: Some("technology".to_string()),
            tags: vec![],
            summary_short: None,
            summary_long: None,
        };
        assert_eq!(
            enrichment.meta(),
            Some(serde_json::json!({ "category": "technology" }))
        );

        let no_category = Enrichment {
            category: None,
            ..enrichment
        };
        assert_eq!(no_category.meta(), None);
    }

    #[test]
    fn test_raw_enrichment_tolerates_extra_fields() {
        let json = serde_json::json!({
            "title": "Example Article",
            "language": "en",
            "tags": ["example"],
            "confidence": 0.93,
            "reasoning": "ignored"
        });
        let raw: RawEnrichment = serde_json::from_value(json).unwrap();
        let enrichment = raw.validate().unwrap();
        assert_eq!(enrichment.title, "Example Article");
        assert_eq!(enrichment.tags, vec!["example"]);
    }
}
