//! Core traits for marque abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// BOOKMARK REPOSITORY (state store + status state machine)
// =============================================================================

/// Request for creating a new bookmark (always starts `pending`).
#[derive(Debug, Clone)]
pub struct CreateBookmarkRequest {
    pub user_id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// State store for bookmarks and their derived content.
///
/// Status transitions are only ever triggered by the orchestrator; callers
/// outside the pipeline read but never mutate `status`.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Insert a new bookmark in `pending` status.
    ///
    /// Fails with a constraint violation if the owner already saved the
    /// same normalized URL.
    async fn insert(&self, req: CreateBookmarkRequest) -> Result<Uuid>;

    /// Fetch a bookmark by ID.
    async fn fetch(&self, id: Uuid) -> Result<Bookmark>;

    /// Fetch the derived content row, if a run has produced one.
    async fn fetch_content(&self, bookmark_id: Uuid) -> Result<Option<BookmarkContent>>;

    /// Run-start transition: set `pending` and clear `error_message`.
    async fn begin_processing(&self, id: Uuid) -> Result<()>;

    /// Create or overwrite the 1:1 content row for this bookmark.
    async fn upsert_content(&self, bookmark_id: Uuid, content: &ContentUpsert) -> Result<()>;

    /// Success transition: apply discovered fields, set `processed`, stamp
    /// `last_processed_at`.
    async fn mark_processed(&self, id: Uuid, discovered: &DiscoveredFields) -> Result<()>;

    /// Failure transition: set `failed`, record the message, stamp
    /// `last_processed_at`. Content written earlier in the run is kept.
    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<()>;
}

// =============================================================================
// TAG REPOSITORY (reconciliation)
// =============================================================================

/// Per-user tag records and bookmark associations.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Case-insensitively find-or-create a tag row per name, scoped to the
    /// owner. Names are trimmed; blank names are skipped. Returns IDs in
    /// input order (deduplicated).
    async fn ensure_tags(&self, user_id: Uuid, names: &[String]) -> Result<Vec<Uuid>>;

    /// Replace the bookmark's tag associations with exactly this set.
    async fn set_bookmark_tags(&self, bookmark_id: Uuid, tag_ids: &[Uuid]) -> Result<()>;

    /// Tag names currently associated with a bookmark, sorted.
    async fn get_for_bookmark(&self, bookmark_id: Uuid) -> Result<Vec<String>>;

    /// All tags owned by a user.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>>;
}

// =============================================================================
// SEARCH INDEX
// =============================================================================

/// A full-text search hit.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchHit {
    pub bookmark_id: Uuid,
    pub score: f32,
    pub title: Option<String>,
    pub snippet: Option<String>,
}

/// Weighted full-text index over bookmark content.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Recompute the bookmark's search vector from title, summaries, raw
    /// content, and tag names. Must run after both the content upsert and
    /// the tag reconciliation.
    async fn reindex(&self, bookmark_id: Uuid) -> Result<()>;

    /// Rank a user's bookmarks against a websearch-style query.
    async fn search(&self, user_id: Uuid, query: &str, limit: i64) -> Result<Vec<SearchHit>>;
}

// =============================================================================
// ENRICHER (external AI capability)
// =============================================================================

/// AI summarizer/tagger behind a single interface for both content-based
/// and URL-grounded invocation.
///
/// Implementations must return a fully validated [`Enrichment`]; shape
/// deviations surface as `Error::EnrichmentValidation`.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, req: &EnrichmentRequest) -> Result<Enrichment>;

    /// Model identifier persisted with the content for audit/migration.
    fn model_name(&self) -> &str;

    /// Model version string persisted with the content.
    fn model_version(&self) -> &str;
}
