//! Bookmark processing orchestrator.
//!
//! One `process()` call drives a full run: fetch, extract, enrich, hash,
//! persist, reconcile tags, reindex. Stage errors after the run starts all
//! funnel into a single `failed` terminal write, so a bookmark never gets
//! stuck mid-run in a half-updated status.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use marque_core::{
    canonical_text, content_hash, Bookmark, BookmarkRepository, ContentUpsert, DiscoveredFields,
    Enricher, Enrichment, EnrichmentMode, EnrichmentRequest, Error, ExtractedContent, Result,
    SearchIndex, TagRepository,
};
use marque_db::{BookmarkLock, Database};
use marque_extract::Fetcher;

/// Per-call processing options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    /// Run even when the bookmark is already `processed`. The reprocess
    /// endpoint always sets this; background first-run processing does not.
    pub force_reprocess: bool,
}

/// Orchestrates the enrichment pipeline over the state store.
pub struct BookmarkProcessor {
    db: Database,
    enricher: Arc<dyn Enricher>,
    fetcher: Fetcher,
    mode: EnrichmentMode,
}

impl BookmarkProcessor {
    pub fn new(
        db: Database,
        enricher: Arc<dyn Enricher>,
        fetcher: Fetcher,
        mode: EnrichmentMode,
    ) -> Self {
        Self {
            db,
            enricher,
            fetcher,
            mode,
        }
    }

    /// Run the pipeline for one bookmark on behalf of `owner_id`.
    ///
    /// A bookmark owned by someone else fails with `Unauthorized` and zero
    /// writes. A run already in flight reports as a conflict, also with
    /// zero writes. Any stage failure after the run starts leaves the
    /// bookmark `failed` with the stage's error message recorded.
    #[instrument(skip(self), fields(subsystem = "pipeline", component = "processor", op = "process", bookmark_id = %bookmark_id, user_id = %owner_id))]
    pub async fn process(
        &self,
        bookmark_id: Uuid,
        owner_id: Uuid,
        options: ProcessOptions,
    ) -> Result<Bookmark> {
        let start = Instant::now();

        let bookmark = self.db.bookmarks.fetch(bookmark_id).await?;
        if bookmark.user_id != owner_id {
            // Fail closed before any mutation. The HTTP layer translates
            // this to a not-found so other users' bookmarks stay hidden.
            return Err(Error::Unauthorized(format!(
                "bookmark {} belongs to another user",
                bookmark_id
            )));
        }

        if bookmark.status == marque_core::BookmarkStatus::Processed && !options.force_reprocess {
            info!(status = %bookmark.status, "Bookmark already processed, skipping");
            return Ok(bookmark);
        }

        let lock = match BookmarkLock::try_acquire(self.db.pool(), bookmark_id).await? {
            Some(lock) => lock,
            None => {
                return Err(Error::Conflict(format!(
                    "bookmark {} is already being processed",
                    bookmark_id
                )))
            }
        };

        // Everything fallible between acquire and release funnels through
        // here so no exit path can walk off with the lock still held.
        let result = self.run_locked(&bookmark).await;
        lock.release().await;

        match result {
            Ok(updated) => {
                info!(
                    duration_ms = start.elapsed().as_millis() as u64,
                    status = %updated.status,
                    "Processing run complete"
                );
                Ok(updated)
            }
            Err(e) => Err(e),
        }
    }

    /// Run-start transition, stage sequence, and terminal status write,
    /// executed while the caller holds the processing lock.
    async fn run_locked(&self, bookmark: &Bookmark) -> Result<Bookmark> {
        self.db.bookmarks.begin_processing(bookmark.id).await?;

        match self.run_stages(bookmark).await {
            Ok(()) => self.db.bookmarks.fetch(bookmark.id).await,
            Err(e) => {
                error!(error = %e, "Processing run failed");
                // Content written before the failing stage is kept.
                if let Err(mark_err) =
                    self.db.bookmarks.mark_failed(bookmark.id, &e.to_string()).await
                {
                    warn!(error = %mark_err, "Failed to record failure status");
                }
                Err(e)
            }
        }
    }

    /// The fallible stage sequence between `begin_processing` and the
    /// terminal status write.
    async fn run_stages(&self, bookmark: &Bookmark) -> Result<()> {
        let extracted = match self.mode {
            EnrichmentMode::Content => {
                Some(marque_extract::fetch_and_extract(&self.fetcher, &bookmark.url).await?)
            }
            EnrichmentMode::Grounded => None,
        };

        let request = match &extracted {
            Some(content) => EnrichmentRequest::Content {
                url: bookmark.url.clone(),
                title: content.title.clone(),
                meta_description: content.meta_description.clone(),
                content_text: content.text_content.clone(),
            },
            None => EnrichmentRequest::Grounded {
                url: bookmark.url.clone(),
            },
        };

        let enrichment = self.enricher.enrich(&request).await?;

        let canonical = canonical_text(extracted.as_ref(), &enrichment);
        let hash = content_hash(canonical);

        self.db
            .bookmarks
            .upsert_content(
                bookmark.id,
                &ContentUpsert {
                    raw_content: extracted.as_ref().and_then(|c| c.text_content.clone()),
                    content_hash: hash,
                    summary_short: enrichment.summary_short.clone(),
                    summary_long: enrichment.summary_long.clone(),
                    language: enrichment.language.clone(),
                    enricher_model: self.enricher.model_name().to_string(),
                    enricher_version: self.enricher.model_version().to_string(),
                    meta: enrichment.meta(),
                },
            )
            .await?;

        self.db
            .bookmarks
            .mark_processed(bookmark.id, &discovered_fields(extracted.as_ref(), &enrichment))
            .await?;

        // Replace-set reconciliation: an empty tag list clears associations.
        let tag_ids = self
            .db
            .tags
            .ensure_tags(bookmark.user_id, &enrichment.tags)
            .await?;
        self.db.tags.set_bookmark_tags(bookmark.id, &tag_ids).await?;

        // Last: the vector reads both the content row and the tag set.
        self.db.search.reindex(bookmark.id).await?;

        Ok(())
    }
}

/// Bookmark fields discovered this run, AI title preferred over the page's.
fn discovered_fields(
    extracted: Option<&ExtractedContent>,
    enrichment: &Enrichment,
) -> DiscoveredFields {
    DiscoveredFields {
        title: Some(enrichment.title.clone()),
        source_type: extracted.map(|c| c.source_type.clone()),
        favicon_url: extracted.and_then(|c| c.favicon_url.clone()),
    }
}
