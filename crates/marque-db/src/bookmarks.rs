//! Bookmark repository: state store and status state machine.
//!
//! Status transitions here are only ever invoked by the pipeline
//! orchestrator; everything else treats `status` as read-only.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use marque_core::{
    normalize_url, Bookmark, BookmarkContent, BookmarkRepository, BookmarkStatus, ContentUpsert,
    CreateBookmarkRequest, DiscoveredFields, Error, Result,
};

/// PostgreSQL implementation of BookmarkRepository.
pub struct PgBookmarkRepository {
    pool: Pool<Postgres>,
}

impl PgBookmarkRepository {
    /// Create a new PgBookmarkRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookmarkRepository for PgBookmarkRepository {
    async fn insert(&self, req: CreateBookmarkRequest) -> Result<Uuid> {
        let normalized = normalize_url(&req.url)?;
        let now = Utc::now();

        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO bookmark
                (user_id, url, normalized_url, title, description, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id
            "#,
        )
        .bind(req.user_id)
        .bind(&req.url)
        .bind(&normalized)
        .bind(&req.title)
        .bind(&req.description)
        .bind(BookmarkStatus::Pending)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.0)
    }

    async fn fetch(&self, id: Uuid) -> Result<Bookmark> {
        sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT id, user_id, url, normalized_url, title, description, source_type,
                   favicon_url, status, error_message, created_at, updated_at,
                   last_processed_at
            FROM bookmark
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::BookmarkNotFound(id))
    }

    async fn fetch_content(&self, bookmark_id: Uuid) -> Result<Option<BookmarkContent>> {
        sqlx::query_as::<_, BookmarkContent>(
            r#"
            SELECT bookmark_id, raw_content, content_hash, summary_short, summary_long,
                   language, enricher_model, enricher_version, meta, created_at, updated_at
            FROM bookmark_content
            WHERE bookmark_id = $1
            "#,
        )
        .bind(bookmark_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn begin_processing(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookmark
            SET status = $2, error_message = NULL, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(BookmarkStatus::Pending)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::BookmarkNotFound(id));
        }
        Ok(())
    }

    async fn upsert_content(&self, bookmark_id: Uuid, content: &ContentUpsert) -> Result<()> {
        // Every run overwrites unconditionally; content_hash is stored for
        // consumers that want change detection.
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO bookmark_content
                (bookmark_id, raw_content, content_hash, summary_short, summary_long,
                 language, enricher_model, enricher_version, meta, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            ON CONFLICT (bookmark_id) DO UPDATE SET
                raw_content = EXCLUDED.raw_content,
                content_hash = EXCLUDED.content_hash,
                summary_short = EXCLUDED.summary_short,
                summary_long = EXCLUDED.summary_long,
                language = EXCLUDED.language,
                enricher_model = EXCLUDED.enricher_model,
                enricher_version = EXCLUDED.enricher_version,
                meta = EXCLUDED.meta,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(bookmark_id)
        .bind(&content.raw_content)
        .bind(&content.content_hash)
        .bind(&content.summary_short)
        .bind(&content.summary_long)
        .bind(&content.language)
        .bind(&content.enricher_model)
        .bind(&content.enricher_version)
        .bind(&content.meta)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn mark_processed(&self, id: Uuid, discovered: &DiscoveredFields) -> Result<()> {
        // Title is applied only when the bookmark has none; source type and
        // favicon only when newly discovered.
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE bookmark
            SET status = $2,
                title = CASE WHEN title IS NULL OR title = '' THEN COALESCE($3, title) ELSE title END,
                source_type = COALESCE(source_type, $4),
                favicon_url = COALESCE(favicon_url, $5),
                error_message = NULL,
                last_processed_at = $6,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(BookmarkStatus::Processed)
        .bind(&discovered.title)
        .bind(&discovered.source_type)
        .bind(&discovered.favicon_url)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::BookmarkNotFound(id));
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<()> {
        // Content written earlier in the run stays put: a `failed` bookmark
        // may carry fresh bookmark_content (documented tradeoff).
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE bookmark
            SET status = $2, error_message = $3, last_processed_at = $4, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(BookmarkStatus::Failed)
        .bind(error_message)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::BookmarkNotFound(id));
        }
        Ok(())
    }
}
