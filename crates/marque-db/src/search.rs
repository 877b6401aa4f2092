//! Weighted full-text search index over bookmark content.
//!
//! Field-weighted scoring: title (weight A) > summaries and tag names
//! (weight B) > raw extracted content (weight D). The vector is stored on
//! `bookmark_content.search_vector` and recomputed by the pipeline after
//! every run.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use marque_core::{defaults, Error, Result, SearchHit, SearchIndex};

/// PostgreSQL tsvector implementation of SearchIndex.
pub struct PgSearchIndex {
    pool: Pool<Postgres>,
}

impl PgSearchIndex {
    /// Create a new PgSearchIndex with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchIndex for PgSearchIndex {
    async fn reindex(&self, bookmark_id: Uuid) -> Result<()> {
        // Depends on both the content upsert and the tag reconciliation, so
        // the orchestrator runs this last.
        sqlx::query(
            r#"
            UPDATE bookmark_content bc
            SET search_vector =
                    setweight(to_tsvector('english', COALESCE(b.title, '')), 'A') ||
                    setweight(to_tsvector('english',
                        COALESCE(bc.summary_short, '') || ' ' || COALESCE(bc.summary_long, '')), 'B') ||
                    setweight(to_tsvector('english', COALESCE((
                        SELECT string_agg(t.name, ' ')
                        FROM bookmark_tag bt
                        JOIN tag t ON t.id = bt.tag_id
                        WHERE bt.bookmark_id = bc.bookmark_id
                    ), '')), 'B') ||
                    setweight(to_tsvector('english', COALESCE(bc.raw_content, '')), 'D'),
                updated_at = now()
            FROM bookmark b
            WHERE bc.bookmark_id = $1
              AND b.id = bc.bookmark_id
            "#,
        )
        .bind(bookmark_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn search(&self, user_id: Uuid, query: &str, limit: i64) -> Result<Vec<SearchHit>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT b.id AS bookmark_id,
                   ts_rank(bc.search_vector, websearch_to_tsquery('english', $2), 32) AS score,
                   b.title,
                   left(COALESCE(bc.summary_short, bc.raw_content, ''), {snippet}) AS snippet
            FROM bookmark_content bc
            JOIN bookmark b ON b.id = bc.bookmark_id
            WHERE b.user_id = $1
              AND bc.search_vector @@ websearch_to_tsquery('english', $2)
            ORDER BY score DESC
            LIMIT $3
            "#,
            snippet = defaults::SNIPPET_LENGTH
        ))
        .bind(user_id)
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let results = rows
            .into_iter()
            .map(|row| SearchHit {
                bookmark_id: row.get("bookmark_id"),
                score: row.get::<Option<f32>, _>("score").unwrap_or(0.0),
                title: row.get("title"),
                snippet: row.get("snippet"),
            })
            .collect();

        Ok(results)
    }
}
