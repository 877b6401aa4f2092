//! Tag repository: per-user find-or-create and bookmark tag reconciliation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use marque_core::{Error, Result, Tag, TagRepository};

/// Maximum tag name length accepted from the enricher.
const MAX_TAG_LEN: usize = 100;

/// Normalize a tag name for reconciliation: trim surrounding whitespace and
/// collapse internal runs to single spaces. Case is preserved on the stored
/// row; uniqueness is enforced case-insensitively by the database.
pub fn normalize_tag_name(name: &str) -> Option<String> {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || collapsed.len() > MAX_TAG_LEN {
        return None;
    }
    Some(collapsed)
}

/// PostgreSQL implementation of TagRepository.
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn ensure_tags(&self, user_id: Uuid, names: &[String]) -> Result<Vec<Uuid>> {
        let now = Utc::now();
        let mut tag_ids = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for raw in names {
            let Some(name) = normalize_tag_name(raw) else {
                continue;
            };
            if !seen.insert(name.to_lowercase()) {
                continue;
            }

            // Upsert against the (user_id, lower(name)) unique index so a
            // concurrent create of the same name cannot produce duplicates.
            sqlx::query(
                r#"
                INSERT INTO tag (user_id, name, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, lower(name)) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(&name)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

            let row = sqlx::query(
                "SELECT id FROM tag WHERE user_id = $1 AND lower(name) = lower($2)",
            )
            .bind(user_id)
            .bind(&name)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

            tag_ids.push(row.get("id"));
        }

        Ok(tag_ids)
    }

    async fn set_bookmark_tags(&self, bookmark_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        // Replace, not merge: tags dropped by the latest enrichment run are
        // removed from the bookmark.
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM bookmark_tag WHERE bookmark_id = $1")
            .bind(bookmark_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        for tag_id in tag_ids {
            sqlx::query(
                r#"
                INSERT INTO bookmark_tag (bookmark_id, tag_id)
                VALUES ($1, $2)
                ON CONFLICT (bookmark_id, tag_id) DO NOTHING
                "#,
            )
            .bind(bookmark_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn get_for_bookmark(&self, bookmark_id: Uuid) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT t.name
            FROM bookmark_tag bt
            JOIN tag t ON t.id = bt.tag_id
            WHERE bt.bookmark_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(bookmark_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|row| row.get("name")).collect())
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>> {
        sqlx::query_as::<_, Tag>(
            "SELECT id, user_id, name, created_at FROM tag WHERE user_id = $1 ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }
}
