//! Per-bookmark processing guard via Postgres advisory locks.
//!
//! Two concurrent `process()` calls for the same bookmark (a double-click
//! reprocess) would otherwise race on status writes and content upserts.
//! The guard try-acquires a session advisory lock keyed on the bookmark ID,
//! held on a dedicated pool connection for the duration of the run.

use sqlx::pool::PoolConnection;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use marque_core::{Error, Result};

/// A held per-bookmark advisory lock.
///
/// Session advisory locks outlive transactions, so the lock spans the whole
/// multi-statement pipeline run. Call [`BookmarkLock::release`] on the
/// normal exit path; if the guard is dropped instead (error, panic,
/// cancelled request), the connection is detached from the pool and closed
/// so the lock dies with its session rather than leaking into a reused
/// pooled connection.
pub struct BookmarkLock {
    conn: Option<PoolConnection<Postgres>>,
    bookmark_id: Uuid,
}

impl BookmarkLock {
    /// Try to acquire the processing lock for a bookmark.
    ///
    /// Returns `Ok(None)` when another run already holds it; the caller
    /// maps that to a conflict without touching bookmark state.
    pub async fn try_acquire(pool: &Pool<Postgres>, bookmark_id: Uuid) -> Result<Option<Self>> {
        let mut conn = pool.acquire().await.map_err(Error::Database)?;

        let row = sqlx::query("SELECT pg_try_advisory_lock(hashtextextended($1, 0)) AS locked")
            .bind(bookmark_id.to_string())
            .fetch_one(&mut *conn)
            .await
            .map_err(Error::Database)?;

        if row.get::<bool, _>("locked") {
            debug!(
                subsystem = "database",
                component = "lock",
                op = "acquire",
                %bookmark_id,
                "Acquired processing lock"
            );
            Ok(Some(Self {
                conn: Some(conn),
                bookmark_id,
            }))
        } else {
            debug!(
                subsystem = "database",
                component = "lock",
                op = "acquire",
                %bookmark_id,
                "Processing lock busy"
            );
            Ok(None)
        }
    }

    /// Release the lock and return the connection to the pool.
    pub async fn release(mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        let result = sqlx::query("SELECT pg_advisory_unlock(hashtextextended($1, 0))")
            .bind(self.bookmark_id.to_string())
            .execute(&mut *conn)
            .await;

        if let Err(e) = result {
            warn!(
                subsystem = "database",
                component = "lock",
                op = "release",
                bookmark_id = %self.bookmark_id,
                error = %e,
                "Failed to release processing lock, closing its session"
            );
            // Do not hand a still-locked session back to the pool.
            drop(conn.detach());
        }
    }
}

impl Drop for BookmarkLock {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            // Detaching closes the session instead of returning it to the
            // pool, which releases the advisory lock with it.
            warn!(
                subsystem = "database",
                component = "lock",
                op = "drop",
                bookmark_id = %self.bookmark_id,
                "Processing lock dropped without release, closing its session"
            );
            drop(conn.detach());
        }
    }
}
