//! # marque-db
//!
//! PostgreSQL database layer for marque.
//!
//! This crate provides:
//! - Connection pool management
//! - Bookmark state store with the processing status state machine
//! - Per-user tag reconciliation
//! - Weighted full-text search with PostgreSQL tsvector
//! - Per-bookmark advisory processing locks
//!
//! ## Example
//!
//! ```rust,ignore
//! use marque_db::Database;
//! use marque_core::{BookmarkRepository, CreateBookmarkRequest};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/marque").await?;
//!     let user_id = Uuid::parse_str("0198c5b6-1f6a-7000-8000-000000000000")?;
//!
//!     let id = db.bookmarks.insert(CreateBookmarkRequest {
//!         user_id,
//!         url: "https://example.com/article".to_string(),
//!         title: None,
//!         description: None,
//!     }).await?;
//!
//!     println!("Created bookmark: {}", id);
//!     Ok(())
//! }
//! ```

pub mod bookmarks;
pub mod lock;
pub mod pool;
pub mod search;
pub mod tags;

// Test fixtures for integration tests
// Note: always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use marque_core::*;

// Re-export repository implementations
pub use bookmarks::PgBookmarkRepository;
pub use lock::BookmarkLock;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use search::PgSearchIndex;
pub use tags::{normalize_tag_name, PgTagRepository};

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Bookmark state store.
    pub bookmarks: PgBookmarkRepository,
    /// Per-user tag repository.
    pub tags: PgTagRepository,
    /// Full-text search index.
    pub search: PgSearchIndex,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            bookmarks: PgBookmarkRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            search: PgSearchIndex::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Liveness probe: round-trip a trivial query.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
