//! PostgreSQL connection pool setup.
//!
//! Sizing comes from `MARQUE_DB_*` environment variables in deployment and
//! from the builder in tests. [`log_pool_metrics`] feeds the periodic pool
//! health log the API server runs.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use marque_core::{Error, Result};

/// Connection pool sizing and timeout settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long `acquire()` waits for a free connection before erroring.
    pub acquire_timeout: Duration,
    /// Idle connections are reaped after this long.
    pub idle_timeout: Duration,
    /// Connections are recycled after this long regardless of use.
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

impl PoolConfig {
    /// Build a configuration from `MARQUE_DB_MAX_CONNECTIONS`,
    /// `MARQUE_DB_MIN_CONNECTIONS` and `MARQUE_DB_ACQUIRE_TIMEOUT_SECS`,
    /// falling back to the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_connections: env_u32("MARQUE_DB_MAX_CONNECTIONS")
                .unwrap_or(defaults.max_connections),
            min_connections: env_u32("MARQUE_DB_MIN_CONNECTIONS")
                .unwrap_or(defaults.min_connections),
            acquire_timeout: env_u32("MARQUE_DB_ACQUIRE_TIMEOUT_SECS")
                .map(|s| Duration::from_secs(s.into()))
                .unwrap_or(defaults.acquire_timeout),
            ..defaults
        }
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    fn options(&self) -> PgPoolOptions {
        let mut options = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout);
        if let Some(max_lifetime) = self.max_lifetime {
            options = options.max_lifetime(max_lifetime);
        }
        options
    }
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok()?.parse().ok()
}

/// Open a pool with the default configuration.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

/// Open a pool with an explicit configuration.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();
    let pool = config
        .options()
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "database",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        open = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Connection pool ready"
    );
    Ok(pool)
}

/// Log pool occupancy, warning when every connection is checked out.
pub fn log_pool_metrics(pool: &PgPool) {
    let open = pool.size();
    let idle = pool.num_idle();

    debug!(
        subsystem = "database",
        component = "pool",
        op = "metrics",
        open,
        idle,
        "Pool occupancy"
    );
    if idle == 0 && open > 0 {
        warn!(
            subsystem = "database",
            component = "pool",
            open,
            "All pooled connections are checked out"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_builder() {
        let config = PoolConfig::default()
            .max_connections(20)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(60));

        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.acquire_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_pool_config_from_env_falls_back_on_garbage() {
        std::env::set_var("MARQUE_DB_MAX_CONNECTIONS", "not-a-number");
        let config = PoolConfig::from_env();
        assert_eq!(config.max_connections, PoolConfig::default().max_connections);
        std::env::remove_var("MARQUE_DB_MAX_CONNECTIONS");
    }
}
