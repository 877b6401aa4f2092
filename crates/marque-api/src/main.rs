//! marque-api - HTTP API server for marque

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use marque_core::{BookmarkRepository, EnrichmentMode};
use marque_db::{Database, PoolConfig};
use marque_extract::{FetchConfig, Fetcher};
use marque_inference::OllamaEnricher;
use marque_pipeline::{BookmarkProcessor, ProcessOptions};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation and debugging production incidents.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE + AUTH
// =============================================================================

#[derive(Clone)]
struct AppState {
    db: Database,
    processor: Arc<BookmarkProcessor>,
}

/// Resolve the calling user from the `X-User-Id` header.
///
/// Session handling lives in the auth proxy in front of this server; the
/// header is trusted as already authenticated. Absent or malformed values
/// are a 401, not a 400, since they mean the proxy was bypassed.
fn require_user(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let value = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;
    value
        .parse::<Uuid>()
        .map_err(|_| ApiError::Unauthorized("Unauthorized".to_string()))
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Bookmark summary returned by the reprocess endpoint.
#[derive(Serialize)]
struct BookmarkSummary {
    id: Uuid,
    url: String,
    title: Option<String>,
    description: Option<String>,
    status: String,
    error_message: Option<String>,
    summary_short: Option<String>,
}

async fn reprocess_bookmark(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user(&headers)?;

    let bookmark = state
        .processor
        .process(
            id,
            user_id,
            ProcessOptions {
                force_reprocess: true,
            },
        )
        .await
        .map_err(|e| match e {
            // Another user's bookmark is indistinguishable from a missing one.
            marque_core::Error::Unauthorized(_) => {
                ApiError::NotFound(format!("Bookmark {} not found", id))
            }
            other => ApiError::from(other),
        })?;

    let summary_short = state
        .db
        .bookmarks
        .fetch_content(id)
        .await?
        .and_then(|c| c.summary_short);

    Ok(Json(serde_json::json!({
        "message": "Bookmark reprocessed successfully",
        "bookmark": BookmarkSummary {
            id: bookmark.id,
            url: bookmark.url,
            title: bookmark.title,
            description: bookmark.description,
            status: bookmark.status.to_string(),
            error_message: bookmark.error_message,
            summary_short,
        },
    })))
}

async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.db.ping().await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/bookmarks/:id/reprocess", post(reprocess_bookmark))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "marque_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marque_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("marque-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(marque_core::defaults::SERVER_PORT);

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect_with_config(&database_url, PoolConfig::from_env()).await?;
    info!("Database connected");

    // Periodic pool occupancy log; warns on exhaustion.
    let metrics_pool = db.pool().clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(60));
        tick.tick().await; // skip the immediate first tick
        loop {
            tick.tick().await;
            marque_db::log_pool_metrics(&metrics_pool);
        }
    });

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Enrichment mode is a static deployment decision
    let mode: EnrichmentMode = std::env::var("MARQUE_ENRICH_MODE")
        .unwrap_or_else(|_| "content".to_string())
        .parse()?;
    info!(mode = ?mode, "Enrichment mode configured");

    let enricher = Arc::new(OllamaEnricher::from_env());
    let fetcher = Fetcher::new(FetchConfig::from_env())?;
    let processor = Arc::new(BookmarkProcessor::new(
        db.clone(),
        enricher,
        fetcher,
        mode,
    ));

    let state = AppState { db, processor };
    let app = app(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
enum ApiError {
    Internal(marque_core::Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<marque_core::Error> for ApiError {
    fn from(err: marque_core::Error) -> Self {
        match &err {
            marque_core::Error::BookmarkNotFound(id) => {
                ApiError::NotFound(format!("Bookmark {} not found", id))
            }
            marque_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            marque_core::Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            marque_core::Error::Conflict(msg) => ApiError::Conflict(msg.clone()),
            marque_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            marque_core::Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    return ApiError::Conflict(msg);
                }
                ApiError::Internal(err)
            }
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            // Pipeline failures already wrote the failed status; the client
            // gets the generic envelope plus the stage message.
            ApiError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({
                    "error": "Failed to reprocess bookmark",
                    "message": err.to_string(),
                }),
            ),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, serde_json::json!({ "error": msg }))
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg }))
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::Conflict(msg) => {
                (StatusCode::CONFLICT, serde_json::json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_user_parses_header() {
        let user_id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", user_id.to_string().parse().unwrap());
        assert_eq!(require_user(&headers).unwrap(), user_id);
    }

    #[test]
    fn test_require_user_rejects_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            require_user(&headers),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_require_user_rejects_malformed_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", "not-a-uuid".parse().unwrap());
        assert!(matches!(
            require_user(&headers),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_api_error_status_mapping() {
        let id = Uuid::nil();
        let cases: Vec<(marque_core::Error, StatusCode)> = vec![
            (marque_core::Error::BookmarkNotFound(id), StatusCode::NOT_FOUND),
            (
                marque_core::Error::Conflict("busy".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                marque_core::Error::Unauthorized("no".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                marque_core::Error::InvalidInput("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                marque_core::Error::Enrichment("backend down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
