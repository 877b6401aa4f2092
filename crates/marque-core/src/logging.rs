//! Structured logging schema and field name constants for marque.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → pipeline → sub-calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "pipeline", "db", "fetch", "extract", "inference"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "fetcher", "readability", "ollama", "pool", "processor"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "process", "fetch", "enrich", "reindex"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Bookmark UUID being operated on.
pub const BOOKMARK_ID: &str = "bookmark_id";

/// Owning user UUID.
pub const USER_ID: &str = "user_id";

/// Target URL of a fetch or enrichment.
pub const URL: &str = "url";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Downloaded or extracted byte/char count.
pub const CONTENT_LEN: &str = "content_len";

/// Number of tags reconciled in a run.
pub const TAG_COUNT: &str = "tag_count";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for enrichment.
pub const MODEL: &str = "model";

/// Enrichment invocation mode ("content" or "grounded").
pub const ENRICH_MODE: &str = "enrich_mode";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
