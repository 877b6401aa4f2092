//! Centralized default constants for marque.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// FETCHER
// =============================================================================

/// Timeout for page fetches in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 10;

/// Maximum downloaded body size in bytes (2 MiB). Larger declared bodies
/// are rejected; undeclared bodies are truncated at this limit.
pub const FETCH_MAX_BYTES: u64 = 2 * 1024 * 1024;

/// User agent sent with page fetches.
pub const FETCH_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; MarqueBot/1.0; +https://github.com/marque-dev/marque)";

// =============================================================================
// EXTRACTION
// =============================================================================

/// Minimum candidate text length for the readability pass to accept an
/// article body. Below this the extractor degrades to metadata-only.
pub const READABILITY_MIN_TEXT_LEN: usize = 140;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama base URL.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default generation model name (Ollama).
pub const GEN_MODEL: &str = "gpt-oss:20b";

/// Timeout for enrichment requests in seconds.
pub const ENRICH_TIMEOUT_SECS: u64 = 120;

/// Maximum characters of article text included in a content-based
/// enrichment prompt.
pub const ENRICH_CONTENT_CHAR_LIMIT: usize = 12_000;

// =============================================================================
// SEARCH
// =============================================================================

/// Default page size for search endpoints.
pub const SEARCH_LIMIT: i64 = 20;

/// Snippet length in characters for search results.
pub const SNIPPET_LENGTH: usize = 200;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;
