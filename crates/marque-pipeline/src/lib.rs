//! # marque-pipeline
//!
//! Processing orchestrator for marque.
//!
//! Drives the full enrichment run for a bookmark: fetch, extract, enrich,
//! hash, persist, tag reconciliation, search reindex. Status transitions on
//! the bookmark happen only here.

pub mod processor;

pub use processor::{BookmarkProcessor, ProcessOptions};
