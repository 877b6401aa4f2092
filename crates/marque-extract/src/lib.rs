//! # marque-extract
//!
//! Page fetching and content extraction for marque.
//!
//! This crate provides:
//! - An HTTP fetcher with timeout, content-type, and size guards
//! - Readability-style main content extraction over the parsed DOM
//! - Page metadata extraction (title, description, favicon, source type)
//!
//! In grounded enrichment mode none of this runs; the enricher sees only
//! the URL.

pub mod extractor;
pub mod fetcher;
pub mod readability;

pub use extractor::extract;
pub use fetcher::{FetchConfig, FetchedPage, Fetcher};

use marque_core::{ExtractedContent, Result};

/// Fetch a page and extract content plus metadata in one step.
///
/// Fetch failures propagate as [`marque_core::Error::Fetch`]; extraction
/// itself never fails, it degrades field-by-field.
pub async fn fetch_and_extract(fetcher: &Fetcher, url: &str) -> Result<ExtractedContent> {
    let page = fetcher.fetch(url).await?;
    Ok(extract(&page.html, &page.final_url))
}
