//! # marque-core
//!
//! Core types, traits, and abstractions for the marque bookmark pipeline.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other marque crates depend on.

pub mod defaults;
pub mod error;
pub mod hash;
pub mod logging;
pub mod models;
pub mod traits;
pub mod url_norm;

// Re-export commonly used types at crate root
pub use error::{Error, FetchError, Result};
pub use hash::{canonical_text, content_hash};
pub use models::*;
pub use traits::*;
pub use url_norm::normalize_url;
