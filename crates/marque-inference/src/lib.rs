//! # marque-inference
//!
//! AI enrichment backend for marque.
//!
//! This crate provides:
//! - [`OllamaEnricher`]: the production [`marque_core::Enricher`] over
//!   Ollama's chat API with JSON format enforcement
//! - [`MockEnricher`]: a scripted enricher for pipeline tests
//! - Prompt construction for content-based and URL-grounded enrichment

pub mod mock;
pub mod ollama;
pub mod prompt;

pub use mock::MockEnricher;
pub use ollama::{OllamaEnricher, DEFAULT_GEN_MODEL, DEFAULT_OLLAMA_URL};
