//! Scripted enricher for pipeline tests.

use async_trait::async_trait;
use std::sync::Mutex;

use marque_core::{Enricher, Enrichment, EnrichmentRequest, Error, Result};

/// Enricher that replays scripted responses and records the requests it saw.
///
/// Responses are consumed in order; when the script runs out, the last
/// response repeats. An empty script fails every call.
pub struct MockEnricher {
    script: Mutex<Vec<Result<Enrichment>>>,
    requests: Mutex<Vec<String>>,
}

impl MockEnricher {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A mock that always succeeds with a fixed enrichment.
    pub fn succeeding(enrichment: Enrichment) -> Self {
        let mock = Self::new();
        mock.push(Ok(enrichment));
        mock
    }

    /// A mock that always fails with an enrichment error.
    pub fn failing(message: &str) -> Self {
        let mock = Self::new();
        mock.push(Err(Error::Enrichment(message.to_string())));
        mock
    }

    /// Append one scripted outcome.
    pub fn push(&self, outcome: Result<Enrichment>) {
        self.script.lock().unwrap().push(outcome);
    }

    /// URLs of requests seen so far, in call order.
    pub fn seen_urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockEnricher {
    fn default() -> Self {
        Self::new()
    }
}

// Result<Enrichment> is not Clone (Error is not), so outcomes are rebuilt.
fn replay(outcome: &Result<Enrichment>) -> Result<Enrichment> {
    match outcome {
        Ok(e) => Ok(e.clone()),
        Err(e) => Err(Error::Enrichment(e.to_string())),
    }
}

#[async_trait]
impl Enricher for MockEnricher {
    async fn enrich(&self, req: &EnrichmentRequest) -> Result<Enrichment> {
        self.requests.lock().unwrap().push(req.url().to_string());

        let script = self.script.lock().unwrap();
        match script.len() {
            0 => Err(Error::Enrichment("mock script is empty".to_string())),
            _ => {
                let idx = self.requests.lock().unwrap().len() - 1;
                replay(&script[idx.min(script.len() - 1)])
            }
        }
    }

    fn model_name(&self) -> &str {
        "mock-enricher"
    }

    fn model_version(&self) -> &str {
        "test"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Enrichment {
        Enrichment {
            title: "Example".to_string(),
            language: "en".to_string(),
            category: None,
            tags: vec!["example".to_string()],
            summary_short: None,
            summary_long: None,
        }
    }

    #[tokio::test]
    async fn test_mock_replays_script_and_records_urls() {
        let mock = MockEnricher::new();
        mock.push(Ok(sample()));
        mock.push(Err(Error::Enrichment("boom".to_string())));

        let req = EnrichmentRequest::Grounded {
            url: "https://example.com/1".to_string(),
        };
        assert!(mock.enrich(&req).await.is_ok());

        let req2 = EnrichmentRequest::Grounded {
            url: "https://example.com/2".to_string(),
        };
        assert!(mock.enrich(&req2).await.is_err());
        // Script exhausted: last outcome repeats.
        assert!(mock.enrich(&req2).await.is_err());

        assert_eq!(
            mock.seen_urls(),
            vec![
                "https://example.com/1",
                "https://example.com/2",
                "https://example.com/2"
            ]
        );
    }
}
