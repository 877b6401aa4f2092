//! HTML page fetcher with timeout, content-type, and size guards.
//!
//! Every guard maps to a distinct [`FetchError`] variant so the orchestrator
//! can record a precise failure message on the bookmark.

use futures::StreamExt;
use tracing::{debug, warn};

use marque_core::{defaults, Error, FetchError, Result};

/// Fetch limits and identity. Defaults come from [`marque_core::defaults`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Hard cap on downloaded bytes.
    pub max_bytes: u64,
    /// User-Agent header sent with every fetch.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::FETCH_TIMEOUT_SECS,
            max_bytes: defaults::FETCH_MAX_BYTES,
            user_agent: defaults::FETCH_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    /// Read overrides from `MARQUE_FETCH_TIMEOUT_SECS` and
    /// `MARQUE_FETCH_MAX_BYTES`; unset or unparsable values fall back to
    /// the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(timeout) = std::env::var("MARQUE_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout_secs = timeout;
        }
        if let Some(max_bytes) = std::env::var("MARQUE_FETCH_MAX_BYTES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.max_bytes = max_bytes;
        }
        config
    }
}

/// A fetched HTML document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects, used as the base for relative links.
    pub final_url: String,
    pub html: String,
    /// Set when the body hit the size cap and was cut off mid-document.
    pub truncated: bool,
}

/// HTTP fetcher for bookmark target pages.
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(FetchConfig::default())
    }

    /// Fetch a page, enforcing status, content-type, and size guards.
    ///
    /// Guard order: status, declared content-type, declared content-length,
    /// then streaming download with truncation at the byte cap.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let start = std::time::Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Fetch(FetchError::Timeout(self.config.timeout_secs))
            } else {
                Error::Fetch(FetchError::Network(e.to_string()))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(FetchError::HttpStatus(status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let is_html = content_type
            .as_deref()
            .map(|ct| ct.contains("text/html") || ct.contains("application/xhtml+xml"))
            .unwrap_or(false);
        if !is_html {
            return Err(Error::Fetch(FetchError::InvalidContentType(content_type)));
        }

        // Reject oversized bodies before downloading when the server
        // declares a length. Undeclared bodies are truncated below.
        if let Some(declared) = response.content_length() {
            if declared > self.config.max_bytes {
                return Err(Error::Fetch(FetchError::TooLarge {
                    declared,
                    limit: self.config.max_bytes,
                }));
            }
        }

        let final_url = response.url().to_string();

        let mut body: Vec<u8> = Vec::new();
        let mut truncated = false;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    Error::Fetch(FetchError::Timeout(self.config.timeout_secs))
                } else {
                    Error::Fetch(FetchError::Network(e.to_string()))
                }
            })?;

            if append_limited(&mut body, &chunk, self.config.max_bytes as usize) {
                truncated = true;
                break;
            }
        }

        if truncated {
            warn!(
                subsystem = "extract",
                component = "fetcher",
                op = "fetch",
                url = %url,
                limit = self.config.max_bytes,
                "Body exceeded size cap, truncated"
            );
        }

        let html = String::from_utf8_lossy(&body).into_owned();

        debug!(
            subsystem = "extract",
            component = "fetcher",
            op = "fetch",
            url = %url,
            content_len = html.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            truncated,
            "Fetched page"
        );

        Ok(FetchedPage {
            final_url,
            html,
            truncated,
        })
    }
}

/// Append a chunk to the buffer, cutting at `max` bytes. Returns true when
/// the cap was hit. Covers servers that omit or understate Content-Length.
fn append_limited(buf: &mut Vec<u8>, chunk: &[u8], max: usize) -> bool {
    let remaining = max.saturating_sub(buf.len());
    if chunk.len() > remaining {
        buf.extend_from_slice(&chunk[..remaining]);
        true
    } else {
        buf.extend_from_slice(chunk);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn html_response(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
    }

    #[tokio::test]
    async fn test_fetch_returns_html_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(html_response("<html><body>hello</body></html>"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::with_defaults().unwrap();
        let page = fetcher
            .fetch(&format!("{}/article", server.uri()))
            .await
            .unwrap();
        assert!(page.html.contains("hello"));
        assert!(!page.truncated);
    }

    #[tokio::test]
    async fn test_fetch_rejects_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::with_defaults().unwrap();
        let err = fetcher
            .fetch(&format!("{}/gone", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Fetch(FetchError::HttpStatus(404))
        ));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_html_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.pdf"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "application/pdf"),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::with_defaults().unwrap();
        let err = fetcher
            .fetch(&format!("{}/doc.pdf", server.uri()))
            .await
            .unwrap_err();
        match err {
            Error::Fetch(FetchError::InvalidContentType(Some(ct))) => {
                assert!(ct.contains("application/pdf"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_declared_oversize_before_download() {
        let server = MockServer::start().await;
        // 4 KiB body against a 1 KiB cap; Content-Length triggers the guard
        // before any body streaming.
        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(html_response(&"x".repeat(4096)))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(FetchConfig {
            max_bytes: 1024,
            ..FetchConfig::default()
        })
        .unwrap();
        let err = fetcher
            .fetch(&format!("{}/big", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Fetch(FetchError::TooLarge {
                declared: 4096,
                limit: 1024,
            })
        ));
    }

    #[test]
    fn test_append_limited_truncates_at_cap() {
        let mut buf = Vec::new();
        assert!(!append_limited(&mut buf, &[1u8; 600], 1024));
        assert!(append_limited(&mut buf, &[2u8; 600], 1024));
        assert_eq!(buf.len(), 1024);

        // Further chunks after the cap add nothing.
        assert!(append_limited(&mut buf, &[3u8; 10], 1024));
        assert_eq!(buf.len(), 1024);
    }

    #[test]
    fn test_append_limited_exact_fit_is_not_truncation() {
        let mut buf = Vec::new();
        assert!(!append_limited(&mut buf, &[0u8; 1024], 1024));
        assert_eq!(buf.len(), 1024);
    }

    #[tokio::test]
    async fn test_fetch_times_out_slow_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(html_response("late").set_delay(std::time::Duration::from_secs(5)))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(FetchConfig {
            timeout_secs: 1,
            ..FetchConfig::default()
        })
        .unwrap();
        let err = fetcher
            .fetch(&format!("{}/slow", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::Timeout(1))));
    }
}
