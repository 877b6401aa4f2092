//! URL canonicalization for per-user bookmark dedup.

use url::Url;

use crate::error::{Error, Result};

/// Query parameters stripped during normalization (tracking noise).
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "msclkid", "mc_cid", "mc_eid", "igshid", "ref_src",
];

/// Canonicalize a URL for the `(user_id, normalized_url)` unique index.
///
/// Lowercases scheme and host, drops default ports, strips the fragment,
/// removes `utm_*` and click-tracking query parameters, and trims a
/// trailing slash from non-root paths. The submitted URL is stored
/// unchanged alongside this value.
pub fn normalize_url(raw: &str) -> Result<String> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| Error::InvalidInput(format!("Invalid URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidInput(format!(
            "Unsupported URL scheme: {}",
            url.scheme()
        )));
    }

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !k.starts_with("utm_") && !TRACKING_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        let query = kept
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.clone()
                } else {
                    format!("{}={}", k, v)
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
    }

    // Url::parse already lowercases scheme and host and drops default ports.
    let mut normalized = url.to_string();
    if url.path() != "/" && url.query().is_none() && normalized.ends_with('/') {
        normalized.pop();
    }
    Ok(normalized)
}
