//! Target URL validation
//!
//! Pages are keyed by the exact URL string the caller supplies, so nothing
//! here rewrites a URL. Validation only rejects targets no backend can fetch.

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses `url_str` and checks it is an absolute http(s) URL
///
/// The `url` crate refuses http(s) URLs without a host at parse time, so an
/// accepted URL always has one.
///
/// # Examples
///
/// ```
/// use page_harvest::url::validate_target_url;
///
/// let url = validate_target_url("https://example.gov.ph/notice").unwrap();
/// assert_eq!(url.host_str(), Some("example.gov.ph"));
/// assert!(validate_target_url("mailto:info@example.gov.ph").is_err());
/// ```
pub fn validate_target_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    Ok(url)
}
