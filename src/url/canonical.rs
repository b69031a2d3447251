use crate::{UrlError, UrlResult};
use url::Url;

/// Tracking query parameters removed during canonicalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "_ga"];

/// Resolves `href` against `base` and canonicalizes the result
///
/// # Canonicalization Steps
///
/// 1. Resolve relative references against the page the link appeared on
/// 2. Reject anything that is not HTTP(S) or has no host
/// 3. Remove the fragment (everything after #)
/// 4. Remove tracking query parameters (`utm_*`, `fbclid`, ...)
/// 5. Sort remaining query parameters by key
/// 6. Remove an empty query string
///
/// Host lowercasing, dot-segment removal and percent-encoding of non-ASCII
/// path characters are done by the `url` parser itself, so
/// `/wiki/Pokémon` and `/wiki/Pok%C3%A9mon` canonicalize identically.
///
/// # Examples
///
/// ```
/// use dex_harvest::url::canonicalize_url;
/// use url::Url;
///
/// let base = Url::parse("https://EXAMPLE.com/wiki/List").unwrap();
/// let url = canonicalize_url("/wiki/Charizard?utm_source=x#Stats", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/wiki/Charizard");
/// ```
pub fn canonicalize_url(href: &str, base: &Url) -> UrlResult<Url> {
    let mut url = base
        .join(href.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Checks if a query parameter is a tracking parameter
pub fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
