use crate::UrlError;
use url::Url;

/// Scheme prefix that is rejected before any parsing takes place
const JAVASCRIPT_SCHEME: &str = "javascript:";

/// Resolves a link reference against the page it was found on
///
/// # Resolution Steps
///
/// 1. Reject `javascript:` references outright
/// 2. Parse the reference and resolve it against `base` (standard URL-reference
///    resolution, including dot-segment removal)
/// 3. Reject anything that did not resolve to an `http` or `https` URL
/// 4. Remove the fragment (everything after #)
///
/// # Arguments
///
/// * `base` - The absolute URL of the page containing the link
/// * `relative` - The raw `href` value
///
/// # Returns
///
/// * `Ok(Url)` - Canonical absolute URL without a fragment
/// * `Err(UrlError)` - The reference was rejected or could not be parsed
///
/// # Examples
///
/// ```
/// use loopcrawl::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://a.com/x/y/").unwrap();
/// let url = resolve(&base, "../z#top").unwrap();
/// assert_eq!(url.as_str(), "https://a.com/x/z");
/// ```
pub fn resolve(base: &Url, relative: &str) -> Result<Url, UrlError> {
    if has_javascript_scheme(relative) {
        return Err(UrlError::SchemeRejected(relative.to_string()));
    }

    let mut url = base
        .join(relative)
        .map_err(|e| UrlError::Parse(format!("{}: {}", relative, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::UnsupportedScheme {
            scheme: url.scheme().to_string(),
            url: url.to_string(),
        });
    }

    url.set_fragment(None);

    Ok(url)
}

/// Checks for a `javascript:` prefix the same way the URL parser would see it:
/// leading whitespace ignored, scheme compared case-insensitively
fn has_javascript_scheme(reference: &str) -> bool {
    let trimmed = reference.trim_start();
    trimmed
        .get(..JAVASCRIPT_SCHEME.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(JAVASCRIPT_SCHEME))
}
