//! Shareable links: the query lives in the URL fragment.

use url::{Url, form_urlencoded};

use crate::errors::{CspBypassError, Result};

/// Link to `base` that restores `query` when opened.
pub fn link_for(base: &str, query: &str) -> Result<Url> {
    let mut url =
        Url::parse(base).map_err(|e| CspBypassError::invalid_link(base, e.to_string()))?;
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    url.set_fragment(if encoded.is_empty() {
        None
    } else {
        Some(&encoded)
    });
    Ok(url)
}

/// Query stored in a link's fragment, if any.
///
/// Accepts both `+` and `%20` for spaces so links produced by other
/// encoders restore as well.
pub fn query_from_link(link: &str) -> Result<Option<String>> {
    let url = Url::parse(link).map_err(|e| CspBypassError::invalid_link(link, e.to_string()))?;
    let Some(fragment) = url.fragment().filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    // One opaque value: bare '&' and '=' are data, not pair separators.
    let opaque = fragment.replace('&', "%26").replace('=', "%3D");
    let decoded = form_urlencoded::parse(opaque.as_bytes())
        .next()
        .map(|(value, _)| value.into_owned())
        .unwrap_or_default();
    if decoded.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(decoded))
    }
}
