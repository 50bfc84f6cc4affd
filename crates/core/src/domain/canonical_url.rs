// URL Canonicalization (dedup identity)

use url::Url;

/// Tracking query parameters stripped during canonicalization, in addition
/// to every `utm_*` parameter.
const TRACKING_PARAMS: &[&str] = &[
    "ref",
    "ref_src",
    "ref_url",
    "source",
    "fbclid",
    "gclid",
    "msclkid",
    "tracking_id",
    "trackid",
    "campaign",
    "adgroup",
    "keyword",
];

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

fn strip_trailing_slash(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}

/// Turn a raw job URL into a stable comparison key.
///
/// Scheme, host, and path are lower-cased, the fragment is dropped, one
/// trailing slash is stripped, and tracking parameters are removed while the
/// order and values of the remaining query pairs are preserved. Idempotent:
/// canonicalizing a canonical URL is a no-op. Unparseable input falls back
/// to the trimmed, trailing-slash-stripped original instead of failing.
pub fn canonicalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut url = match Url::parse(trimmed) {
        Ok(u) => u,
        Err(_) => return strip_trailing_slash(trimmed).to_string(),
    };

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    let path = strip_trailing_slash(&url.path().to_ascii_lowercase()).to_string();
    url.set_path(&path);

    url.to_string()
}
