//! URL validation and normalization
//!
//! Turns raw chat text into a fetchable URL:
//! - Only HTTP/HTTPS schemes are accepted
//! - Tracking query parameters are stripped
//! - Alternate and mirror hosts of known sources are canonicalized
//!
//! Rewrites are pure string transforms; nothing here touches the network.

use thiserror::Error;
use url::Url;

use crate::core::config::validation::MAX_URL_LENGTH;

/// Validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing left after trimming
    #[error("Empty input")]
    Empty,

    /// Input longer than [`MAX_URL_LENGTH`]
    #[error("URL is too long ({0} characters)")]
    TooLong(usize),

    /// Not an absolute http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// A validated URL plus the form the user originally sent, when a rewrite changed the host.
///
/// The alternate is what the format catalog retries against if the canonical form fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    pub url: Url,
    pub alternate: Option<Url>,
}

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

/// Query parameters that only carry tracking state
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "igshid", "igsh", "si", "feature", "ref_src", "ref_url"];

/// Hosts rewritten to the primary host of the same source.
/// Ordered most specific first; a host matches one rule at most.
const HOST_ALIASES: &[(&str, &str)] = &[
    ("mobile.twitter.com", "twitter.com"),
    ("mobile.x.com", "twitter.com"),
    ("www.x.com", "twitter.com"),
    ("music.youtube.com", "www.youtube.com"),
    ("m.youtube.com", "www.youtube.com"),
    ("m.facebook.com", "www.facebook.com"),
    ("vxtwitter.com", "twitter.com"),
    ("fxtwitter.com", "twitter.com"),
    ("x.com", "twitter.com"),
];

const TWITTER_HOSTS: &[&str] = &["twitter.com", "www.twitter.com"];

/// Validates raw chat text and rewrites it into its canonical fetchable form.
///
/// # Examples
/// ```
/// use clipferry::core::validation::normalize_url;
///
/// let normalized = normalize_url("  https://youtu.be/dQw4w9WgXcQ?si=abc ").unwrap();
/// assert_eq!(normalized.as_str(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
/// assert!(normalized.alternate.is_some());
///
/// assert!(normalize_url("hello there").is_err());
/// assert!(normalize_url("ftp://example.com/file").is_err());
/// ```
pub fn normalize_url(raw: &str) -> Result<NormalizedUrl, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(ValidationError::TooLong(trimmed.len()));
    }

    let lowered = trimmed.to_ascii_lowercase();
    if !lowered.starts_with("http://") && !lowered.starts_with("https://") {
        return Err(ValidationError::InvalidUrl(trimmed.to_string()));
    }

    let original = Url::parse(trimmed).map_err(|_| ValidationError::InvalidUrl(trimmed.to_string()))?;
    let original_host = match original.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => return Err(ValidationError::InvalidUrl(trimmed.to_string())),
    };

    let mut url = original.clone();
    canonicalize_host(&mut url);
    rewrite_youtube_paths(&mut url);
    strip_tracking_params(&mut url);

    let alternate = match url.host_str() {
        Some(host) if host != original_host => Some(original),
        _ => None,
    };

    Ok(NormalizedUrl { url, alternate })
}

fn canonicalize_host(url: &mut Url) {
    let Some(host) = url.host_str().map(|h| h.to_ascii_lowercase()) else {
        return;
    };

    if let Some((_, primary)) = HOST_ALIASES.iter().find(|(alias, _)| *alias == host) {
        if url.set_host(Some(primary)).is_err() {
            log::warn!("Failed to rewrite host {} -> {}", host, primary);
        }
    }
}

fn rewrite_youtube_paths(url: &mut Url) {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();

    let video_id = if host == "youtu.be" || host == "www.youtu.be" {
        url.path_segments().and_then(|mut s| s.next()).map(str::to_string)
    } else if host == "youtube.com" || host == "www.youtube.com" {
        let mut segments = url.path_segments().into_iter().flatten();
        match (segments.next(), segments.next()) {
            (Some("shorts"), Some(id)) => Some(id.to_string()),
            _ => None,
        }
    } else {
        None
    };

    let Some(video_id) = video_id.filter(|id| !id.is_empty()) else {
        return;
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "v")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if url.set_host(Some("www.youtube.com")).is_err() {
        log::warn!("Failed to rewrite host {} -> www.youtube.com", host);
        return;
    }
    url.set_path("/watch");
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("v", &video_id);
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
    }
}

fn is_tracking_param(key: &str, host: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key) || (key == "s" && TWITTER_HOSTS.contains(&host))
}

fn strip_tracking_params(url: &mut Url) {
    if url.query().is_none() {
        return;
    }
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key, &host))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.set_query(None);
    if !kept.is_empty() {
        url.query_pairs_mut().extend_pairs(kept);
    }
}
