//! Playlist-pointer resolution: one small HTTP fetch turning a station's
//! pointer URL into the actual stream URLs it names.

use tracing::debug;

use crate::error::{DirectoryError, Result};
use crate::source::fetch_text;

pub struct PlaylistResolver {
    client: reqwest::Client,
}

impl PlaylistResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch `pointer_url` and extract its stream URLs, ordered by
    /// preference. One outbound request, no retries; retry by
    /// re-activating the station.
    pub async fn resolve(&self, pointer_url: &str) -> Result<Vec<String>> {
        let body = fetch_text(&self.client, pointer_url).await?;
        let urls = parse_playlist(pointer_url, &body)?;
        debug!(pointer = %pointer_url, count = urls.len(), "playlist resolved");
        Ok(urls)
    }
}

/// Extract stream URLs from a playlist body. Recognises PLS (`[playlist]`
/// sections / `FileN=` entries) and plain one-URL-per-line lists (M3U and
/// friends; `#` lines are comments). Anything else is a parse error;
/// never guess at markup.
pub fn parse_playlist(pointer_url: &str, body: &str) -> Result<Vec<String>> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        return Err(DirectoryError::parse(
            pointer_url,
            "content is markup, not a playlist",
        ));
    }

    let urls = if is_pls(pointer_url, trimmed) {
        parse_pls(pointer_url, body)?
    } else {
        parse_plain(pointer_url, body)?
    };

    if urls.is_empty() {
        return Err(DirectoryError::parse(pointer_url, "playlist lists no stream URLs"));
    }
    Ok(urls)
}

fn is_pls(pointer_url: &str, body: &str) -> bool {
    let first_line = body.lines().next().unwrap_or("").trim();
    first_line.eq_ignore_ascii_case("[playlist]")
        || pointer_url.to_ascii_lowercase().ends_with(".pls")
}

/// `FileN=<url>` entries in appearance order.
fn parse_pls(pointer_url: &str, body: &str) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let suffix = key.strip_prefix("file").unwrap_or("");
        if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
            urls.push(resolve_relative(pointer_url, value.trim())?);
        }
    }
    Ok(urls)
}

/// One URL per line; blank lines and `#` comments ignored. A non-comment
/// line that is not a URL makes the whole body unrecognisable.
fn parse_plain(pointer_url: &str, body: &str) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // Prose ("Service unavailable") would otherwise URL-join cleanly
        // as a relative path; a playlist entry never contains whitespace.
        if line.chars().any(char::is_whitespace) {
            return Err(DirectoryError::parse(
                pointer_url,
                format!("line {line:?} is not a stream URL"),
            ));
        }
        urls.push(resolve_relative(pointer_url, line)?);
    }
    Ok(urls)
}

fn resolve_relative(base: &str, candidate: &str) -> Result<String> {
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return Ok(candidate.to_string());
    }
    let base_url = reqwest::Url::parse(base)
        .map_err(|e| DirectoryError::parse(base, format!("bad pointer URL: {e}")))?;
    base_url
        .join(candidate)
        .map(|u| u.to_string())
        .map_err(|e| DirectoryError::parse(base, format!("entry {candidate:?} is not a URL: {e}")))
}
