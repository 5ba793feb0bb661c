use url::Url;

use super::{IngestError, Result};

/// Extracts the numeric playlist id from a `https://rutube.ru/plst/{id}/` URL.
pub fn parse_playlist_url(raw: &str) -> Result<String> {
    parse_resource_url(raw, "plst", "playlist")
}

/// Extracts the numeric channel id from a `https://rutube.ru/channel/{id}/` URL.
pub fn parse_channel_url(raw: &str) -> Result<String> {
    parse_resource_url(raw, "channel", "channel")
}

fn parse_resource_url(raw: &str, segment: &str, kind: &str) -> Result<String> {
    let invalid = || {
        IngestError::InvalidUrl(format!(
            "Invalid Rutube {} URL. Expected format: https://rutube.ru/{}/{{id}}/, got: {}",
            kind, segment, raw
        ))
    };

    let parsed = Url::parse(raw).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }

    let host = parsed.host_str().unwrap_or_default();
    if host != "rutube.ru" && !host.ends_with(".rutube.ru") {
        return Err(invalid());
    }

    // Trim only the edge slashes; an empty segment in the middle (a doubled
    // slash) must fail the digit check below, not be skipped over.
    let path = parsed.path().trim_matches('/');
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        [first, id, ..]
            if *first == segment && !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) =>
        {
            Ok((*id).to_string())
        }
        _ => Err(invalid()),
    }
}
