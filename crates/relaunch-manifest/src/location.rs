use std::path::Path;

use url::Url;

use crate::{ManifestError, Result};

/// Parse a manifest or source location given on the command line.
///
/// Absolute URLs are taken as-is; anything else is a filesystem path,
/// resolved against `base` when relative.
pub fn parse_location(raw: &str, base: &Path) -> Result<Url> {
    if let Ok(url) = Url::parse(raw) {
        // A single-letter scheme is a Windows drive, not a URL.
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let path = Path::new(raw);
    let path = if path.is_absolute() { path.to_path_buf() } else { base.join(path) };
    Url::from_file_path(&path).map_err(|_| ManifestError::InvalidUri(raw.to_string()))
}

/// `url` with a trailing `/` so joins keep its last segment.
pub fn base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
