// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Extension-based media classification.

use super::MediaKind;
use url::Url;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Classify a URL by the extension of its path.
///
/// Query string and fragment are ignored. Anything that is not a known
/// video extension is reported as an image, including unknown extensions.
pub fn classify(url: &str) -> MediaKind {
    match extension_of(url) {
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Video,
        _ => MediaKind::Image,
    }
}

/// Whether the URL's path ends in one of the known image or video extensions.
pub fn is_media_url(url: &str) -> bool {
    extension_of(url).is_some_and(|ext| {
        VIDEO_EXTENSIONS.contains(&ext.as_str()) || IMAGE_EXTENSIONS.contains(&ext.as_str())
    })
}

/// Lowercased extension of the URL's final path segment.
///
/// Accepts absolute URLs as well as bare paths like `a.mp4`.
fn extension_of(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let file = path.rsplit('/').next()?;
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() && ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
