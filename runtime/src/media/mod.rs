// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Media records emitted by the extraction pipeline.

pub mod classify;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use classify::{classify, is_media_url};

/// Provenance tag carried by every record.
pub const SOURCE_TAG: &str = "web";

/// Kind of a discovered media resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// The extraction strategy that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Structured metadata from the yt-dlp subprocess.
    Metadata,
    /// Headless-browser network interception plus DOM scan.
    Scrape,
}

impl Strategy {
    /// Prefix of record ids minted for this strategy.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Strategy::Metadata => "yt-dlp",
            Strategy::Scrape => "scrape",
        }
    }

    /// Kind assigned to a record from this strategy. Metadata entries are
    /// always videos; scraped URLs go through the classifier.
    pub fn kind_for(&self, url: &str) -> MediaKind {
        match self {
            Strategy::Metadata => MediaKind::Video,
            Strategy::Scrape => classify(url),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id_prefix())
    }
}

/// One discovered media item, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    /// `{strategy}-{sequence}`, unique within one pipeline run.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Absolute resource URL.
    pub url: String,
    /// Preview image; only set on metadata-sourced videos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Uploader name, else the source page's hostname.
    pub author: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_shape() {
        let record = MediaRecord {
            id: "scrape-3".to_string(),
            kind: MediaKind::Image,
            url: "https://cdn.example.com/a.png".to_string(),
            thumbnail_url: None,
            author: "example.com".to_string(),
            source: SOURCE_TAG.to_string(),
            timestamp: Utc::now(),
        };
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["id"], "scrape-3");
        assert_eq!(v["type"], "image");
        assert_eq!(v["source"], "web");
        assert!(v.get("thumbnailUrl").is_none());
        assert!(v["timestamp"].is_string());
    }

    #[test]
    fn test_strategy_kind_policy() {
        assert_eq!(Strategy::Metadata.kind_for("https://x.com/a.png"), MediaKind::Video);
        assert_eq!(Strategy::Scrape.kind_for("https://x.com/a.png"), MediaKind::Image);
        assert_eq!(Strategy::Scrape.kind_for("https://x.com/a.webm"), MediaKind::Video);
        assert_eq!(Strategy::Metadata.id_prefix(), "yt-dlp");
        assert_eq!(Strategy::Scrape.id_prefix(), "scrape");
    }
}
