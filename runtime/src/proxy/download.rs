// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Stream a remote media file back as an attachment.

use super::http_client::ProxyClient;
use crate::error::ProxyError;
use axum::body::Body;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::Response;
use tracing::info;
use url::Url;

/// Filename used when the target URL has no final path segment.
pub const DEFAULT_FILENAME: &str = "media.file";

/// Attachment name for `target`: its last path segment, or the default.
pub fn attachment_filename(target: &Url) -> String {
    target
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|name| {
            name.chars()
                .filter(|c| !matches!(c, '"' | '\\') && !c.is_control())
                .collect::<String>()
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

/// Fetch `target` and stream its body through unmodified.
pub async fn download(client: &ProxyClient, target: &Url) -> Result<Response, ProxyError> {
    let upstream = client.fetch(target).await?;
    let filename = attachment_filename(target);
    info!("proxying download of {target} as {filename:?}");

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\""));
    if let Some(content_type) = upstream.headers().get(CONTENT_TYPE) {
        builder = builder.header(CONTENT_TYPE, content_type.clone());
    }
    if let Some(length) = upstream.headers().get(CONTENT_LENGTH) {
        builder = builder.header(CONTENT_LENGTH, length.clone());
    }

    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| ProxyError::Internal(format!("failed to build download response: {e}")))
}
