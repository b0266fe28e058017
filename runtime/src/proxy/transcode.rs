// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fetch an image and re-encode it with a fixed optimisation profile.

use super::http_client::ProxyClient;
use crate::error::ProxyError;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::Response;
use futures::StreamExt;
use mediascout_transcode::{transform, Profile};
use tracing::info;
use url::Url;

/// Largest upstream image accepted for transcoding (25 MiB).
pub const MAX_IMAGE_BYTES: u64 = 25 * 1024 * 1024;

/// Fetch `target`, apply `profile` and return the re-encoded image.
pub async fn transcode(
    client: &ProxyClient,
    target: &Url,
    profile: Profile,
) -> Result<Response, ProxyError> {
    let upstream = client.fetch(target).await?;
    if let Some(size) = upstream.content_length() {
        if size > MAX_IMAGE_BYTES {
            return Err(ProxyError::TooLarge {
                size,
                max: MAX_IMAGE_BYTES,
            });
        }
    }

    let mut bytes = Vec::new();
    let mut body = upstream.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        bytes.extend_from_slice(&chunk);
        if bytes.len() as u64 > MAX_IMAGE_BYTES {
            return Err(ProxyError::TooLarge {
                size: bytes.len() as u64,
                max: MAX_IMAGE_BYTES,
            });
        }
    }

    let input_len = bytes.len();
    let out = tokio::task::spawn_blocking(move || transform(&bytes, profile))
        .await
        .map_err(|e| ProxyError::Internal(format!("transcode task failed: {e}")))??;

    info!(
        "transcoded {target} with profile {profile}: {input_len} -> {} bytes",
        out.bytes.len()
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, out.content_type)
        .body(Body::from(out.bytes))
        .map_err(|e| ProxyError::Internal(format!("failed to build transcode response: {e}")))
}
