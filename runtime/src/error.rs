// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Errors surfaced to callers of the download and transcode proxies.
//!
//! Discovery never produces these; its failures are absorbed per source.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mediascout_transcode::TranscodeError;
use tracing::warn;

/// All errors the proxy endpoints can return.
#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    #[error("missing required query parameter: url")]
    MissingUrl,

    #[error("invalid target url: {0}")]
    InvalidUrl(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),

    #[error("image too large: {size} bytes exceeds {max} bytes")]
    TooLarge { size: u64, max: u64 },

    #[error("could not transcode image: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) | ProxyError::UpstreamStatus(_) => StatusCode::BAD_GATEWAY,
            ProxyError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Transcode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("proxy request failed: {self}");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::MissingUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::InvalidUrl("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ProxyError::UpstreamStatus(404).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ProxyError::TooLarge { size: 2, max: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ProxyError::Transcode(TranscodeError::EmptyInput).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
