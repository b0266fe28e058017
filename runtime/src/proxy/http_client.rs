// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Upstream HTTP client for the proxies.
//!
//! Not a browser, but dressed like one: desktop User-Agent and a Referer
//! set to the target's own origin. No retries.

use crate::error::ProxyError;
use crate::renderer::BROWSER_USER_AGENT;
use reqwest::header::REFERER;
use std::time::Duration;
use url::Url;

/// HTTP client used to fetch proxied media.
#[derive(Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
}

impl ProxyClient {
    /// Create a client with the browser user-agent and the given timeout.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// GET `target`, failing on transport errors and non-success statuses.
    pub async fn fetch(&self, target: &Url) -> Result<reqwest::Response, ProxyError> {
        let resp = self
            .client
            .get(target.clone())
            .header(REFERER, referer_for(target))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus(status.as_u16()));
        }
        Ok(resp)
    }
}

/// Referer sent upstream: the target's origin, e.g. `https://cdn.example.com`.
pub fn referer_for(target: &Url) -> String {
    target.origin().ascii_serialization()
}

/// Validate the `url` query parameter of a proxy request.
pub fn parse_target(raw: Option<&str>) -> Result<Url, ProxyError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ProxyError::MissingUrl)?;
    let url = Url::parse(raw).map_err(|e| ProxyError::InvalidUrl(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProxyError::InvalidUrl(format!(
            "{raw}: unsupported scheme {:?}",
            url.scheme()
        )));
    }
    Ok(url)
}
