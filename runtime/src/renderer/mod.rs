// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). A context
//! records every outgoing request URL from the moment it is created, so
//! network interception is in place before the first navigation.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Desktop browser identity used by the headless browser and the proxies.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/131.0.0.0 Safari/537.36";

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken until the network went quiet, in milliseconds.
    pub load_time_ms: u64,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new, isolated browser context. Contexts are never reused.
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Whether this renderer can produce contexts at all.
    fn is_available(&self) -> bool;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context for rendering one page.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL and wait for network quiescence, within `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<NavigationResult>;
    /// Every request URL observed so far, in the order they were sent.
    fn requested_urls(&self) -> Vec<String>;
    /// Get the full rendered page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Close this context and release its browser process.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A no-op renderer used when Chromium is unavailable.
///
/// The metadata strategy works without a browser; the scrape strategy
/// logs the failure and yields nothing.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("Browser not available (no Chromium found)"))
    }
    fn is_available(&self) -> bool {
        false
    }
    fn active_contexts(&self) -> usize {
        0
    }
}
