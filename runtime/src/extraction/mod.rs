// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! The media extraction pipeline.
//!
//! An ordered chain of [`Extractor`] strategies is tried per source page
//! until one yields candidates. The chain built by [`default_chain`] runs
//! the yt-dlp metadata extractor first and the headless-browser scraper
//! second.

pub mod metadata;
pub mod orchestrator;
pub mod scrape;

use crate::config::Settings;
use crate::media::Strategy;
use crate::renderer::Renderer;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

pub use metadata::YtDlpExtractor;
pub use orchestrator::{Orchestrator, SourceOutcome, SourceReport};
pub use scrape::{BrowserScraper, CandidateSet};

/// A media URL found by a strategy, not yet materialized into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute media URL.
    pub url: String,
    pub thumbnail_url: Option<String>,
    /// Attribution reported by the strategy, if any.
    pub author: Option<String>,
}

impl Candidate {
    /// A candidate carrying only a URL.
    pub fn bare(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            thumbnail_url: None,
            author: None,
        }
    }
}

/// One strategy in the extraction chain.
///
/// Implementations absorb their own failures: an empty result is the
/// signal for the orchestrator to move on to the next strategy.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Which strategy this is; decides id prefix and kind policy.
    fn strategy(&self) -> Strategy;

    /// Find media referenced by `page_url`.
    async fn extract(&self, page_url: &Url) -> Vec<Candidate>;
}

/// Per-run state. Lives for one batch and is never shared between runs.
#[derive(Debug, Default)]
pub struct RunContext {
    next_seq: u64,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next record id for `strategy`. The sequence is shared by
    /// all strategies and sources of the run.
    pub fn next_id(&mut self, strategy: Strategy) -> String {
        let seq = self.next_seq;
        self.next_seq += 1;
        format!("{}-{seq}", strategy.id_prefix())
    }
}

/// Build the standard two-strategy chain: yt-dlp metadata, then browser scrape.
pub fn default_chain(
    settings: &Settings,
    ytdlp: YtDlpExtractor,
    renderer: Arc<dyn Renderer>,
) -> Vec<Arc<dyn Extractor>> {
    vec![
        Arc::new(ytdlp),
        Arc::new(BrowserScraper::new(renderer, settings.navigation_timeout)),
    ]
}
