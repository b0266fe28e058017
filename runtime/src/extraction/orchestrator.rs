// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runs the strategy chain over a batch of source pages.
//!
//! Per source: parse the URL (invalid sources are skipped), then try each
//! strategy in order until one yields candidates. Strategies are mutually
//! exclusive per source; a later one only runs when every earlier one came
//! back empty. Records are materialized afterwards in submission order,
//! which keeps ids strictly increasing across the batch even when sources
//! are discovered concurrently.

use super::{Candidate, Extractor, RunContext};
use crate::media::{MediaRecord, Strategy, SOURCE_TAG};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

/// How one source ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SourceOutcome {
    /// Not a valid http(s) URL; no strategy ran.
    Skipped { reason: String },
    /// Every strategy ran and none found anything.
    Empty,
    /// `strategy` produced `count` records.
    Found { strategy: Strategy, count: usize },
}

/// Diagnostic summary for one submitted source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: String,
    /// Strategies invoked, in order.
    pub attempted: Vec<Strategy>,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

/// Candidates discovered for one source, before id assignment.
struct Discovery {
    page_url: Option<Url>,
    attempted: Vec<Strategy>,
    winner: Option<(Strategy, Vec<Candidate>)>,
    skip_reason: Option<String>,
}

/// The extraction orchestrator.
#[derive(Clone)]
pub struct Orchestrator {
    strategies: Arc<Vec<Arc<dyn Extractor>>>,
    source_concurrency: usize,
}

impl Orchestrator {
    /// Create an orchestrator over an ordered strategy chain.
    pub fn new(strategies: Vec<Arc<dyn Extractor>>) -> Self {
        Self {
            strategies: Arc::new(strategies),
            source_concurrency: 1,
        }
    }

    /// Allow up to `n` sources to be discovered at once (minimum 1).
    pub fn with_source_concurrency(mut self, n: usize) -> Self {
        self.source_concurrency = n.max(1);
        self
    }

    /// Run one batch and return its records.
    pub async fn run(&self, sources: &[String]) -> Vec<MediaRecord> {
        self.run_detailed(sources).await.0
    }

    /// Run one batch, returning the records and one report per source.
    pub async fn run_detailed(&self, sources: &[String]) -> (Vec<MediaRecord>, Vec<SourceReport>) {
        if sources.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let discoveries: Vec<Discovery> = stream::iter(sources.iter().cloned())
            .map(|source| {
                let strategies = Arc::clone(&self.strategies);
                discover_isolated(strategies, source)
            })
            .buffered(self.source_concurrency)
            .collect()
            .await;

        let mut ctx = RunContext::new();
        let mut records = Vec::new();
        let mut reports = Vec::with_capacity(sources.len());

        for (source, discovery) in sources.iter().zip(discoveries) {
            let outcome = match (discovery.page_url, discovery.winner) {
                (Some(page_url), Some((strategy, candidates))) => {
                    let count = candidates.len();
                    records.extend(materialize(&mut ctx, &page_url, strategy, candidates));
                    SourceOutcome::Found { strategy, count }
                }
                (Some(_), None) => SourceOutcome::Empty,
                (None, _) => SourceOutcome::Skipped {
                    reason: discovery
                        .skip_reason
                        .unwrap_or_else(|| "invalid source".to_string()),
                },
            };
            reports.push(SourceReport {
                source: source.clone(),
                attempted: discovery.attempted,
                outcome,
            });
        }

        info!(
            "extraction batch finished: {} sources, {} records",
            sources.len(),
            records.len()
        );
        (records, reports)
    }
}

/// Discover one source in its own task so a panicking strategy only costs
/// that source its results.
async fn discover_isolated(strategies: Arc<Vec<Arc<dyn Extractor>>>, source: String) -> Discovery {
    let label = source.clone();
    match tokio::spawn(discover(strategies, source)).await {
        Ok(discovery) => discovery,
        Err(e) => {
            error!("extraction for source {label:?} aborted: {e}");
            Discovery {
                page_url: None,
                attempted: Vec::new(),
                winner: None,
                skip_reason: Some(format!("extraction aborted: {e}")),
            }
        }
    }
}

async fn discover(strategies: Arc<Vec<Arc<dyn Extractor>>>, source: String) -> Discovery {
    let page_url = match parse_source(&source) {
        Ok(url) => url,
        Err(reason) => {
            warn!("source {source:?} is not a valid URL for extraction, skipping: {reason}");
            return Discovery {
                page_url: None,
                attempted: Vec::new(),
                winner: None,
                skip_reason: Some(reason),
            };
        }
    };

    let mut attempted = Vec::new();
    for extractor in strategies.iter() {
        let strategy = extractor.strategy();
        if let Some(previous) = attempted.last() {
            info!("{previous} found nothing on {page_url}, falling back to {strategy}");
        }
        attempted.push(strategy);

        let candidates = extractor.extract(&page_url).await;
        if !candidates.is_empty() {
            return Discovery {
                page_url: Some(page_url),
                attempted,
                winner: Some((strategy, candidates)),
                skip_reason: None,
            };
        }
    }

    info!("no media found on {page_url}");
    Discovery {
        page_url: Some(page_url),
        attempted,
        winner: None,
        skip_reason: None,
    }
}

/// Accept only absolute http(s) URLs with a host.
fn parse_source(source: &str) -> Result<Url, String> {
    let url = Url::parse(source.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(url)
}

fn materialize(
    ctx: &mut RunContext,
    page_url: &Url,
    strategy: Strategy,
    candidates: Vec<Candidate>,
) -> Vec<MediaRecord> {
    let host = page_url.host_str().unwrap_or_default();
    candidates
        .into_iter()
        .map(|candidate| {
            let kind = strategy.kind_for(&candidate.url);
            MediaRecord {
                id: ctx.next_id(strategy),
                kind,
                thumbnail_url: candidate.thumbnail_url,
                author: candidate.author.unwrap_or_else(|| host.to_string()),
                url: candidate.url,
                source: SOURCE_TAG.to_string(),
                timestamp: Utc::now(),
            }
        })
        .collect()
}
