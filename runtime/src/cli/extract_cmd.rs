// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! One-shot extraction from the command line.

use crate::cli::build_renderer;
use crate::config::Settings;
use crate::extraction::{default_chain, Orchestrator, SourceOutcome, YtDlpExtractor};
use anyhow::Result;
use tracing::info;

/// Run one batch over `sources` and print the records as JSON on stdout.
pub async fn run(sources: Vec<String>) -> Result<()> {
    let settings = Settings::from_env()?;
    let ytdlp = YtDlpExtractor::from_settings(&settings);
    let renderer = build_renderer(&settings);
    let orchestrator = Orchestrator::new(default_chain(&settings, ytdlp, renderer))
        .with_source_concurrency(settings.source_concurrency);

    let sources: Vec<String> = sources
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let (records, reports) = orchestrator.run_detailed(&sources).await;
    for report in &reports {
        match &report.outcome {
            SourceOutcome::Found { strategy, count } => {
                info!("{}: {count} item(s) via {strategy}", report.source)
            }
            SourceOutcome::Empty => info!("{}: nothing found", report.source),
            SourceOutcome::Skipped { reason } => info!("{}: skipped ({reason})", report.source),
        }
    }

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
