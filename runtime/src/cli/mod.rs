// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations for the Mediascout binary.

pub mod doctor;
pub mod extract_cmd;
pub mod serve;

use crate::config::Settings;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::{NoopRenderer, Renderer};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `mediascout=info`, or
/// `mediascout=debug` with `--verbose`. Logs go to stderr.
pub fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "mediascout={default_level},mediascout_runtime={default_level},mediascout_transcode={default_level}"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {e}");
    }
}

/// Launch-capable Chromium renderer if one is installed, else the no-op one.
pub fn build_renderer(settings: &Settings) -> Arc<dyn Renderer> {
    match ChromiumRenderer::discover(settings.chromium_path.as_deref()) {
        Ok(renderer) => {
            info!("Chromium found at {}", renderer.executable().display());
            Arc::new(renderer)
        }
        Err(e) => {
            warn!("Chromium unavailable: {e}");
            warn!("browser fallback disabled; only yt-dlp extraction will run");
            Arc::new(NoopRenderer)
        }
    }
}
