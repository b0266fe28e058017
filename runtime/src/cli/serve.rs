// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run the HTTP service in the foreground.

use crate::cli::build_renderer;
use crate::config::Settings;
use crate::extraction::{default_chain, Orchestrator, YtDlpExtractor};
use crate::proxy::ProxyClient;
use crate::rest::{self, AppState};
use anyhow::Result;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::info;

/// Command-line overrides applied on top of the environment settings.
#[derive(Debug, Default, Clone)]
pub struct ServeOptions {
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    pub update_ytdlp: bool,
}

impl ServeOptions {
    fn apply(&self, settings: &mut Settings) {
        if let Some(host) = self.host {
            settings.host = host;
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if self.update_ytdlp {
            settings.update_ytdlp = true;
        }
    }
}

/// Start the service and block until Ctrl-C.
pub async fn run(opts: ServeOptions) -> Result<()> {
    let mut settings = Settings::from_env()?;
    opts.apply(&mut settings);

    info!("starting Mediascout v{}", env!("CARGO_PKG_VERSION"));

    let ytdlp = YtDlpExtractor::from_settings(&settings);
    if settings.update_ytdlp {
        let updater = ytdlp.clone();
        tokio::spawn(async move { updater.self_update().await });
    }

    let renderer = build_renderer(&settings);
    let chain = default_chain(&settings, ytdlp, Arc::clone(&renderer));
    let orchestrator =
        Orchestrator::new(chain).with_source_concurrency(settings.source_concurrency);
    let state = Arc::new(AppState::new(
        orchestrator,
        ProxyClient::new(settings.fetch_timeout),
        renderer,
    ));

    let addr = SocketAddr::new(settings.host, settings.port);
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
    };
    rest::start(addr, state, shutdown).await?;

    info!("Mediascout stopped");
    Ok(())
}
