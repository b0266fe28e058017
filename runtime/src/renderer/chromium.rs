// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-based renderer using chromiumoxide.
//!
//! Every context is its own headless browser process with a throwaway
//! profile directory. Outgoing requests are observed, never intercepted
//! or altered.

use super::{NavigationResult, RenderContext, Renderer, BROWSER_USER_AGENT};
use crate::tools;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The network counts as idle with at most this many requests in flight...
pub const NETWORK_IDLE_MAX_INFLIGHT: usize = 2;

/// ...sustained for this long.
pub const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

/// Upper bound on each step of browser shutdown.
const SHUTDOWN_STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    executable: PathBuf,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    pub fn new(executable: PathBuf) -> Self {
        Self {
            executable,
            active_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Locate Chromium (explicit path, `~/.mediascout/chromium`, `PATH`).
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let executable = tools::find_chromium(explicit)
            .context("Chromium not found. Set MEDIASCOUT_CHROMIUM_PATH or install Chrome.")?;
        Ok(Self::new(executable))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    async fn launch(&self) -> Result<ChromiumContext> {
        let profile_dir =
            std::env::temp_dir().join(format!("mediascout-chromium-{}", uuid::Uuid::new_v4()));

        let config = BrowserConfig::builder()
            .chrome_executable(&self.executable)
            .user_data_dir(&profile_dir)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| anyhow!("failed to build browser config: {e}"))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("chromium handler: {e}");
                }
            }
        });

        let prepared = prepare_page(&browser).await;
        let (page, sent, finished, failed) = match prepared {
            Ok(parts) => parts,
            Err(e) => {
                shutdown_browser(&mut browser).await;
                handler_task.abort();
                remove_profile(&profile_dir).await;
                return Err(e);
            }
        };

        let requested = Arc::new(Mutex::new(Vec::new()));
        let (inflight_tx, inflight_rx) = watch::channel(0usize);
        let tracker_task = tokio::spawn(track_requests(
            sent,
            finished,
            failed,
            Arc::clone(&requested),
            inflight_tx,
        ));

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(ChromiumContext {
            browser,
            page,
            handler_task,
            tracker_task,
            requested,
            inflight: inflight_rx,
            profile_dir,
            active_count: Arc::clone(&self.active_count),
            closed: false,
        })
    }
}

type PreparedPage = (
    Page,
    EventStream<EventRequestWillBeSent>,
    EventStream<EventLoadingFinished>,
    EventStream<EventLoadingFailed>,
);

/// Open a blank page with the browser identity set and request listeners
/// attached.
async fn prepare_page(browser: &Browser) -> Result<PreparedPage> {
    let page = browser
        .new_page("about:blank")
        .await
        .context("failed to create new page")?;
    page.execute(SetUserAgentOverrideParams::new(BROWSER_USER_AGENT))
        .await
        .context("failed to set user agent")?;
    page.execute(EnableParams::default())
        .await
        .context("failed to enable network events")?;

    let sent = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .context("failed to subscribe to requests")?;
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await
        .context("failed to subscribe to finished loads")?;
    let failed = page
        .event_listener::<EventLoadingFailed>()
        .await
        .context("failed to subscribe to failed loads")?;

    Ok((page, sent, finished, failed))
}

/// Record request URLs and publish the number of in-flight requests.
async fn track_requests(
    mut sent: EventStream<EventRequestWillBeSent>,
    mut finished: EventStream<EventLoadingFinished>,
    mut failed: EventStream<EventLoadingFailed>,
    requested: Arc<Mutex<Vec<String>>>,
    inflight_tx: watch::Sender<usize>,
) {
    let mut inflight: HashSet<String> = HashSet::new();
    loop {
        tokio::select! {
            Some(event) = sent.next() => {
                let url = event.request.url.clone();
                // data: URLs never report completion.
                if !url.starts_with("data:") {
                    inflight.insert(event.request_id.inner().clone());
                }
                requested
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(url);
            }
            Some(event) = finished.next() => {
                inflight.remove(event.request_id.inner());
            }
            Some(event) = failed.next() => {
                inflight.remove(event.request_id.inner());
            }
            else => break,
        }
        inflight_tx.send_replace(inflight.len());
    }
}

/// Resolve once at most `max_inflight` requests have been in flight for a
/// continuous `window`, or once the tracker has gone away.
pub(crate) async fn wait_for_network_idle(
    inflight: &mut watch::Receiver<usize>,
    max_inflight: usize,
    window: Duration,
) {
    loop {
        if *inflight.borrow_and_update() > max_inflight {
            if inflight.changed().await.is_err() {
                return;
            }
            continue;
        }

        let quiet_until = tokio::time::Instant::now() + window;
        loop {
            match tokio::time::timeout_at(quiet_until, inflight.changed()).await {
                Err(_) => return,
                Ok(Err(_)) => return,
                Ok(Ok(())) => {
                    if *inflight.borrow_and_update() > max_inflight {
                        break;
                    }
                }
            }
        }
    }
}

async fn shutdown_browser(browser: &mut Browser) {
    match tokio::time::timeout(SHUTDOWN_STEP_TIMEOUT, browser.close()).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!("failed to close Chromium: {e}"),
        Err(_) => warn!("timed out closing Chromium"),
    }
    match tokio::time::timeout(SHUTDOWN_STEP_TIMEOUT, browser.wait()).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!("failed to reap Chromium process: {e}"),
        Err(_) => warn!("timed out waiting for Chromium to exit"),
    }
}

async fn remove_profile(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        debug!("could not remove browser profile {}: {e}", dir.display());
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Ok(Box::new(self.launch().await?))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// One headless browser process with a single page.
pub struct ChromiumContext {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    tracker_task: JoinHandle<()>,
    requested: Arc<Mutex<Vec<String>>>,
    inflight: watch::Receiver<usize>,
    profile_dir: PathBuf,
    active_count: Arc<AtomicUsize>,
    closed: bool,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<NavigationResult> {
        let start = Instant::now();
        let page = &self.page;
        let inflight = &mut self.inflight;

        let result = tokio::time::timeout(timeout, async {
            page.goto(url).await?;
            wait_for_network_idle(inflight, NETWORK_IDLE_MAX_INFLIGHT, NETWORK_IDLE_WINDOW).await;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(())) => {
                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {}ms", timeout.as_millis()),
        }
    }

    fn requested_urls(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn get_html(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to get HTML")?;

        let html: String = result
            .into_value()
            .map_err(|e| anyhow!("failed to convert HTML result: {e:?}"))?;

        Ok(html)
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        self.closed = true;
        self.tracker_task.abort();
        shutdown_browser(&mut self.browser).await;
        self.handler_task.abort();
        remove_profile(&self.profile_dir).await;
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Drop for ChromiumContext {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Dropping `Browser` kills the child process.
        warn!("browser context dropped without close; killing Chromium");
        self.tracker_task.abort();
        self.handler_task.abort();
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = std::fs::remove_dir_all(&self.profile_dir);
    }
}
