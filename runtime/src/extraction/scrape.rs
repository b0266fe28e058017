// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Headless-browser fallback: network interception plus rendered-DOM scan.
//!
//! One disposable browser context per page. Media-looking request URLs
//! observed during navigation are collected first; once the network has
//! settled the rendered DOM is scanned for `<img>` and `<video>` sources.
//! Both feed a single [`CandidateSet`] that keeps first-seen order.

use super::{Candidate, Extractor};
use crate::media::{is_media_url, Strategy};
use crate::renderer::{RenderContext, Renderer};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Insertion-ordered set of media URLs, deduplicated by exact string.
#[derive(Debug, Default, Clone)]
pub struct CandidateSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a URL; returns `false` if the exact string was already present.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.order.push(url);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

impl Extend<String> for CandidateSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for url in iter {
            self.insert(url);
        }
    }
}

/// Fallback strategy driving a fresh browser context per page.
pub struct BrowserScraper {
    renderer: Arc<dyn Renderer>,
    navigation_timeout: Duration,
}

impl BrowserScraper {
    pub fn new(renderer: Arc<dyn Renderer>, navigation_timeout: Duration) -> Self {
        Self {
            renderer,
            navigation_timeout,
        }
    }

    /// Scrape `page_url`, returning deduplicated absolute media URLs.
    ///
    /// Never fails: launch errors give an empty list, navigation errors and
    /// timeouts give whatever the network observer captured before them.
    pub async fn scrape(&self, page_url: &Url) -> Vec<String> {
        info!("browser scrape started for {page_url}");

        let mut ctx = match self.renderer.new_context().await {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("browser scrape skipped for {page_url}: {e:#}");
                return Vec::new();
            }
        };

        let found = self.collect(ctx.as_mut(), page_url).await;

        if let Err(e) = ctx.close().await {
            warn!("failed to close browser context for {page_url}: {e:#}");
        }

        if found.is_empty() {
            info!("browser scrape found no media on {page_url}");
        } else {
            info!(
                "browser scrape finished for {page_url}: {} media items",
                found.len()
            );
        }
        found.into_vec()
    }

    async fn collect(&self, ctx: &mut dyn RenderContext, page_url: &Url) -> CandidateSet {
        let mut found = CandidateSet::new();
        let started = Instant::now();
        let navigation = ctx.navigate(page_url.as_str(), self.navigation_timeout).await;

        found.extend(
            ctx.requested_urls()
                .into_iter()
                .filter(|u| is_media_url(u)),
        );

        match navigation {
            Ok(nav) => {
                debug!(
                    "{page_url} settled in {}ms at {}",
                    nav.load_time_ms, nav.final_url
                );
                // DOM capture shares the navigation deadline.
                let remaining = self.navigation_timeout.saturating_sub(started.elapsed());
                match tokio::time::timeout(remaining, ctx.get_html()).await {
                    Ok(Ok(html)) => found.extend(scan_rendered_dom(&html, page_url)),
                    Ok(Err(e)) => warn!("could not read rendered DOM of {page_url}: {e:#}"),
                    Err(_) => warn!(
                        "rendered DOM of {page_url} not captured within {}ms",
                        self.navigation_timeout.as_millis()
                    ),
                }
            }
            Err(e) => {
                warn!(
                    "navigation to {page_url} did not settle ({e:#}); keeping {} captured requests",
                    found.len()
                );
            }
        }

        found
    }
}

#[async_trait]
impl Extractor for BrowserScraper {
    fn strategy(&self) -> Strategy {
        Strategy::Scrape
    }

    async fn extract(&self, page_url: &Url) -> Vec<Candidate> {
        self.scrape(page_url)
            .await
            .into_iter()
            .map(Candidate::bare)
            .collect()
    }
}

fn img_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("img").expect("img selector is valid"))
}

fn video_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("video").expect("video selector is valid"))
}

fn source_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("source").expect("source selector is valid"))
}

/// Collect `<img src>` and `<video>` sources from rendered HTML.
///
/// A `<video>` contributes its own `src`, else its first `<source>`
/// child's. Relative references are resolved against `page_url`; ones
/// that cannot be resolved are skipped. Output is in document order and
/// may contain duplicates.
pub fn scan_rendered_dom(html: &str, page_url: &Url) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut urls = Vec::new();

    let mut push = |src: Option<&str>| {
        let Some(src) = src.map(str::trim).filter(|s| !s.is_empty()) else {
            return;
        };
        match page_url.join(src) {
            Ok(resolved) => urls.push(resolved.to_string()),
            Err(e) => debug!("skipping unresolvable media reference {src:?}: {e}"),
        }
    };

    for img in doc.select(img_selector()) {
        push(img.value().attr("src"));
    }

    for video in doc.select(video_selector()) {
        let src = video.value().attr("src").or_else(|| {
            video
                .select(source_selector())
                .next()
                .and_then(|s| s.value().attr("src"))
        });
        push(src);
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::NavigationResult;
    use anyhow::{bail, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn page() -> Url {
        Url::parse("https://news.example.com/articles/1").unwrap()
    }

    #[test]
    fn test_candidate_set_dedup_keeps_first_order() {
        let mut set = CandidateSet::new();
        assert!(set.insert("https://a.com/1.jpg"));
        assert!(set.insert("https://a.com/2.jpg"));
        assert!(!set.insert("https://a.com/1.jpg"));
        assert!(set.insert("https://a.com/1.jpg?v=2"));
        assert!(!set.is_empty());
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.into_vec(),
            vec!["https://a.com/1.jpg", "https://a.com/2.jpg", "https://a.com/1.jpg?v=2"]
        );
    }

    #[test]
    fn test_scan_images_and_videos() {
        let html = r#"
            <html><body>
              <img src="/static/hero.jpg">
              <img src="https://cdn.example.com/abs.png">
              <img alt="no source">
              <img src="  ">
              <video src="clip.webm"></video>
              <video poster="p.jpg">
                <source src="../media/first.mp4" type="video/mp4">
                <source src="../media/second.webm" type="video/webm">
              </video>
              <video></video>
            </body></html>
        "#;
        let urls = scan_rendered_dom(html, &page());
        assert_eq!(
            urls,
            vec![
                "https://news.example.com/static/hero.jpg",
                "https://cdn.example.com/abs.png",
                "https://news.example.com/articles/clip.webm",
                "https://news.example.com/media/first.mp4",
            ]
        );
    }

    #[test]
    fn test_scan_prefers_video_src_over_source_child() {
        let html = r#"<video src="own.mp4"><source src="child.mp4"></video>"#;
        let urls = scan_rendered_dom(html, &page());
        assert_eq!(urls, vec!["https://news.example.com/articles/own.mp4"]);
    }

    /// Scripted render context for exercising the scraper without a browser.
    struct FakeContext {
        requests: Vec<String>,
        html: Result<String, String>,
        navigation_error: Option<String>,
        html_hangs: bool,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RenderContext for FakeContext {
        async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<NavigationResult> {
            if let Some(e) = &self.navigation_error {
                bail!("{e}");
            }
            Ok(NavigationResult {
                final_url: url.to_string(),
                load_time_ms: 1,
            })
        }
        fn requested_urls(&self) -> Vec<String> {
            self.requests.clone()
        }
        async fn get_html(&self) -> Result<String> {
            if self.html_hangs {
                futures::future::pending::<()>().await;
            }
            self.html.clone().map_err(|e| anyhow::anyhow!(e))
        }
        async fn close(self: Box<Self>) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FakeRenderer {
        requests: Vec<String>,
        html: Result<String, String>,
        navigation_error: Option<String>,
        html_hangs: bool,
        launch_error: bool,
        launches: AtomicUsize,
        closes: Arc<AtomicUsize>,
    }

    impl FakeRenderer {
        fn new(requests: &[&str], html: &str) -> Self {
            Self {
                requests: requests.iter().map(|s| s.to_string()).collect(),
                html: Ok(html.to_string()),
                navigation_error: None,
                html_hangs: false,
                launch_error: false,
                launches: AtomicUsize::new(0),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Renderer for FakeRenderer {
        async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            if self.launch_error {
                bail!("chromium exploded");
            }
            Ok(Box::new(FakeContext {
                requests: self.requests.clone(),
                html: self.html.clone(),
                navigation_error: self.navigation_error.clone(),
                html_hangs: self.html_hangs,
                closes: Arc::clone(&self.closes),
            }))
        }
        fn is_available(&self) -> bool {
            true
        }
        fn active_contexts(&self) -> usize {
            0
        }
    }

    fn scraper(renderer: &Arc<FakeRenderer>) -> BrowserScraper {
        let r: Arc<dyn Renderer> = renderer.clone();
        BrowserScraper::new(r, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_network_then_dom_without_duplicates() {
        let renderer = Arc::new(FakeRenderer::new(
            &[
                "https://news.example.com/articles/1",
                "https://cdn.example.com/app.js",
                "https://cdn.example.com/a.jpg",
                "https://cdn.example.com/v.mp4?sig=1",
                "https://cdn.example.com/a.jpg",
            ],
            r#"<img src="https://cdn.example.com/a.jpg"><img src="/b.png"><img src="/b.png">"#,
        ));
        let urls = scraper(&renderer).scrape(&page()).await;
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/a.jpg",
                "https://cdn.example.com/v.mp4?sig=1",
                "https://news.example.com/b.png",
            ]
        );
        assert_eq!(renderer.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dom_entries_are_not_extension_filtered() {
        let renderer = Arc::new(FakeRenderer::new(&[], r#"<img src="/pixel?id=7">"#));
        let urls = scraper(&renderer).scrape(&page()).await;
        assert_eq!(urls, vec!["https://news.example.com/pixel?id=7"]);
    }

    #[tokio::test]
    async fn test_navigation_failure_keeps_captures_and_closes() {
        let mut fake = FakeRenderer::new(
            &["https://cdn.example.com/early.png"],
            r#"<img src="/never-scanned.jpg">"#,
        );
        fake.navigation_error = Some("navigation timed out after 30000ms".to_string());
        let renderer = Arc::new(fake);

        let urls = scraper(&renderer).scrape(&page()).await;
        assert_eq!(urls, vec!["https://cdn.example.com/early.png"]);
        assert_eq!(renderer.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dom_read_failure_still_closes() {
        let mut fake = FakeRenderer::new(&["https://cdn.example.com/x.gif"], "");
        fake.html = Err("target crashed".to_string());
        let renderer = Arc::new(fake);

        let urls = scraper(&renderer).scrape(&page()).await;
        assert_eq!(urls, vec!["https://cdn.example.com/x.gif"]);
        assert_eq!(renderer.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stalled_dom_capture_is_bounded_by_navigation_timeout() {
        let mut fake = FakeRenderer::new(&["https://cdn.example.com/seen.webp"], "");
        fake.html_hangs = true;
        let renderer = Arc::new(fake);
        let r: Arc<dyn Renderer> = renderer.clone();
        let scraper = BrowserScraper::new(r, Duration::from_millis(200));

        let urls = tokio::time::timeout(Duration::from_secs(3), scraper.scrape(&page()))
            .await
            .expect("scrape should finish within the navigation budget");
        assert_eq!(urls, vec!["https://cdn.example.com/seen.webp"]);
        assert_eq!(renderer.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_launch_failure_is_empty() {
        let mut fake = FakeRenderer::new(&[], "");
        fake.launch_error = true;
        let renderer = Arc::new(fake);

        let candidates = scraper(&renderer).extract(&page()).await;
        assert!(candidates.is_empty());
        assert_eq!(renderer.launches.load(Ordering::SeqCst), 1);
        assert_eq!(renderer.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_each_call_gets_a_fresh_context() {
        let renderer = Arc::new(FakeRenderer::new(&[], "<img src='a.png'>"));
        let s = scraper(&renderer);
        s.scrape(&page()).await;
        s.scrape(&page()).await;
        assert_eq!(renderer.launches.load(Ordering::SeqCst), 2);
        assert_eq!(renderer.closes.load(Ordering::SeqCst), 2);
    }
}
