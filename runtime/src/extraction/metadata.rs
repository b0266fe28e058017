// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structured-metadata extraction through the `yt-dlp` binary.
//!
//! One subprocess per page. Stdout is decoded incrementally as
//! line-delimited JSON; lines that are not JSON objects with both a media
//! URL and a thumbnail are dropped. Every process-level failure resolves
//! to an empty result, which hands the page to the next strategy.

use super::{Candidate, Extractor};
use crate::config::Settings;
use crate::media::Strategy;
use crate::tools;
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};
use url::Url;

/// The subset of a yt-dlp info JSON object the pipeline uses.
#[derive(Debug, Deserialize)]
struct InfoEntry {
    url: Option<String>,
    thumbnail: Option<String>,
    uploader: Option<String>,
}

/// Metadata extractor backed by the yt-dlp CLI.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary: Option<PathBuf>,
    ffmpeg: Option<PathBuf>,
}

impl YtDlpExtractor {
    /// Create an extractor from already-resolved binaries.
    pub fn new(binary: Option<PathBuf>, ffmpeg: Option<PathBuf>) -> Self {
        Self { binary, ffmpeg }
    }

    /// Resolve yt-dlp and ffmpeg from settings and `PATH`.
    pub fn from_settings(settings: &Settings) -> Self {
        let binary = tools::find_ytdlp(settings.ytdlp_path.as_deref());
        let ffmpeg = tools::find_ffmpeg(settings.ffmpeg_path.as_deref());

        match &binary {
            Some(path) => info!("yt-dlp found at {}", path.display()),
            None => warn!("yt-dlp not found; metadata extraction disabled, every page falls back to the browser"),
        }
        if ffmpeg.is_none() {
            warn!("ffmpeg not found; yt-dlp format conversions are disabled");
        }

        Self::new(binary, ffmpeg)
    }

    /// Arguments for one extraction run against `page_url`.
    fn build_args(&self, page_url: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--ignore-errors".into(),
            "--dump-json".into(),
            "--no-warnings".into(),
        ];
        if let Some(ffmpeg) = &self.ffmpeg {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.clone().into_os_string());
        }
        // End option parsing so a page URL can never be read as a flag.
        args.push("--".into());
        args.push(page_url.into());
        args
    }

    /// Run yt-dlp against `page_url` and collect the usable entries.
    pub async fn extract_candidates(&self, page_url: &Url) -> Vec<Candidate> {
        let Some(binary) = &self.binary else {
            debug!("yt-dlp unavailable, skipping metadata extraction for {page_url}");
            return Vec::new();
        };
        let fallback_author = page_url.host_str().unwrap_or_default().to_string();

        info!("metadata extraction started for {page_url}");

        let mut child = match Command::new(binary)
            .args(self.build_args(page_url.as_str()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                error!("failed to spawn yt-dlp ({}): {e}", binary.display());
                return Vec::new();
            }
        };

        if let Some(stderr) = child.stderr.take() {
            let page = page_url.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "mediascout::ytdlp", page = %page, "stderr: {line}");
                }
            });
        }

        let mut candidates = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            let mut segments = BufReader::new(stdout).split(b'\n');
            loop {
                match segments.next_segment().await {
                    Ok(Some(raw)) => {
                        let line = String::from_utf8_lossy(&raw);
                        if let Some(candidate) = parse_entry_line(&line, &fallback_author) {
                            candidates.push(candidate);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("error reading yt-dlp output for {page_url}: {e}");
                        break;
                    }
                }
            }
        }

        match child.wait().await {
            Ok(status) if !status.success() => {
                warn!(
                    "yt-dlp exited with {status} for {page_url} ({} usable entries)",
                    candidates.len()
                );
            }
            Ok(_) => {}
            Err(e) => warn!("failed to wait for yt-dlp: {e}"),
        }

        info!(
            "metadata extraction found {} videos on {page_url}",
            candidates.len()
        );
        candidates
    }

    /// Run `yt-dlp -U`, logging its output. Never fails.
    pub async fn self_update(&self) {
        let Some(binary) = &self.binary else {
            error!("yt-dlp not found; cannot check for updates");
            return;
        };
        info!("checking for yt-dlp updates");

        match Command::new(binary)
            .arg("-U")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
        {
            Ok(output) => {
                for line in String::from_utf8_lossy(&output.stdout).lines() {
                    info!(target: "mediascout::ytdlp", "update: {}", line.trim());
                }
                for line in String::from_utf8_lossy(&output.stderr).lines() {
                    warn!(target: "mediascout::ytdlp", "update stderr: {}", line.trim());
                }
                info!("yt-dlp update finished with {}", output.status);
            }
            Err(e) => error!("failed to start yt-dlp update: {e}"),
        }
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::Metadata
    }

    async fn extract(&self, page_url: &Url) -> Vec<Candidate> {
        self.extract_candidates(page_url).await
    }
}

/// Parse one stdout line into a candidate.
///
/// Returns `None` for non-JSON lines and for entries missing a media URL
/// (or whose URL is not absolute) or a thumbnail.
pub fn parse_entry_line(line: &str, fallback_author: &str) -> Option<Candidate> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let entry: InfoEntry = serde_json::from_str(line).ok()?;

    let url = entry.url.filter(|u| !u.is_empty())?;
    Url::parse(&url).ok()?;
    let thumbnail = entry.thumbnail.filter(|t| !t.is_empty())?;
    let author = entry
        .uploader
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| fallback_author.to_string());

    Some(Candidate {
        url,
        thumbnail_url: Some(thumbnail),
        author: Some(author),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_complete_entry() {
        let line = r#"{"id":"x1","url":"https://cdn.example.com/v.mp4","thumbnail":"https://cdn.example.com/t.jpg","uploader":"Alice"}"#;
        let c = parse_entry_line(line, "example.com").unwrap();
        assert_eq!(c.url, "https://cdn.example.com/v.mp4");
        assert_eq!(c.thumbnail_url.as_deref(), Some("https://cdn.example.com/t.jpg"));
        assert_eq!(c.author.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_parse_defaults_author_to_host() {
        let line = r#"{"url":"https://cdn.example.com/v.mp4","thumbnail":"https://cdn.example.com/t.jpg","uploader":null}"#;
        let c = parse_entry_line(line, "example.com").unwrap();
        assert_eq!(c.author.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_parse_drops_partial_entries() {
        assert!(parse_entry_line(r#"{"url":"https://a.com/v.mp4"}"#, "a.com").is_none());
        assert!(parse_entry_line(r#"{"thumbnail":"https://a.com/t.jpg"}"#, "a.com").is_none());
        assert!(
            parse_entry_line(r#"{"url":"","thumbnail":"https://a.com/t.jpg"}"#, "a.com").is_none()
        );
        assert!(parse_entry_line(
            r#"{"url":"relative/v.mp4","thumbnail":"https://a.com/t.jpg"}"#,
            "a.com"
        )
        .is_none());
    }

    #[test]
    fn test_parse_ignores_non_json() {
        assert!(parse_entry_line("[youtube] Extracting URL", "a.com").is_none());
        assert!(parse_entry_line("", "a.com").is_none());
        assert!(parse_entry_line("   ", "a.com").is_none());
        assert!(parse_entry_line("[1, 2, 3]", "a.com").is_none());
    }

    #[test]
    fn test_build_args() {
        let ex = YtDlpExtractor::new(Some(PathBuf::from("yt-dlp")), None);
        let args = ex.build_args("https://example.com/watch");
        assert_eq!(
            args,
            vec!["--ignore-errors", "--dump-json", "--no-warnings", "--", "https://example.com/watch"]
                .into_iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );

        let ex = YtDlpExtractor::new(
            Some(PathBuf::from("yt-dlp")),
            Some(PathBuf::from("/usr/bin/ffmpeg")),
        );
        let args = ex.build_args("https://example.com/watch");
        let pos = args.iter().position(|a| a == "--ffmpeg-location").unwrap();
        assert_eq!(args[pos + 1], OsString::from("/usr/bin/ffmpeg"));
        assert_eq!(args.last().unwrap(), "https://example.com/watch");
    }

    #[tokio::test]
    async fn test_missing_binary_yields_empty() {
        let ex = YtDlpExtractor::new(None, None);
        let url = Url::parse("https://example.com/page").unwrap();
        assert!(ex.extract(&url).await.is_empty());

        let ex = YtDlpExtractor::new(Some(PathBuf::from("/nonexistent/yt-dlp")), None);
        assert!(ex.extract(&url).await.is_empty());
    }

    #[cfg(unix)]
    fn fake_ytdlp(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_subprocess_output_is_parsed_line_by_line() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_ytdlp(
            dir.path(),
            r#"echo 'not json at all'
echo '{"url":"https://cdn.example.com/1.mp4","thumbnail":"https://cdn.example.com/1.jpg","uploader":"Bob"}'
echo '{"url":"https://cdn.example.com/2.mp4"}'
echo 'warning text' >&2
echo '{"url":"https://cdn.example.com/3.mp4","thumbnail":"https://cdn.example.com/3.jpg"}'"#,
        );
        let ex = YtDlpExtractor::new(Some(bin), None);
        let url = Url::parse("https://videos.example.org/watch?v=1").unwrap();

        let got = ex.extract(&url).await;
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].author.as_deref(), Some("Bob"));
        assert_eq!(got[1].url, "https://cdn.example.com/3.mp4");
        assert_eq!(got[1].author.as_deref(), Some("videos.example.org"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_keeps_usable_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_ytdlp(
            dir.path(),
            r#"echo '{"url":"https://cdn.example.com/a.mp4","thumbnail":"https://cdn.example.com/a.jpg"}'
exit 1"#,
        );
        let ex = YtDlpExtractor::new(Some(bin), None);
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(ex.extract(&url).await.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_tool_with_no_output_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_ytdlp(dir.path(), "echo 'ERROR: Unsupported URL' >&2\nexit 1");
        let ex = YtDlpExtractor::new(Some(bin), None);
        let url = Url::parse("https://example.com/").unwrap();
        assert!(ex.extract(&url).await.is_empty());
    }

    #[tokio::test]
    async fn test_self_update_without_binary_returns() {
        YtDlpExtractor::new(None, None).self_update().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_self_update_failure_does_not_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("called-with");
        let bin = fake_ytdlp(
            dir.path(),
            &format!(
                "echo \"$1\" > '{}'\necho 'ERROR: update unavailable' >&2\nexit 1",
                marker.display()
            ),
        );
        let ex = YtDlpExtractor::new(Some(bin), None);
        ex.self_update().await;
        assert_eq!(std::fs::read_to_string(&marker).unwrap().trim(), "-U");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_page_url_is_passed_after_flags() {
        let dir = tempfile::tempdir().unwrap();
        // Echo the last argument back as the media URL.
        let bin = fake_ytdlp(
            dir.path(),
            r#"for last; do :; done
printf '{"url":"%s","thumbnail":"https://t.example.com/t.jpg"}\n' "$last""#,
        );
        let ex = YtDlpExtractor::new(Some(bin), None);
        let url = Url::parse("https://example.com/clip").unwrap();
        let got = ex.extract(&url).await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].url, "https://example.com/clip");
    }
}
