// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Process-wide settings resolved from `MEDIASCOUT_*` environment variables.

use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3001;

/// Hard deadline for browser navigation in the fallback scraper.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for upstream fetches made by the download and transcode proxies.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    /// Explicit yt-dlp binary; `None` means look it up on `PATH`.
    pub ytdlp_path: Option<PathBuf>,
    /// Explicit ffmpeg binary; `None` means look it up on `PATH`.
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit Chromium binary; `None` means the usual search order.
    pub chromium_path: Option<PathBuf>,
    pub navigation_timeout: Duration,
    pub fetch_timeout: Duration,
    /// How many sources may be discovered at once. `1` is strictly sequential.
    pub source_concurrency: usize,
    /// Run `yt-dlp -U` when the server starts.
    pub update_ytdlp: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            ytdlp_path: None,
            ffmpeg_path: None,
            chromium_path: None,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            source_concurrency: 1,
            update_ytdlp: false,
        }
    }
}

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from an arbitrary key lookup (environment-shaped).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut settings = Settings::default();

        if let Some(host) = get("MEDIASCOUT_HOST") {
            settings.host = parse_var("MEDIASCOUT_HOST", &host)?;
        }
        if let Some(port) = get("MEDIASCOUT_PORT") {
            settings.port = parse_var("MEDIASCOUT_PORT", &port)?;
        } else if let Some(port) = get("PORT") {
            settings.port = parse_var("PORT", &port)?;
        }

        settings.ytdlp_path = get("MEDIASCOUT_YTDLP").map(PathBuf::from);
        settings.ffmpeg_path = get("MEDIASCOUT_FFMPEG").map(PathBuf::from);
        settings.chromium_path = get("MEDIASCOUT_CHROMIUM_PATH").map(PathBuf::from);

        if let Some(ms) = get("MEDIASCOUT_NAV_TIMEOUT_MS") {
            settings.navigation_timeout =
                Duration::from_millis(parse_var("MEDIASCOUT_NAV_TIMEOUT_MS", &ms)?);
        }
        if let Some(ms) = get("MEDIASCOUT_FETCH_TIMEOUT_MS") {
            settings.fetch_timeout =
                Duration::from_millis(parse_var("MEDIASCOUT_FETCH_TIMEOUT_MS", &ms)?);
        }
        if let Some(n) = get("MEDIASCOUT_SOURCE_CONCURRENCY") {
            let n: usize = parse_var("MEDIASCOUT_SOURCE_CONCURRENCY", &n)?;
            anyhow::ensure!(n >= 1, "MEDIASCOUT_SOURCE_CONCURRENCY must be at least 1");
            settings.source_concurrency = n;
        }
        if let Some(flag) = get("MEDIASCOUT_UPDATE_YTDLP") {
            settings.update_ytdlp = parse_flag("MEDIASCOUT_UPDATE_YTDLP", &flag)?;
        }

        Ok(settings)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse::<T>()
        .with_context(|| format!("invalid value for {key}: {value:?}"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("invalid value for {key}: {value:?} (expected true/false)"),
    }
}
