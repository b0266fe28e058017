// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Environment readiness check.

use crate::config::Settings;
use crate::tools;
use anyhow::Result;
use std::path::Path;
use std::process::Command;

/// Check for yt-dlp, ffmpeg and Chromium and print what was found.
pub async fn run() -> Result<()> {
    let settings = Settings::from_env()?;

    println!("Mediascout Doctor");
    println!("=================");
    println!();
    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let ytdlp = tools::find_ytdlp(settings.ytdlp_path.as_deref());
    match &ytdlp {
        Some(path) => match tool_version(path, "--version") {
            Some(v) => println!("[OK] yt-dlp {v}: {}", path.display()),
            None => println!("[OK] yt-dlp found: {}", path.display()),
        },
        None => println!("[!!] yt-dlp NOT found. Structured extraction will yield nothing."),
    }

    match tools::find_ffmpeg(settings.ffmpeg_path.as_deref()) {
        Some(path) => println!("[OK] ffmpeg found: {}", path.display()),
        None => println!("[??] ffmpeg not found. yt-dlp will run without --ffmpeg-location."),
    }

    let chromium = tools::find_chromium(settings.chromium_path.as_deref());
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!("[!!] Chromium NOT found. Browser fallback is disabled."),
    }

    println!();
    println!("Listen address: {}:{}", settings.host, settings.port);
    println!();
    match (ytdlp.is_some(), chromium.is_some()) {
        (true, true) => println!("Status: READY"),
        (false, false) => println!("Status: NOT READY"),
        _ => println!("Status: DEGRADED"),
    }

    Ok(())
}

/// First line of `<binary> <flag>` output, if the command succeeds.
fn tool_version(binary: &Path, flag: &str) -> Option<String> {
    let output = Command::new(binary).arg(flag).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}
