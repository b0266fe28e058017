// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Locating the external binaries the pipeline drives.

use std::path::{Path, PathBuf};

/// Resolve the yt-dlp binary: explicit path if it exists, else `PATH`.
pub fn find_ytdlp(explicit: Option<&Path>) -> Option<PathBuf> {
    find_binary(explicit, &["yt-dlp"])
}

/// Resolve the ffmpeg binary: explicit path if it exists, else `PATH`.
pub fn find_ffmpeg(explicit: Option<&Path>) -> Option<PathBuf> {
    find_binary(explicit, &["ffmpeg"])
}

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. explicit setting
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    // 2. ~/.mediascout/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".mediascout/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".mediascout/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".mediascout/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".mediascout/chromium/chrome-linux64/chrome"),
                home.join(".mediascout/chromium/chrome"),
            ]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    // 3. System PATH
    if let Some(found) = find_binary(None, &["google-chrome", "chromium", "chromium-browser"]) {
        return Some(found);
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

fn find_binary(explicit: Option<&Path>, names: &[&str]) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        // A bare name like "yt-dlp-nightly" is looked up on PATH.
        return which::which(path).ok();
    }
    names.iter().find_map(|name| which::which(name).ok())
}
