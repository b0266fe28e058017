// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Mediascout runtime library: media discovery for web pages.
//!
//! Structured extraction through yt-dlp is tried first; a headless-browser
//! scraper is the fallback. Download and transcode proxies serve the URLs
//! that were found.

pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod media;
pub mod proxy;
pub mod renderer;
pub mod rest;
pub mod tools;
