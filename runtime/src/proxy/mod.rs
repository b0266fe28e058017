// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Download and transcode proxies for discovered media URLs.

pub mod download;
pub mod http_client;
pub mod transcode;

pub use download::{attachment_filename, download, DEFAULT_FILENAME};
pub use http_client::{parse_target, ProxyClient};
pub use transcode::{transcode, MAX_IMAGE_BYTES};
