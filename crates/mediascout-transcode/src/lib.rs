//! Mediascout transcode: fixed image optimisation profiles applied to fetched images.

pub mod profile;
pub mod transcode;
pub mod types;

pub use profile::{Profile, ProfileSettings};
pub use transcode::{transform, Transcoded};
pub use types::*;
