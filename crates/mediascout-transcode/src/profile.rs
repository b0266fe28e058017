//! The two fixed optimisation profiles.

use std::fmt;

/// Resize, blur and compression parameters for one profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSettings {
    /// Output is downscaled to at most this width, preserving aspect ratio.
    pub max_width: u32,
    /// Gaussian blur sigma applied after resizing.
    pub blur_sigma: Option<f32>,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
}

/// Tiny, blurred, heavily compressed placeholder.
const LOW: ProfileSettings = ProfileSettings {
    max_width: 48,
    blur_sigma: Some(2.5),
    jpeg_quality: 30,
};

/// Capped-width, moderately compressed output.
const NORMAL: ProfileSettings = ProfileSettings {
    max_width: 1280,
    blur_sigma: None,
    jpeg_quality: 80,
};

/// Transcode profile selected by the caller's `quality` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Profile {
    Low,
    #[default]
    Normal,
}

impl Profile {
    /// Map a quality selector to a profile. Only `low` is recognised
    /// (case-insensitive); anything else, including no selector, is `Normal`.
    pub fn from_quality(quality: Option<&str>) -> Self {
        match quality.map(str::trim) {
            Some(q) if q.eq_ignore_ascii_case("low") => Profile::Low,
            _ => Profile::Normal,
        }
    }

    pub fn settings(&self) -> ProfileSettings {
        match self {
            Profile::Low => LOW,
            Profile::Normal => NORMAL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Low => "low",
            Profile::Normal => "normal",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
