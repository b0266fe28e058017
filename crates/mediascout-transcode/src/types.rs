//! Error types for image transcoding.

/// Errors that can occur while transcoding an image.
#[derive(thiserror::Error, Debug)]
pub enum TranscodeError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Empty input: no image bytes to transcode")]
    EmptyInput,
}

pub type TranscodeResult<T> = Result<T, TranscodeError>;
