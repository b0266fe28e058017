//! Decode, resize, blur and re-encode an image according to a [`Profile`].

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::profile::Profile;
use crate::types::{TranscodeError, TranscodeResult};

/// Content type of every transcoded output.
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

/// A re-encoded image.
#[derive(Debug, Clone)]
pub struct Transcoded {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Apply `profile` to the encoded image in `bytes`.
///
/// The input format is sniffed from its magic bytes. Output is always JPEG.
pub fn transform(bytes: &[u8], profile: Profile) -> TranscodeResult<Transcoded> {
    if bytes.is_empty() {
        return Err(TranscodeError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    let settings = profile.settings();

    let mut out = fit_width(&img, settings.max_width, profile);
    if let Some(sigma) = settings.blur_sigma {
        out = out.blur(sigma);
    }

    let (width, height) = out.dimensions();
    let rgb = out.to_rgb8();
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buf), settings.jpeg_quality);
    rgb.write_with_encoder(encoder)?;

    tracing::debug!(
        profile = %profile,
        input_bytes = bytes.len(),
        output_bytes = buf.len(),
        width,
        height,
        "transcoded image"
    );

    Ok(Transcoded {
        bytes: buf,
        content_type: OUTPUT_CONTENT_TYPE,
        width,
        height,
    })
}

/// Downscale to `max_width`, keeping aspect ratio. Narrower images pass through.
fn fit_width(img: &DynamicImage, max_width: u32, profile: Profile) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w <= max_width {
        return img.clone();
    }

    let height = ((h as u64 * max_width as u64) / w as u64).max(1) as u32;
    // Placeholders are blurred afterwards, so the cheaper filter is enough.
    let filter = match profile {
        Profile::Low => FilterType::Triangle,
        Profile::Normal => FilterType::Lanczos3,
    };
    img.resize_exact(max_width, height, filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn patterned_png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(w, h, |x, y| {
            Rgb([
                (x * 7 % 256) as u8,
                (y * 13 % 256) as u8,
                ((x ^ y) % 256) as u8,
            ])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_low_output_is_smaller_than_normal() {
        let input = patterned_png(640, 480);
        let low = transform(&input, Profile::Low).unwrap();
        let normal = transform(&input, Profile::Normal).unwrap();

        assert!(low.bytes.len() < normal.bytes.len());
        assert_eq!(low.content_type, "image/jpeg");
        assert_eq!(normal.content_type, "image/jpeg");
    }

    #[test]
    fn test_low_caps_width_and_keeps_aspect() {
        let input = patterned_png(640, 480);
        let low = transform(&input, Profile::Low).unwrap();
        assert_eq!(low.width, 48);
        assert_eq!(low.height, 36);

        let loaded = image::load_from_memory(&low.bytes).unwrap();
        assert_eq!(loaded.dimensions(), (48, 36));
    }

    #[test]
    fn test_normal_leaves_narrow_images_unscaled() {
        let input = patterned_png(300, 200);
        let normal = transform(&input, Profile::Normal).unwrap();
        assert_eq!((normal.width, normal.height), (300, 200));
    }

    #[test]
    fn test_normal_caps_wide_images() {
        let input = patterned_png(2560, 100);
        let normal = transform(&input, Profile::Normal).unwrap();
        assert_eq!((normal.width, normal.height), (1280, 50));
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        assert!(matches!(
            transform(&[], Profile::Normal),
            Err(TranscodeError::EmptyInput)
        ));
        assert!(matches!(
            transform(b"definitely not an image", Profile::Low),
            Err(TranscodeError::Image(_))
        ));
    }
}
