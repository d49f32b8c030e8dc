use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

use factura_core::ImageConfig;

use crate::types::{NormalizedImage, RawImage};

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to decode {mime} image: {source}")]
    Decode {
        mime: String,
        #[source]
        source: ImageError,
    },
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Bounds and quality for the pre-recognition downscale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::from(&ImageConfig::default())
    }
}

impl From<&ImageConfig> for NormalizeOptions {
    fn from(c: &ImageConfig) -> Self {
        Self { max_width: c.max_width, max_height: c.max_height, quality: c.quality }
    }
}

/// Output size for an image of `width`×`height`.
///
/// Images already within bounds keep their size. Otherwise the wider side
/// (height on ties) is pinned to its bound and the other side scaled by the
/// same factor, truncated to whole pixels. With unequal bounds that can
/// leave the other side over its own bound, or grow the image; the size is
/// then scaled by the tighter of the two bounds instead.
pub fn target_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let (w, h) = if width > height {
        let scaled = f64::from(height) * (f64::from(max_width) / f64::from(width));
        (max_width, whole_pixels(scaled))
    } else {
        let scaled = f64::from(width) * (f64::from(max_height) / f64::from(height));
        (whole_pixels(scaled), max_height)
    };
    if w <= max_width.min(width) && h <= max_height.min(height) {
        return (w, h);
    }

    let (width, height, max_width, max_height) =
        (u64::from(width), u64::from(height), u64::from(max_width), u64::from(max_height));
    // Compare max_width / width against max_height / height without rounding.
    let (w, h) = if max_width * height <= max_height * width {
        (max_width, height * max_width / width)
    } else {
        (width * max_height / height, max_height)
    };
    (narrow(w), narrow(h))
}

fn narrow(v: u64) -> u32 {
    u32::try_from(v.max(1)).unwrap_or(u32::MAX)
}

fn whole_pixels(v: f64) -> u32 {
    (v as u32).max(1)
}

/// Decode `image`, trusting its bytes over its declared type. Returns the
/// format the content was actually decoded as.
fn decode(image: &RawImage) -> Result<(DynamicImage, ImageFormat), PreprocessError> {
    let bytes = image.bytes();
    let decode_error = |source: ImageError| PreprocessError::Decode { mime: image.mime().to_string(), source };

    if let Some(declared) = ImageFormat::from_mime_type(image.mime()) {
        match image::load_from_memory_with_format(bytes, declared) {
            Ok(img) => return Ok((img, declared)),
            Err(e) => match image::guess_format(bytes) {
                Ok(actual) if actual != declared => {
                    debug!("Declared {} but content is {}", image.mime(), actual.to_mime_type());
                }
                _ => return Err(decode_error(e)),
            },
        }
    }

    let actual = image::guess_format(bytes).map_err(decode_error)?;
    let img = image::load_from_memory_with_format(bytes, actual).map_err(decode_error)?;
    Ok((img, actual))
}

/// Decode, downscale and re-encode `image` in its own format.
pub fn normalize(image: &RawImage, opts: &NormalizeOptions) -> Result<NormalizedImage, PreprocessError> {
    let (decoded, format) = decode(image)?;

    let (in_w, in_h) = (decoded.width(), decoded.height());
    let (width, height) = target_dimensions(in_w, in_h, opts.max_width, opts.max_height);
    let resized = if (width, height) == (in_w, in_h) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };

    let (bytes, format) = encode(&resized, format, opts.quality)?;

    debug!(
        "Normalized image {in_w}x{in_h} -> {width}x{height} ({}, {} -> {} bytes)",
        format.to_mime_type(),
        image.len(),
        bytes.len()
    );

    Ok(NormalizedImage { bytes, mime: format.to_mime_type().to_string(), width, height })
}

/// Encode in `format`; formats without an encoder fall back to PNG.
fn encode(
    img: &DynamicImage,
    format: ImageFormat,
    quality: f32,
) -> Result<(Vec<u8>, ImageFormat), PreprocessError> {
    let mut buf = Vec::new();
    if format == ImageFormat::Jpeg {
        // JPEG carries no alpha channel.
        let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality));
        DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(encoder)
            .map_err(|e| PreprocessError::Encode(e.to_string()))?;
        return Ok((buf, format));
    }

    match img.write_to(&mut Cursor::new(&mut buf), format) {
        Ok(()) => Ok((buf, format)),
        Err(ImageError::Unsupported(e)) if format != ImageFormat::Png => {
            debug!("No encoder for {format:?} ({e}), falling back to PNG");
            buf.clear();
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                .map_err(|e| PreprocessError::Encode(e.to_string()))?;
            Ok((buf, ImageFormat::Png))
        }
        Err(e) => Err(PreprocessError::Encode(e.to_string())),
    }
}

fn jpeg_quality(quality: f32) -> u8 {
    (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8
}
