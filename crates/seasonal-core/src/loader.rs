//! Image loading: raw upload bytes to an upright RGB raster.
//!
//! Only JPEG and PNG are accepted. The format is sniffed from the bytes, not
//! from a file name, and EXIF orientation is applied so every raster that
//! leaves this module has the same orientation and channel order (R, G, B).

use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unrecognized image data")]
    UnrecognizedFormat,
    #[error("unsupported image format: {0} (expected JPEG or PNG)")]
    UnsupportedFormat(String),
    #[error("image has zero width or height")]
    EmptyImage,
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode JPEG or PNG bytes into an upright RGB raster.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    let format = image::guess_format(bytes).map_err(|_| DecodeError::UnrecognizedFormat)?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(DecodeError::UnsupportedFormat(format!("{format:?}")));
    }

    let mut decoder = ImageReader::with_format(Cursor::new(bytes), format).into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);

    let raster = img.to_rgb8();
    if raster.width() == 0 || raster.height() == 0 {
        return Err(DecodeError::EmptyImage);
    }

    tracing::debug!(
        format = ?format,
        width = raster.width(),
        height = raster.height(),
        "decoded image"
    );
    Ok(raster)
}

/// File extensions a host should accept for upload (lowercase, no dot).
pub fn supported_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Check a file name against the upload allow-list, ignoring case.
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
