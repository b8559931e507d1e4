//! Image type detection from magic bytes.
//!
//! Pure functions over a byte window, handy for picking an extension for
//! files mirrored without one.
//!
//! ```rust
//! use treefetch::sniff::{image_type, ImageType};
//!
//! let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
//! assert_eq!(image_type(&png), Some(ImageType::Png));
//! assert_eq!(ImageType::Png.extension(), ".png");
//! ```

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const GIF87A: &[u8; 6] = b"GIF87a";
const GIF89A: &[u8; 6] = b"GIF89a";
const JPEG_HEAD: [u8; 2] = [0xFF, 0xD8];
const JPEG_TAIL: [u8; 2] = [0xFF, 0xD9];

/// Image formats recognised by [`image_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
}

impl ImageType {
    /// File extension, dot included.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageType::Png => ".png",
            ImageType::Jpeg => ".jpg",
            ImageType::Gif => ".gif",
        }
    }
}

/// Classify a complete file content.
///
/// JPEG needs the whole file since the end-of-image marker is checked too.
pub fn image_type(bytes: &[u8]) -> Option<ImageType> {
    if is_png(bytes) {
        Some(ImageType::Png)
    } else if is_jpeg(bytes) {
        Some(ImageType::Jpeg)
    } else if is_gif(bytes) {
        Some(ImageType::Gif)
    } else {
        None
    }
}

pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

pub fn is_gif(bytes: &[u8]) -> bool {
    bytes.starts_with(GIF87A) || bytes.starts_with(GIF89A)
}

pub fn is_jpeg(bytes: &[u8]) -> bool {
    // Head and tail must not overlap.
    bytes.len() >= 4 && bytes.starts_with(&JPEG_HEAD) && bytes.ends_with(&JPEG_TAIL)
}
