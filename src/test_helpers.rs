//! Shared test utilities: small in-memory images in each supported format.
//!
//! Tests use these as canned service responses so no fixture files are
//! needed on disk.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let transport = MockTransport::returning(png_bytes(8, 8));
//! ```

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// A deterministic gradient so encoders have something non-trivial to chew on.
pub fn sample_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 40 % 256) as u8, (y * 40 % 256) as u8, 128, 255])
    });
    DynamicImage::ImageRgba8(img)
}

fn encoded(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(sample_image(width, height), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let rgb = DynamicImage::ImageRgb8(sample_image(width, height).to_rgb8());
    encoded(rgb, ImageFormat::Jpeg)
}

pub fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(sample_image(width, height), ImageFormat::Gif)
}
