//! Format-driven decode/encode dispatch.
//!
//! The service answers with raw image bytes. Before anything touches the
//! filesystem those bytes are decoded, which both identifies corrupt
//! responses and yields the pixels needed when the destination format
//! differs from the source.
//!
//! ## Format resolution
//!
//! | Step | Rule |
//! |---|---|
//! | Destination | suffix of the destination file name (`lion.png` → png) |
//! | Source, [`DecodeStrategy::Sniff`] | magic bytes via `image::guess_format`, then the response `Content-Type`, then the source URL |
//! | Source, [`DecodeStrategy::SourceExtension`] | suffix of the source URL's path only |
//!
//! Extension matching is the same everywhere: a case-insensitive match on the
//! text after the last `.` of the final path segment, with `jpeg` treated as
//! `jpg`. Query strings and fragments never take part.
//!
//! ## Writing
//!
//! When source and destination formats agree the response bytes are written
//! verbatim; otherwise the decoded image is re-encoded. Either way the file
//! is written to `<path>.part` first and renamed into place.

use crate::error::{Error, Result};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Image formats the service accepts and this client can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Jpg,
    Png,
    Gif,
}

const EXTENSIONS: &[(&str, Format)] = &[
    ("jpg", Format::Jpg),
    ("jpeg", Format::Jpg),
    ("png", Format::Png),
    ("gif", Format::Gif),
];

impl Format {
    pub const ALL: [Format; 3] = [Format::Jpg, Format::Png, Format::Gif];

    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Jpg => "jpg",
            Format::Png => "png",
            Format::Gif => "gif",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Format::Jpg => ImageFormat::Jpeg,
            Format::Png => ImageFormat::Png,
            Format::Gif => ImageFormat::Gif,
        }
    }

    fn from_image_format(format: ImageFormat) -> Option<Self> {
        Format::ALL.into_iter().find(|f| f.image_format() == format)
    }

    /// Case-insensitive lookup of a bare extension (`"JPEG"` → `Jpg`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
            .map(|(_, format)| *format)
    }

    /// Format implied by the suffix of a file path or bare file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Format named by a `Content-Type` value such as `image/jpeg; q=1`.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let media_type = content_type.split(';').next().unwrap_or_default().trim();
        let subtype = media_type
            .split_once('/')
            .filter(|(kind, _)| kind.eq_ignore_ascii_case("image"))
            .map(|(_, subtype)| subtype)?;
        if subtype.eq_ignore_ascii_case("pjpeg") {
            return Some(Format::Jpg);
        }
        Self::from_extension(subtype)
    }

    /// Format implied by the suffix of a URL's path component.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = match reqwest::Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        let segment = path.rsplit('/').next().unwrap_or_default();
        Self::from_path(Path::new(segment))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Strict parse of a destination format: exactly `jpg`, `png` or `gif`.
impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Format::ALL
            .into_iter()
            .find(|f| f.extension() == s)
            .ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

/// How the format of a response body is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecodeStrategy {
    /// Look at the bytes; use the source URL only if they are unrecognisable.
    #[default]
    Sniff,
    /// Trust the source URL's extension, ignoring the bytes.
    SourceExtension,
}

/// What a successful save produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub path: PathBuf,
    pub bytes_written: usize,
    pub source_format: Format,
    pub output_format: Format,
    /// False when the response bytes were written verbatim.
    pub reencoded: bool,
}

/// Decide which decoder applies to `bytes` fetched on behalf of `source_url`.
///
/// `content_type` is the header the service sent, if any. It is only
/// consulted when sniffing the bytes fails.
pub fn resolve_source_format(
    bytes: &[u8],
    content_type: Option<&str>,
    source_url: &str,
    strategy: DecodeStrategy,
) -> Result<Format> {
    let from_url = Format::from_url(source_url);
    match strategy {
        DecodeStrategy::SourceExtension => from_url.ok_or_else(|| {
            Error::UnrecognizedFormat(format!("no jpg, png or gif extension on {source_url}"))
        }),
        DecodeStrategy::Sniff => match image::guess_format(bytes) {
            Ok(guessed) => {
                let format = Format::from_image_format(guessed).ok_or_else(|| {
                    Error::UnrecognizedFormat(format!("service returned {guessed:?} data"))
                })?;
                if let Some(hinted) = from_url.filter(|f| *f != format) {
                    log::warn!("{source_url} looks like {hinted} but the response is {format}");
                }
                Ok(format)
            }
            Err(_) => content_type
                .and_then(Format::from_content_type)
                .or(from_url)
                .ok_or_else(|| {
                    Error::UnrecognizedFormat(format!(
                        "response bytes are not an image and {source_url} has no known extension"
                    ))
                }),
        },
    }
}

pub fn decode(bytes: &[u8], format: Format) -> Result<DynamicImage> {
    image::load_from_memory_with_format(bytes, format.image_format())
        .map_err(|e| Error::DecodeFailure(format!("{format} response: {e}")))
}

pub fn encode(image: &DynamicImage, format: Format) -> Result<Vec<u8>> {
    // JPEG has no alpha channel and GIF frames are RGBA; normalise first.
    let normalised = match format {
        Format::Jpg => DynamicImage::ImageRgb8(image.to_rgb8()),
        Format::Gif => DynamicImage::ImageRgba8(image.to_rgba8()),
        Format::Png => image.clone(),
    };
    let mut buf = Vec::new();
    normalised
        .write_to(&mut Cursor::new(&mut buf), format.image_format())
        .map_err(|e| Error::EncodeFailure(format!("{format}: {e}")))?;
    Ok(buf)
}

/// Decode `bytes`, convert to the destination's format if needed, and write.
///
/// Nothing is written unless decoding (and re-encoding, if any) succeeded.
pub fn save(
    bytes: &[u8],
    content_type: Option<&str>,
    source_url: &str,
    strategy: DecodeStrategy,
    destination: &Path,
) -> Result<SaveOutcome> {
    let output_format = Format::from_path(destination).ok_or_else(|| {
        Error::UnrecognizedFormat(format!(
            "no jpg, png or gif extension on {}",
            destination.display()
        ))
    })?;
    let source_format = resolve_source_format(bytes, content_type, source_url, strategy)?;
    let image = decode(bytes, source_format)?;

    let reencoded = source_format != output_format;
    let encoded;
    let payload: &[u8] = if reencoded {
        log::debug!("re-encoding {source_format} response as {output_format}");
        encoded = encode(&image, output_format)?;
        &encoded
    } else {
        bytes
    };

    write_atomic(destination, payload)?;
    Ok(SaveOutcome {
        path: destination.to_path_buf(),
        bytes_written: payload.len(),
        source_format,
        output_format,
        reencoded,
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    let result = std::fs::write(&part, bytes).and_then(|()| std::fs::rename(&part, path));
    result.map_err(|source| {
        // Best effort; the write error is what gets reported.
        let _ = std::fs::remove_file(&part);
        Error::WriteFailure {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gif_bytes, jpeg_bytes, png_bytes, sample_image};
    use tempfile::TempDir;

    #[test]
    fn destination_format_parse_is_strict() {
        assert_eq!("png".parse::<Format>().unwrap(), Format::Png);
        assert!(matches!("PNG".parse::<Format>(), Err(Error::UnsupportedFormat(_))));
        assert!(matches!("jpeg".parse::<Format>(), Err(Error::UnsupportedFormat(_))));
        assert!(matches!("bmp".parse::<Format>(), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn extension_lookup_is_case_insensitive_with_jpeg_alias() {
        assert_eq!(Format::from_extension("JPG"), Some(Format::Jpg));
        assert_eq!(Format::from_extension("jpeg"), Some(Format::Jpg));
        assert_eq!(Format::from_extension("Gif"), Some(Format::Gif));
        assert_eq!(Format::from_extension("webp"), None);
    }

    #[test]
    fn url_format_uses_path_suffix_only() {
        assert_eq!(Format::from_url("http://x/lion.jpg"), Some(Format::Jpg));
        assert_eq!(Format::from_url("http://x/LION.PNG?w=1"), Some(Format::Png));
        // `.jpg` appearing elsewhere does not count.
        assert_eq!(Format::from_url("http://x/lion.jpg/view"), None);
        assert_eq!(Format::from_url("http://x/view?file=lion.jpg"), None);
        assert_eq!(Format::from_url("http://img.jpg.example.com/lion"), None);
    }

    #[test]
    fn path_format_requires_suffix() {
        assert_eq!(Format::from_path(Path::new("out/lion.gif")), Some(Format::Gif));
        assert_eq!(Format::from_path(Path::new("lion.png.bak")), None);
        assert_eq!(Format::from_path(Path::new("lion")), None);
    }

    #[test]
    fn sniff_prefers_bytes_over_url() {
        let bytes = png_bytes(2, 2);
        let format =
            resolve_source_format(&bytes, None, "http://x/lion.jpg", DecodeStrategy::Sniff)
                .unwrap();
        assert_eq!(format, Format::Png);
    }

    #[test]
    fn sniff_falls_back_to_url_for_unknown_bytes() {
        let format =
            resolve_source_format(b"garbage", None, "http://x/lion.gif", DecodeStrategy::Sniff)
                .unwrap();
        assert_eq!(format, Format::Gif);
    }

    #[test]
    fn sniff_uses_content_type_before_url() {
        let format = resolve_source_format(
            b"garbage",
            Some("image/gif"),
            "http://x/lion.jpg",
            DecodeStrategy::Sniff,
        )
        .unwrap();
        assert_eq!(format, Format::Gif);

        // Non-image content types fall through to the URL.
        let format = resolve_source_format(
            b"garbage",
            Some("text/html; charset=utf-8"),
            "http://x/lion.jpg",
            DecodeStrategy::Sniff,
        )
        .unwrap();
        assert_eq!(format, Format::Jpg);
    }

    #[test]
    fn content_type_parsing() {
        assert_eq!(Format::from_content_type("image/jpeg"), Some(Format::Jpg));
        assert_eq!(Format::from_content_type("IMAGE/PNG; q=1"), Some(Format::Png));
        assert_eq!(Format::from_content_type("image/pjpeg"), Some(Format::Jpg));
        assert_eq!(Format::from_content_type("image/webp"), None);
        assert_eq!(Format::from_content_type("application/gif"), None);
    }

    #[test]
    fn source_extension_ignores_bytes() {
        let bytes = png_bytes(2, 2);
        let format = resolve_source_format(
            &bytes,
            Some("image/png"),
            "http://x/lion.jpg",
            DecodeStrategy::SourceExtension,
        )
        .unwrap();
        assert_eq!(format, Format::Jpg);
    }

    #[test]
    fn unresolvable_source_is_unrecognized() {
        let result =
            resolve_source_format(b"garbage", None, "http://x/lion", DecodeStrategy::Sniff);
        assert!(matches!(result, Err(Error::UnrecognizedFormat(_))));

        let result = resolve_source_format(
            &png_bytes(1, 1),
            None,
            "http://x/lion.bmp",
            DecodeStrategy::SourceExtension,
        );
        assert!(matches!(result, Err(Error::UnrecognizedFormat(_))));
    }

    #[test]
    fn same_format_is_written_verbatim() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("lion.png");
        let bytes = png_bytes(3, 2);

        let outcome =
            save(&bytes, None, "http://x/lion.png", DecodeStrategy::Sniff, &dest).unwrap();

        assert!(!outcome.reencoded);
        assert_eq!(outcome.bytes_written, bytes.len());
        assert_eq!(std::fs::read(&dest).unwrap(), bytes);
    }

    #[test]
    fn different_format_is_reencoded() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("lion.jpg");
        let bytes = png_bytes(4, 4);

        let outcome =
            save(&bytes, None, "http://x/lion.png", DecodeStrategy::Sniff, &dest).unwrap();

        assert!(outcome.reencoded);
        assert_eq!(outcome.source_format, Format::Png);
        assert_eq!(outcome.output_format, Format::Jpg);
        let written = std::fs::read(&dest).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn jpeg_and_gif_sources_decode() {
        for (bytes, format) in [(jpeg_bytes(4, 4), Format::Jpg), (gif_bytes(4, 4), Format::Gif)] {
            let image = decode(&bytes, format).unwrap();
            assert_eq!((image.width(), image.height()), (4, 4));
        }
    }

    #[test]
    fn every_format_encodes() {
        let image = sample_image(5, 3);
        for format in Format::ALL {
            let bytes = encode(&image, format).unwrap();
            assert_eq!(image::guess_format(&bytes).unwrap(), format.image_format());
        }
    }

    #[test]
    fn corrupt_response_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("lion.png");

        let result = save(
            b"\x89PNG\r\n\x1a\nnot really",
            None,
            "http://x/lion.png",
            DecodeStrategy::Sniff,
            &dest,
        );

        assert!(matches!(result, Err(Error::DecodeFailure(_))));
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn destination_without_known_suffix_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("lion.tiff");
        let result = save(&png_bytes(1, 1), None, "http://x/a.png", DecodeStrategy::Sniff, &dest);
        assert!(matches!(result, Err(Error::UnrecognizedFormat(_))));
        assert!(!dest.exists());
    }

    #[test]
    fn missing_directory_is_write_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("missing").join("lion.png");
        let result = save(&png_bytes(1, 1), None, "http://x/a.png", DecodeStrategy::Sniff, &dest);
        assert!(matches!(result, Err(Error::WriteFailure { .. })));
    }

    #[test]
    fn failed_rename_leaves_no_part_file() {
        let tmp = TempDir::new().unwrap();
        // A non-empty directory in the way makes the rename fail after the write.
        let dest = tmp.path().join("lion.png");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("keep"), b"x").unwrap();

        let result = write_atomic(&dest, b"data");

        assert!(matches!(result, Err(Error::WriteFailure { .. })));
        assert!(!tmp.path().join("lion.png.part").exists());
    }

    #[test]
    fn unwritable_part_path_is_write_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("lion.png");
        // `<dest>.part` is a directory, so writing it fails.
        std::fs::create_dir(tmp.path().join("lion.png.part")).unwrap();

        let result = write_atomic(&dest, b"data");

        assert!(matches!(result, Err(Error::WriteFailure { .. })));
        assert!(!dest.exists());
    }
}
