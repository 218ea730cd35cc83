//! Where raw property trees come from.
//!
//! [`FileSource`] reads a file from disk and merges what the image decoder,
//! the EXIF block and the container segments report into one
//! [`PropertyTree`] in the ImageIO key layout.

mod container;
mod exif;
mod iptc;

use anyhow::{Context, Result};
use image::ImageFormat;
use img_parts::Bytes;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::metadata::{PropertyTree, RawProperty, keys};

/// Produces the raw property tree for the primary image or track of a file.
///
/// `Err` means the file could not be read at all; `Ok(None)` means it was
/// read but no properties were recognized.
pub trait MetadataSource: Send + Sync {
    fn read_properties(&self, path: &Path) -> Result<Option<PropertyTree>>;
}

/// Bytes sniffed to decide whether a file is worth buffering.
const SNIFF_LEN: u64 = 32;
/// Largest file handed to the in-memory decoder and segment readers.
const MAX_BUFFERED_BYTES: u64 = 256 * 1024 * 1024;

/// Formats both the decoder and the segment readers understand.
fn is_buffered_format(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP)
}

/// Load the whole file only when it is a still image of bounded size.
///
/// Videos and other containers stay on disk; EXIF is streamed separately.
fn read_image_bytes(path: &Path) -> Result<Option<Bytes>> {
    let mut file = File::open(path)
        .with_context(|| format!("Could not open file {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("Could not stat file {}", path.display()))?
        .len();

    let mut buf = Vec::new();
    (&mut file)
        .take(SNIFF_LEN)
        .read_to_end(&mut buf)
        .with_context(|| format!("Could not read file {}", path.display()))?;

    match image::guess_format(&buf) {
        Ok(format) if is_buffered_format(format) && len <= MAX_BUFFERED_BYTES => {}
        Ok(format) if is_buffered_format(format) => {
            log::debug!("{} is {len} bytes, skipping image decoding", path.display());
            return Ok(None);
        }
        _ => {
            log::debug!("{} is not a buffered image format", path.display());
            return Ok(None);
        }
    }

    buf.reserve(len.saturating_sub(buf.len() as u64) as usize);
    file.read_to_end(&mut buf)
        .with_context(|| format!("Could not read file {}", path.display()))?;
    Ok(Some(Bytes::from(buf)))
}

/// Reads properties straight from the file on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

impl FileSource {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataSource for FileSource {
    fn read_properties(&self, path: &Path) -> Result<Option<PropertyTree>> {
        let data = read_image_bytes(path)?;

        let mut tree = PropertyTree::new();

        if let Some(info) = data.as_deref().and_then(container::read_image_info) {
            tree.extend(info.top_level);
        }

        let container = data
            .as_ref()
            .map(container::read_container)
            .unwrap_or_default();

        let exif = match exif::read_exif(path) {
            Ok(exif) => exif.unwrap_or_default(),
            Err(e) => {
                log::debug!("No EXIF data in {}: {e:#}", path.display());
                Default::default()
            }
        };

        // Decoder values win; EXIF then container values fill the gaps
        for (key, value) in exif.top_level.into_iter().chain(container.top_level) {
            tree.entry(key).or_insert(value);
        }

        let mut iptc = exif.iptc;
        iptc.extend(container.iptc);

        for (group_key, group) in [
            (keys::EXIF, exif.exif),
            (keys::TIFF, exif.tiff),
            (keys::GPS, exif.gps),
            (keys::IPTC, iptc),
            (keys::JFIF, container.jfif),
            (keys::PNG, container.png),
        ] {
            if !group.is_empty() {
                tree.insert(group_key.to_string(), RawProperty::Map(group));
            }
        }

        if tree.is_empty() {
            log::debug!("No recognizable properties in {}", path.display());
            return Ok(None);
        }
        Ok(Some(tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // ── FileSource ───────────────────────────────────────────────────

    #[test]
    fn missing_file_is_unreadable() {
        let err = FileSource::new()
            .read_properties(Path::new("/nonexistent/photo.jpg"))
            .unwrap_err();
        assert!(format!("{err:#}").starts_with("Could not open file"));
    }

    #[test]
    fn unrecognized_file_has_no_properties() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.jpg");
        fs::write(&path, b"plain text, not an image").unwrap();

        assert!(FileSource::new().read_properties(&path).unwrap().is_none());
    }

    #[test]
    fn large_video_is_not_buffered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mov");
        let file = fs::File::create(&path).unwrap();
        file.set_len(1 << 30).unwrap();
        drop(file);

        assert!(read_image_bytes(&path).unwrap().is_none());
        assert!(FileSource::new().read_properties(&path).unwrap().is_none());
    }

    #[test]
    fn oversized_image_is_not_buffered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.jpg");
        let mut file = fs::File::create(&path).unwrap();
        std::io::Write::write_all(&mut file, &[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        file.set_len(MAX_BUFFERED_BYTES + 1).unwrap();
        drop(file);

        assert!(read_image_bytes(&path).unwrap().is_none());
    }

    #[test]
    fn png_is_buffered_whole() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.png");
        image::RgbImage::new(4, 2).save(&path).unwrap();

        let data = read_image_bytes(&path).unwrap().unwrap();
        assert_eq!(data.len() as u64, fs::metadata(&path).unwrap().len());
        assert_eq!(&data[..4], b"\x89PNG");
    }

    #[test]
    fn jpeg_headers_without_pixels_still_yield_jfif() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("header.jpg");
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        jpeg.extend_from_slice(b"JFIF\0");
        jpeg.extend_from_slice(&[1, 1, 1, 0, 96, 0, 96, 0, 0]);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        fs::write(&path, &jpeg).unwrap();

        let tree = FileSource::new().read_properties(&path).unwrap().unwrap();
        let jfif = tree.get(keys::JFIF).and_then(RawProperty::as_map).unwrap();
        assert_eq!(jfif.get("XDensity"), Some(&RawProperty::Integer(96)));
        assert_eq!(tree.get(keys::DPI_WIDTH), Some(&RawProperty::Float(96.0)));
    }
}
