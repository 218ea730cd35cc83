//! Properties read from the image container itself: decoded pixel format,
//! JPEG APP segments (JFIF, IPTC) and PNG chunks.

use image::{ImageDecoder, ImageReader};
use img_parts::Bytes;
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use std::io::Cursor;

use crate::metadata::{PropertyTree, RawProperty, keys};

use super::iptc;

const JFIF_HEADER: &[u8] = b"JFIF\0";
const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const XMP_KEYWORD: &str = "XML:com.adobe.xmp";
const MARKER_APP0: u8 = 0xE0;
const MARKER_APP13: u8 = 0xED;
const MARKER_SOF2: u8 = 0xC2;
const INCHES_PER_METRE: f64 = 39.3701;

/// What the image decoder reports about the primary image.
#[derive(Debug, Default)]
pub struct ImageInfo {
    pub top_level: PropertyTree,
}

/// Groups found in the container's own segments.
#[derive(Debug, Default)]
pub struct ContainerProperties {
    pub jfif: PropertyTree,
    pub iptc: PropertyTree,
    pub png: PropertyTree,
    /// DPI derived from JFIF density or PNG pHYs.
    pub top_level: PropertyTree,
}

/// Decode the image header: dimensions, color model, bit depth, profile.
///
/// Returns `None` when no decoder recognizes the data.
pub fn read_image_info(data: &[u8]) -> Option<ImageInfo> {
    let reader = match ImageReader::new(Cursor::new(data)).with_guessed_format() {
        Ok(reader) => reader,
        Err(e) => {
            log::debug!("Could not guess image format: {e}");
            return None;
        }
    };
    let mut decoder = match reader.into_decoder() {
        Ok(decoder) => decoder,
        Err(e) => {
            log::debug!("No image decoder available: {e}");
            return None;
        }
    };

    let mut top_level = PropertyTree::new();
    let (width, height) = decoder.dimensions();
    top_level.insert(keys::PIXEL_WIDTH.to_string(), RawProperty::from(width));
    top_level.insert(keys::PIXEL_HEIGHT.to_string(), RawProperty::from(height));

    let color = decoder.color_type();
    let model = if color.has_color() { "RGB" } else { "Gray" };
    top_level.insert(keys::COLOR_MODEL.to_string(), RawProperty::from(model));
    let depth = color.bits_per_pixel() / u16::from(color.channel_count().max(1));
    top_level.insert(keys::DEPTH.to_string(), RawProperty::Integer(i64::from(depth)));
    if color.has_alpha() {
        top_level.insert("HasAlpha".to_string(), RawProperty::Integer(1));
    }

    match decoder.icc_profile() {
        Ok(Some(icc)) => {
            if let Some(name) = icc_profile_description(&icc) {
                top_level.insert(keys::PROFILE_NAME.to_string(), RawProperty::Text(name));
            }
        }
        Ok(None) => {}
        Err(e) => log::debug!("Could not read ICC profile: {e}"),
    }

    Some(ImageInfo { top_level })
}

/// Read JFIF, IPTC and PNG properties from JPEG or PNG data.
pub fn read_container(data: &Bytes) -> ContainerProperties {
    let mut props = ContainerProperties::default();

    if let Ok(jpeg) = Jpeg::from_bytes(data.clone()) {
        let progressive = jpeg.segments().iter().any(|s| s.marker() == MARKER_SOF2);
        for segment in jpeg.segments() {
            let contents = segment.contents();
            match segment.marker() {
                MARKER_APP0 if contents.starts_with(JFIF_HEADER) => {
                    read_jfif(contents, progressive, &mut props);
                }
                MARKER_APP13 if contents.starts_with(PHOTOSHOP_HEADER) => {
                    props.iptc.extend(iptc::parse_photoshop_resources(contents));
                }
                _ => {}
            }
        }
    } else if let Ok(png) = Png::from_bytes(data.clone()) {
        for chunk in png.chunks() {
            read_png_chunk(&chunk.kind(), chunk.contents(), &mut props);
        }
    }

    props
}

/// APP0: "JFIF\0", version major/minor, density unit, X/Y density (u16 BE).
fn read_jfif(contents: &[u8], progressive: bool, props: &mut ContainerProperties) {
    let body = &contents[JFIF_HEADER.len()..];
    if body.len() < 7 {
        log::debug!("Truncated JFIF header ({} bytes)", contents.len());
        return;
    }

    let (major, minor) = (i64::from(body[0]), i64::from(body[1]));
    let unit = body[2];
    let x_density = u16::from_be_bytes([body[3], body[4]]);
    let y_density = u16::from_be_bytes([body[5], body[6]]);

    let jfif = &mut props.jfif;
    jfif.insert(
        keys::JFIF_VERSION.to_string(),
        RawProperty::Integers(vec![major, minor / 10, minor % 10]),
    );
    jfif.insert("DensityUnit".to_string(), RawProperty::Integer(i64::from(unit)));
    jfif.insert("XDensity".to_string(), RawProperty::Integer(i64::from(x_density)));
    jfif.insert("YDensity".to_string(), RawProperty::Integer(i64::from(y_density)));
    jfif.insert("IsProgressive".to_string(), RawProperty::Integer(i64::from(progressive)));

    // 1 = dots per inch, 2 = dots per cm
    let scale = match unit {
        1 => Some(1.0),
        2 => Some(2.54),
        _ => None,
    };
    if let Some(scale) = scale {
        props.top_level.insert(
            keys::DPI_WIDTH.to_string(),
            RawProperty::Float(f64::from(x_density) * scale),
        );
        props.top_level.insert(
            keys::DPI_HEIGHT.to_string(),
            RawProperty::Float(f64::from(y_density) * scale),
        );
    }
}

fn read_png_chunk(kind: &[u8; 4], contents: &[u8], props: &mut ContainerProperties) {
    let png = &mut props.png;
    match kind {
        b"IHDR" if contents.len() >= 13 => {
            png.insert("InterlaceType".to_string(), RawProperty::Integer(i64::from(contents[12])));
        }
        b"gAMA" if contents.len() >= 4 => {
            let gamma = u32::from_be_bytes([contents[0], contents[1], contents[2], contents[3]]);
            png.insert("Gamma".to_string(), RawProperty::Float(f64::from(gamma) / 100_000.0));
        }
        b"sRGB" if !contents.is_empty() => {
            png.insert("sRGBIntent".to_string(), RawProperty::Integer(i64::from(contents[0])));
        }
        b"pHYs" if contents.len() >= 9 => {
            let x = u32::from_be_bytes([contents[0], contents[1], contents[2], contents[3]]);
            let y = u32::from_be_bytes([contents[4], contents[5], contents[6], contents[7]]);
            png.insert("XPixelsPerMeter".to_string(), RawProperty::from(x));
            png.insert("YPixelsPerMeter".to_string(), RawProperty::from(y));
            // unit 1 = metre, 0 = aspect ratio only
            if contents[8] == 1 {
                let top = &mut props.top_level;
                top.insert(
                    keys::DPI_WIDTH.to_string(),
                    RawProperty::Float((f64::from(x) / INCHES_PER_METRE).round()),
                );
                top.insert(
                    keys::DPI_HEIGHT.to_string(),
                    RawProperty::Float((f64::from(y) / INCHES_PER_METRE).round()),
                );
            }
        }
        b"tEXt" => {
            if let Some((keyword, text)) = split_keyword(contents) {
                // Latin-1
                let text: String = text.iter().map(|b| *b as char).collect();
                png.insert(keyword, RawProperty::Text(text));
            }
        }
        b"iTXt" => {
            if let Some((keyword, text)) = read_itxt(contents) {
                png.insert(keyword, RawProperty::Text(text));
            }
        }
        _ => {}
    }
}

/// `keyword\0rest`, with a Latin-1 keyword.
fn split_keyword(contents: &[u8]) -> Option<(String, &[u8])> {
    let nul = contents.iter().position(|b| *b == 0)?;
    if nul == 0 {
        return None;
    }
    let keyword = contents[..nul].iter().map(|b| *b as char).collect();
    Some((keyword, &contents[nul + 1..]))
}

/// iTXt: keyword\0, compression flag, method, language\0, translated keyword\0, UTF-8 text.
///
/// Compressed text and XMP packets are skipped.
fn read_itxt(contents: &[u8]) -> Option<(String, String)> {
    let (keyword, rest) = split_keyword(contents)?;
    if keyword == XMP_KEYWORD || rest.len() < 2 || rest[0] != 0 {
        return None;
    }
    let rest = &rest[2..];
    let lang_end = rest.iter().position(|b| *b == 0)?;
    let rest = &rest[lang_end + 1..];
    let translated_end = rest.iter().position(|b| *b == 0)?;
    let text = std::str::from_utf8(&rest[translated_end + 1..]).ok()?;
    Some((keyword, text.to_string()))
}

/// Description of an ICC profile, from its `desc` tag.
///
/// Handles both the v2 `desc` text type and the v4 `mluc` type.
pub fn icc_profile_description(icc: &[u8]) -> Option<String> {
    let be_u32 = |at: usize| -> Option<u32> {
        let b = icc.get(at..at + 4)?;
        Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    };

    // The declared count can exceed what the profile holds
    let tag_count = (be_u32(128)? as usize).min(icc.len().saturating_sub(132) / 12);
    let (offset, size) = (0..tag_count).find_map(|i| {
        let entry = 132 + i * 12;
        (icc.get(entry..entry + 4)? == b"desc")
            .then(|| Some((be_u32(entry + 4)? as usize, be_u32(entry + 8)? as usize)))
            .flatten()
    })?;
    let tag = icc.get(offset..offset.checked_add(size)?)?;

    let text = match tag.get(0..4)? {
        b"desc" => {
            let len = u32::from_be_bytes(tag.get(8..12)?.try_into().ok()?) as usize;
            let ascii = tag.get(12..12 + len)?;
            ascii
                .iter()
                .take_while(|b| **b != 0)
                .map(|b| *b as char)
                .collect::<String>()
        }
        b"mluc" => {
            let len = u32::from_be_bytes(tag.get(20..24)?.try_into().ok()?) as usize;
            let at = u32::from_be_bytes(tag.get(24..28)?.try_into().ok()?) as usize;
            let units: Vec<u16> = tag
                .get(at..at + len)?
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => return None,
    };

    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}
