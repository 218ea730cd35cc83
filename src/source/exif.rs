use anyhow::{Context, Result};
use nom_exif::*;
use std::path::Path;

use crate::metadata::{PropertyTree, RawProperty, keys};

use super::iptc;

// Pointer tags that only locate sub-IFDs
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_GPS_IFD: u16 = 0x8825;
const TAG_INTEROP_IFD: u16 = 0xA005;

const TAG_IPTC_NAA: u16 = 0x83BB;
const TAG_RESOLUTION_UNIT: u16 = 0x0128;
const TAG_PIXEL_X_DIMENSION: u16 = 0xA002;
const TAG_PIXEL_Y_DIMENSION: u16 = 0xA003;

/// Baseline IFD0 tags shown in the TIFF group, with their display keys.
const TIFF_TAGS: &[(u16, &str)] = &[
    (0x0103, "Compression"),
    (0x0106, "PhotometricInterpretation"),
    (0x010E, "ImageDescription"),
    (0x010F, "Make"),
    (0x0110, "Model"),
    (0x0112, "Orientation"),
    (0x011A, "XResolution"),
    (0x011B, "YResolution"),
    (0x0128, "ResolutionUnit"),
    (0x012D, "TransferFunction"),
    (0x0131, "Software"),
    (0x0132, "DateTime"),
    (0x013B, "Artist"),
    (0x013C, "HostComputer"),
    (0x013E, "WhitePoint"),
    (0x013F, "PrimaryChromaticities"),
    (0x0142, "TileWidth"),
    (0x0143, "TileLength"),
    (0x8298, "Copyright"),
];

/// EXIF tags whose display key must match the formatter's field table.
const EXIF_TAGS: &[(u16, &str)] = &[
    (0x9000, keys::EXIF_VERSION),
    (0xA000, keys::FLASHPIX_VERSION),
    (0xA432, keys::LENS_SPECIFICATION),
];

/// Metadata read from the EXIF block of a file.
#[derive(Debug, Default)]
pub struct ExifProperties {
    pub exif: PropertyTree,
    pub tiff: PropertyTree,
    pub gps: PropertyTree,
    pub iptc: PropertyTree,
    /// Fields surfaced at the top level (orientation, DPI, pixel size).
    pub top_level: PropertyTree,
}

/// Read EXIF (still images) or track info (video/audio) from a file.
///
/// Returns `Ok(None)` when the file carries neither.
pub fn read_exif(path: &Path) -> Result<Option<ExifProperties>> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).context("Failed to open media file")?;

    if ms.has_exif() {
        let iter: ExifIter = match parser.parse(ms) {
            Ok(iter) => iter,
            Err(e) => {
                log::debug!("No EXIF data found in {}: {e}", path.display());
                return Ok(None);
            }
        };
        Ok(Some(collect_exif(iter)))
    } else if ms.has_track() {
        let info: TrackInfo = parser.parse(ms).context("Failed to parse track info")?;
        Ok(Some(collect_track(&info)))
    } else {
        Ok(None)
    }
}

fn collect_exif(iter: ExifIter) -> ExifProperties {
    let mut props = ExifProperties::default();
    let mut saw_gps_pointer = false;

    for entry in iter {
        // IFD1 describes the embedded thumbnail
        if entry.ifd_index() != 0 {
            continue;
        }
        let code = entry.tag_code();
        if matches!(code, TAG_EXIF_IFD | TAG_GPS_IFD | TAG_INTEROP_IFD) {
            saw_gps_pointer |= code == TAG_GPS_IFD;
            continue;
        }
        let Some(value) = entry.get_value() else {
            continue;
        };

        if code == TAG_IPTC_NAA {
            if let Some(bytes) = entry_bytes(value) {
                props.iptc.extend(iptc::parse_records(&bytes));
            }
            continue;
        }

        let tag_name = match entry.tag() {
            Some(tag) => format!("{tag:?}"),
            None => format!("Tag0x{code:04X}"),
        };

        if let Some(gps_key) = tag_name.strip_prefix("GPS") {
            let key = match gps_key {
                "VersionID" => keys::GPS_VERSION,
                other => other,
            };
            props.gps.insert(key.to_string(), gps_value(key, value));
        } else if let Some((_, key)) = TIFF_TAGS.iter().find(|(c, _)| *c == code) {
            props.tiff.insert(key.to_string(), entry_to_raw(value));
        } else {
            let key = EXIF_TAGS
                .iter()
                .find(|(c, _)| *c == code)
                .map(|(_, k)| k.to_string())
                .unwrap_or(tag_name);
            props.exif.insert(key, entry_to_raw(value));
        }

        if code == TAG_PIXEL_X_DIMENSION || code == TAG_PIXEL_Y_DIMENSION {
            let key = if code == TAG_PIXEL_X_DIMENSION {
                keys::PIXEL_WIDTH
            } else {
                keys::PIXEL_HEIGHT
            };
            props.top_level.insert(key.to_string(), entry_to_raw(value));
        }
    }

    // nom-exif stops reading an IFD at a tag 0 entry, and GPSVersionID is
    // tag 0, so a GPS IFD that leads with it comes through empty
    if saw_gps_pointer && props.gps.is_empty() {
        log::debug!("GPSInfo pointer present but no GPS entries were read");
    }

    surface_top_level(&mut props);
    props
}

/// Copy orientation and resolution from the TIFF group to the top level.
fn surface_top_level(props: &mut ExifProperties) {
    if let Some(orientation) = props.tiff.get("Orientation") {
        props
            .top_level
            .insert(keys::ORIENTATION.to_string(), orientation.clone());
    }

    // Unit 2 is inches (the TIFF default), 3 is centimetres
    let unit = props.tiff.get("ResolutionUnit").and_then(RawProperty::as_i64).unwrap_or(2);
    let scale = match unit {
        2 => Some(1.0),
        3 => Some(2.54),
        _ => None,
    };
    if let Some(scale) = scale {
        for (tiff_key, dpi_key) in [("XResolution", keys::DPI_WIDTH), ("YResolution", keys::DPI_HEIGHT)] {
            if let Some(res) = props.tiff.get(tiff_key).and_then(RawProperty::as_f64) {
                props
                    .top_level
                    .insert(dpi_key.to_string(), RawProperty::Float(res * scale));
            }
        }
    } else {
        log::debug!("Unsupported resolution unit {unit} (tag 0x{TAG_RESOLUTION_UNIT:04X})");
    }
}

fn collect_track(info: &TrackInfo) -> ExifProperties {
    let mut props = ExifProperties::default();

    for (tag, value) in info.iter() {
        let name = format!("{tag:?}");
        let key = match name.as_str() {
            "Width" | "ImageWidth" => keys::PIXEL_WIDTH.to_string(),
            "Height" | "ImageHeight" => keys::PIXEL_HEIGHT.to_string(),
            _ => name,
        };
        props.top_level.insert(key, entry_to_raw(value));
    }

    if let Some(gps) = info.get_gps_info() {
        props.gps.insert(
            keys::GPS_LATITUDE.to_string(),
            RawProperty::Float(latlng_to_decimal(&gps.latitude)),
        );
        props.gps.insert(
            keys::GPS_LATITUDE_REF.to_string(),
            RawProperty::Text(gps.latitude_ref.to_string()),
        );
        props.gps.insert(
            keys::GPS_LONGITUDE.to_string(),
            RawProperty::Float(latlng_to_decimal(&gps.longitude)),
        );
        props.gps.insert(
            keys::GPS_LONGITUDE_REF.to_string(),
            RawProperty::Text(gps.longitude_ref.to_string()),
        );
    }

    props
}

/// GPS angles arrive as degrees/minutes/seconds; store them as decimal degrees.
fn gps_value(key: &str, value: &EntryValue) -> RawProperty {
    match (key, value) {
        ("Latitude" | "Longitude" | "DestLatitude" | "DestLongitude", EntryValue::URationalArray(parts))
            if parts.len() == 3 =>
        {
            let degrees = rational(parts[0].0 as f64, parts[0].1 as f64);
            let minutes = rational(parts[1].0 as f64, parts[1].1 as f64);
            let seconds = rational(parts[2].0 as f64, parts[2].1 as f64);
            RawProperty::Float(degrees + minutes / 60.0 + seconds / 3600.0)
        }
        _ => entry_to_raw(value),
    }
}

/// Convert a nom-exif EntryValue into a raw property.
fn entry_to_raw(value: &EntryValue) -> RawProperty {
    match value {
        EntryValue::Text(s) => RawProperty::Text(s.trim_end_matches('\0').to_string()),
        EntryValue::URational(r) => RawProperty::Float(rational(r.0 as f64, r.1 as f64)),
        EntryValue::IRational(r) => RawProperty::Float(rational(r.0 as f64, r.1 as f64)),
        EntryValue::U8(v) => RawProperty::Integer(i64::from(*v)),
        EntryValue::U16(v) => RawProperty::Integer(i64::from(*v)),
        EntryValue::U32(v) => RawProperty::Integer(i64::from(*v)),
        EntryValue::U64(v) => match i64::try_from(*v) {
            Ok(i) => RawProperty::Integer(i),
            Err(_) => RawProperty::Float(*v as f64),
        },
        EntryValue::I8(v) => RawProperty::Integer(i64::from(*v)),
        EntryValue::I16(v) => RawProperty::Integer(i64::from(*v)),
        EntryValue::I32(v) => RawProperty::Integer(i64::from(*v)),
        EntryValue::I64(v) => RawProperty::Integer(*v),
        EntryValue::F32(v) => RawProperty::Float(f64::from(*v)),
        EntryValue::F64(v) => RawProperty::Float(*v),
        EntryValue::Undefined(bytes) => RawProperty::Bytes(bytes.clone()),
        EntryValue::URationalArray(v) => {
            RawProperty::Numbers(v.iter().map(|r| rational(r.0 as f64, r.1 as f64)).collect())
        }
        EntryValue::IRationalArray(v) => {
            RawProperty::Numbers(v.iter().map(|r| rational(r.0 as f64, r.1 as f64)).collect())
        }
        EntryValue::U8Array(v) => RawProperty::Integers(v.iter().map(|x| i64::from(*x)).collect()),
        EntryValue::U16Array(v) => RawProperty::Integers(v.iter().map(|x| i64::from(*x)).collect()),
        EntryValue::U32Array(v) => RawProperty::Integers(v.iter().map(|x| i64::from(*x)).collect()),
        other => RawProperty::Opaque(other.to_string()),
    }
}

fn entry_bytes(value: &EntryValue) -> Option<Vec<u8>> {
    match value {
        EntryValue::Undefined(bytes) | EntryValue::U8Array(bytes) => Some(bytes.clone()),
        EntryValue::U32Array(words) => Some(words.iter().flat_map(|w| w.to_be_bytes()).collect()),
        _ => None,
    }
}

/// Rationals with a zero denominator read as zero.
fn rational(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

/// Convert a nom-exif LatLng (3 URationals: deg, min, sec) to decimal degrees.
fn latlng_to_decimal(latlng: &LatLng) -> f64 {
    let degrees = rational(latlng.0.0 as f64, latlng.0.1 as f64);
    let minutes = rational(latlng.1.0 as f64, latlng.1.1 as f64);
    let seconds = rational(latlng.2.0 as f64, latlng.2.1 as f64);

    degrees + minutes / 60.0 + seconds / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn text_entries_drop_nul_padding() {
        let v = EntryValue::Text("Canon\0\0".to_string());
        assert_eq!(entry_to_raw(&v), RawProperty::from("Canon"));
    }

    #[test]
    fn zero_denominator_reads_as_zero() {
        assert_eq!(rational(5.0, 0.0), 0.0);
        assert_eq!(rational(5.0, 2.0), 2.5);
    }

    #[test]
    fn resolution_in_centimetres_becomes_dpi() {
        let mut props = ExifProperties::default();
        props.tiff.insert("XResolution".into(), RawProperty::Float(100.0));
        props.tiff.insert("YResolution".into(), RawProperty::Float(50.0));
        props.tiff.insert("ResolutionUnit".into(), RawProperty::Integer(3));
        props.tiff.insert("Orientation".into(), RawProperty::Integer(6));
        surface_top_level(&mut props);

        assert_eq!(props.top_level.get(keys::DPI_WIDTH), Some(&RawProperty::Float(254.0)));
        assert_eq!(props.top_level.get(keys::DPI_HEIGHT), Some(&RawProperty::Float(127.0)));
        assert_eq!(props.top_level.get(keys::ORIENTATION), Some(&RawProperty::Integer(6)));
    }

    #[test]
    fn resolution_without_unit_defaults_to_inches() {
        let mut props = ExifProperties::default();
        props.tiff.insert("XResolution".into(), RawProperty::Float(72.0));
        surface_top_level(&mut props);
        assert_eq!(props.top_level.get(keys::DPI_WIDTH), Some(&RawProperty::Float(72.0)));
        assert!(props.top_level.get(keys::DPI_HEIGHT).is_none());
    }

    // ── EXIF blocks ──────────────────────────────────────────────────

    const ASCII: u16 = 2;
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    const RATIONAL: u16 = 5;
    const UNDEFINED: u16 = 7;

    /// One little-endian IFD entry: tag, type, count and payload.
    type Entry = (u16, u16, u32, Vec<u8>);

    fn ascii(tag: u16, s: &str) -> Entry {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        (tag, ASCII, bytes.len() as u32, bytes)
    }

    fn short(tag: u16, v: u16) -> Entry {
        (tag, SHORT, 1, v.to_le_bytes().to_vec())
    }

    fn long(tag: u16, v: u32) -> Entry {
        (tag, LONG, 1, v.to_le_bytes().to_vec())
    }

    fn rationals(tag: u16, parts: &[(u32, u32)]) -> Entry {
        let bytes = parts
            .iter()
            .flat_map(|(n, d)| n.to_le_bytes().into_iter().chain(d.to_le_bytes()))
            .collect();
        (tag, RATIONAL, parts.len() as u32, bytes)
    }

    fn undefined(tag: u16, bytes: &[u8]) -> Entry {
        (tag, UNDEFINED, bytes.len() as u32, bytes.to_vec())
    }

    fn ifd_len(entries: &[Entry]) -> u32 {
        let data: usize = entries.iter().map(|e| e.3.len()).filter(|n| *n > 4).sum();
        6 + 12 * entries.len() as u32 + data as u32
    }

    /// Serialize an IFD at `start`, with out-of-line values right after it.
    fn ifd(entries: &[Entry], start: u32) -> Vec<u8> {
        let data_start = start + 6 + 12 * entries.len() as u32;
        let mut out = (entries.len() as u16).to_le_bytes().to_vec();
        let mut data = Vec::new();
        for (tag, kind, count, payload) in entries {
            out.extend(tag.to_le_bytes());
            out.extend(kind.to_le_bytes());
            out.extend(count.to_le_bytes());
            if payload.len() <= 4 {
                let mut inline = payload.clone();
                inline.resize(4, 0);
                out.extend(inline);
            } else {
                out.extend((data_start + data.len() as u32).to_le_bytes());
                data.extend_from_slice(payload);
            }
        }
        out.extend(0u32.to_le_bytes());
        out.extend(data);
        out
    }

    /// A TIFF block whose IFD0 points at the given EXIF and GPS IFDs.
    fn tiff(mut ifd0: Vec<Entry>, exif: &[Entry], gps: &[Entry]) -> Vec<u8> {
        ifd0.push(long(TAG_EXIF_IFD, 0));
        ifd0.push(long(TAG_GPS_IFD, 0));
        let exif_at = 8 + ifd_len(&ifd0);
        let gps_at = exif_at + ifd_len(exif);
        let n = ifd0.len();
        ifd0[n - 2] = long(TAG_EXIF_IFD, exif_at);
        ifd0[n - 1] = long(TAG_GPS_IFD, gps_at);

        let mut out = b"II".to_vec();
        out.extend(42u16.to_le_bytes());
        out.extend(8u32.to_le_bytes());
        out.extend(ifd(&ifd0, 8));
        out.extend(ifd(exif, exif_at));
        out.extend(ifd(gps, gps_at));
        out
    }

    /// Wrap a TIFF block in a JPEG APP1 segment and write it out.
    fn write_jpeg(dir: &TempDir, tiff: &[u8]) -> std::path::PathBuf {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend(((tiff.len() + 8) as u16).to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(tiff);
        jpeg.extend([0xFF, 0xD9]);
        let path = dir.path().join("camera.jpg");
        std::fs::write(&path, jpeg).unwrap();
        path
    }

    fn camera_ifd0() -> Vec<Entry> {
        vec![
            ascii(0x010F, "Canon"),
            short(0x0112, 6),
            rationals(0x011A, &[(300, 1)]),
            rationals(0x011B, &[(300, 1)]),
            short(0x0128, 2),
        ]
    }

    fn camera_exif() -> Vec<Entry> {
        vec![
            undefined(0x9000, b"0232"),
            rationals(0xA432, &[(24, 1), (70, 1), (28, 10), (28, 10)]),
        ]
    }

    #[test]
    fn exif_block_splits_into_groups() {
        let gps = [
            ascii(0x0001, "S"),
            rationals(0x0002, &[(37, 1), (46, 1), (2964, 100)]),
            ascii(0x0003, "W"),
            rationals(0x0004, &[(122, 1), (25, 1), (984, 100)]),
        ];
        let dir = TempDir::new().unwrap();
        let path = write_jpeg(&dir, &tiff(camera_ifd0(), &camera_exif(), &gps));

        let props = read_exif(&path).unwrap().unwrap();

        assert_eq!(props.tiff.get("Make"), Some(&RawProperty::from("Canon")));
        assert_eq!(props.tiff.get("Orientation"), Some(&RawProperty::Integer(6)));
        assert!(!props.exif.contains_key("Make"));

        assert_eq!(
            props.exif.get(keys::EXIF_VERSION),
            Some(&RawProperty::Bytes(b"0232".to_vec()))
        );
        assert_eq!(
            props.exif.get(keys::LENS_SPECIFICATION),
            Some(&RawProperty::Numbers(vec![24.0, 70.0, 2.8, 2.8]))
        );
        assert!(!props.exif.contains_key("ExifOffset"));
        assert!(!props.exif.contains_key("GPSInfo"));

        // GPS keys lose their prefix; angles become decimal degrees
        let mut gps_keys: Vec<&str> = props.gps.keys().map(String::as_str).collect();
        gps_keys.sort();
        assert_eq!(gps_keys, vec!["Latitude", "LatitudeRef", "Longitude", "LongitudeRef"]);
        assert_eq!(props.gps.get("LatitudeRef"), Some(&RawProperty::from("S")));
        let lat = props.gps.get("Latitude").and_then(RawProperty::as_f64).unwrap();
        let lon = props.gps.get("Longitude").and_then(RawProperty::as_f64).unwrap();
        assert!((lat - 37.7749).abs() < 1e-6, "{lat}");
        assert!((lon - 122.4194).abs() < 1e-6, "{lon}");

        assert_eq!(props.top_level.get(keys::DPI_WIDTH), Some(&RawProperty::Float(300.0)));
        assert_eq!(props.top_level.get(keys::DPI_HEIGHT), Some(&RawProperty::Float(300.0)));
        assert_eq!(props.top_level.get(keys::ORIENTATION), Some(&RawProperty::Integer(6)));
    }

    #[test]
    fn gps_ifd_led_by_version_id_reads_empty() {
        let gps = [
            (0x0000, 1, 4, vec![2, 3, 0, 0]),
            ascii(0x0001, "N"),
            rationals(0x0002, &[(37, 1), (46, 1), (2964, 100)]),
        ];
        let dir = TempDir::new().unwrap();
        let path = write_jpeg(&dir, &tiff(camera_ifd0(), &camera_exif(), &gps));

        let props = read_exif(&path).unwrap().unwrap();
        assert!(props.gps.is_empty());
        assert_eq!(props.tiff.get("Make"), Some(&RawProperty::from("Canon")));
        assert!(props.exif.contains_key(keys::LENS_SPECIFICATION));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_exif(Path::new("/nonexistent/photo.jpg")).is_err());
    }
}
