//! IPTC-IIM records from Photoshop image resource blocks (JPEG APP13) or
//! raw IIM bytes (TIFF tag 33723).
//!
//! IIM dataset format:
//!   Byte 0:    0x1C (tag marker)
//!   Byte 1:    Record number (2 = application record)
//!   Byte 2:    Dataset number
//!   Bytes 3-4: Data length (big-endian u16)
//!   Bytes 5+:  Data

use crate::metadata::{PropertyTree, RawProperty};

const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const BIM_MARKER: &[u8] = b"8BIM";
const IPTC_RESOURCE_ID: u16 = 0x0404;
const IIM_TAG_MARKER: u8 = 0x1C;
const APPLICATION_RECORD: u8 = 2;

/// Application-record datasets: number, display key, repeatable.
const DATASETS: &[(u8, &str, bool)] = &[
    (5, "ObjectName", false),
    (7, "EditStatus", false),
    (10, "Urgency", false),
    (15, "Category", false),
    (20, "SupplementalCategory", true),
    (25, "Keywords", true),
    (40, "SpecialInstructions", false),
    (55, "DateCreated", false),
    (60, "TimeCreated", false),
    (62, "DigitalCreationDate", false),
    (63, "DigitalCreationTime", false),
    (65, "OriginatingProgram", false),
    (70, "ProgramVersion", false),
    (80, "Byline", true),
    (85, "BylineTitle", true),
    (90, "City", false),
    (92, "SubLocation", false),
    (95, "ProvinceState", false),
    (100, "CountryPrimaryLocationCode", false),
    (101, "CountryPrimaryLocationName", false),
    (103, "OriginalTransmissionReference", false),
    (105, "Headline", false),
    (110, "Credit", false),
    (115, "Source", false),
    (116, "CopyrightNotice", false),
    (118, "Contact", true),
    (120, "CaptionAbstract", false),
    (122, "WriterEditor", true),
];

/// Parse the IPTC records inside a JPEG APP13 segment.
pub fn parse_photoshop_resources(segment: &[u8]) -> PropertyTree {
    find_iptc_resource(segment)
        .map(parse_records)
        .unwrap_or_default()
}

/// Parse raw IIM bytes into a property tree keyed by dataset name.
///
/// Repeatable datasets collect into a string list; unknown datasets and
/// records other than the application record are skipped.
pub fn parse_records(data: &[u8]) -> PropertyTree {
    let mut tree = PropertyTree::new();
    let mut lists: Vec<(&str, Vec<String>)> = Vec::new();
    let mut pos = 0;

    while pos + 5 <= data.len() {
        if data[pos] != IIM_TAG_MARKER {
            pos += 1;
            continue;
        }

        let record = data[pos + 1];
        let dataset = data[pos + 2];
        let length = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as usize;
        pos += 5;

        if pos + length > data.len() {
            break;
        }

        if record == APPLICATION_RECORD {
            if let Some((_, key, repeatable)) = DATASETS.iter().find(|(n, _, _)| *n == dataset) {
                let value = String::from_utf8_lossy(&data[pos..pos + length]).trim().to_string();
                if !value.is_empty() {
                    if *repeatable {
                        match lists.iter_mut().find(|(k, _)| k == key) {
                            Some((_, values)) => values.push(value),
                            None => lists.push((*key, vec![value])),
                        }
                    } else {
                        tree.insert(key.to_string(), RawProperty::Text(value));
                    }
                }
            }
        }

        pos += length;
    }

    for (key, values) in lists {
        tree.insert(key.to_string(), RawProperty::Texts(values));
    }
    tree
}

/// Locate resource 0x0404 among the 8BIM blocks.
///
/// Each resource: "8BIM" (4) + id (2) + pascal name padded to even + size (4) + data.
fn find_iptc_resource(segment: &[u8]) -> Option<&[u8]> {
    let data = segment.strip_prefix(PHOTOSHOP_HEADER).unwrap_or(segment);

    let mut pos = 0;
    while pos + 12 <= data.len() {
        if &data[pos..pos + 4] != BIM_MARKER {
            pos += 1;
            continue;
        }
        pos += 4;

        let resource_id = u16::from_be_bytes([data[pos], data[pos + 1]]);
        pos += 2;

        let pascal_len = data[pos] as usize;
        pos += 1 + pascal_len + ((1 + pascal_len) % 2);

        if pos + 4 > data.len() {
            break;
        }
        let res_len =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        pos += 4;

        if pos + res_len > data.len() {
            break;
        }
        if resource_id == IPTC_RESOURCE_ID {
            return Some(&data[pos..pos + res_len]);
        }

        // Resource data is padded to even length
        pos += res_len + (res_len % 2);
    }
    None
}
