//! Property tree → sorted, titled sections.

use std::collections::BTreeSet;

use super::format::format_value;
use super::gps::GpsCoordinates;
use super::keys;
use super::model::{MetadataEntry, MetadataSection};
use super::value::{PropertyTree, RawProperty};

/// Build the display sections for a property tree.
///
/// "General Image Info" comes first, then each known group in catalog
/// order. Sections without entries are left out. With `debug` set, every
/// group field is logged as it is formatted.
pub fn build_sections(tree: &PropertyTree, debug: bool) -> Vec<MetadataSection> {
    let mut sections = Vec::new();

    let general = general_section(tree);
    if !general.is_empty() {
        sections.push(general);
    }

    for (group_key, title) in keys::KNOWN_GROUPS {
        let Some(RawProperty::Map(group)) = tree.get(*group_key) else {
            continue;
        };
        if group.is_empty() {
            continue;
        }

        let entries = group
            .iter()
            .map(|(key, value)| {
                if debug {
                    log::debug!("Processing key {key} (Group: {title})");
                }
                MetadataEntry::new(key.as_str(), format_value(value, group_key, key))
            })
            .collect();

        let section = MetadataSection::new(*title, entries);
        if !section.is_empty() {
            sections.push(section);
        }
    }

    sections
}

/// Allow-listed top-level fields under their curated names, plus every
/// other top-level scalar under its raw identifier.
fn general_section(tree: &PropertyTree) -> MetadataSection {
    let mut entries = Vec::new();
    let mut emitted: BTreeSet<String> = BTreeSet::new();

    for (key, display_name) in keys::GENERAL_FIELDS {
        if let Some(value) = tree.get(*key) {
            entries.push(MetadataEntry::new(*display_name, format_value(value, key, key)));
            emitted.insert(display_name.to_string());
        }
    }

    for (key, value) in tree {
        if keys::is_known_group(key)
            || keys::is_general_field(key)
            || value.is_map()
            || emitted.contains(key)
        {
            continue;
        }
        entries.push(MetadataEntry::new(key.as_str(), format_value(value, key, key)));
        emitted.insert(key.clone());
    }

    MetadataSection::new(keys::GENERAL_TITLE, entries)
}

/// `PixelWidth` and `PixelHeight`, when present as non-negative integers.
pub fn pixel_dimensions(tree: &PropertyTree) -> (Option<u32>, Option<u32>) {
    let dimension = |key: &str| {
        tree.get(key)
            .and_then(RawProperty::as_i64)
            .and_then(|v| u32::try_from(v).ok())
    };
    (dimension(keys::PIXEL_WIDTH), dimension(keys::PIXEL_HEIGHT))
}

/// Coordinates from the raw GPS group, whether or not it is displayed.
pub fn gps_coordinates(tree: &PropertyTree) -> Option<GpsCoordinates> {
    tree.get(keys::GPS)
        .and_then(RawProperty::as_map)
        .and_then(GpsCoordinates::from_gps_group)
}
