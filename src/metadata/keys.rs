//! Field identifiers and display catalogs.
//!
//! Identifiers follow the naming used by common image-metadata libraries:
//! group sub-trees are braced (`{Exif}`, `{GPS}`), everything else is a
//! plain CamelCase field name.

// Known groups
pub const EXIF: &str = "{Exif}";
pub const TIFF: &str = "{TIFF}";
pub const GPS: &str = "{GPS}";
pub const IPTC: &str = "{IPTC}";
pub const JFIF: &str = "{JFIF}";
pub const PNG: &str = "{PNG}";

// Top-level scalars
pub const PIXEL_WIDTH: &str = "PixelWidth";
pub const PIXEL_HEIGHT: &str = "PixelHeight";
pub const DPI_WIDTH: &str = "DPIWidth";
pub const DPI_HEIGHT: &str = "DPIHeight";
pub const COLOR_MODEL: &str = "ColorModel";
pub const DEPTH: &str = "Depth";
pub const ORIENTATION: &str = "Orientation";
pub const PROFILE_NAME: &str = "ProfileName";

// GPS fields
pub const GPS_VERSION: &str = "GPSVersion";
pub const GPS_LATITUDE: &str = "Latitude";
pub const GPS_LATITUDE_REF: &str = "LatitudeRef";
pub const GPS_LONGITUDE: &str = "Longitude";
pub const GPS_LONGITUDE_REF: &str = "LongitudeRef";

// EXIF fields
pub const EXIF_VERSION: &str = "ExifVersion";
pub const FLASHPIX_VERSION: &str = "FlashPixVersion";
pub const LENS_SPECIFICATION: &str = "LensSpecification";

// JFIF fields
pub const JFIF_VERSION: &str = "JFIFVersion";

/// Title of the section holding top-level fields.
pub const GENERAL_TITLE: &str = "General Image Info";

/// Known groups and their section titles, in display order.
pub const KNOWN_GROUPS: &[(&str, &str)] = &[
    (EXIF, "EXIF Details"),
    (TIFF, "TIFF Properties"),
    (GPS, "GPS Data"),
    (IPTC, "IPTC Information"),
    (JFIF, "JFIF Properties"),
    (PNG, "PNG Properties"),
];

/// Top-level fields shown under curated names.
pub const GENERAL_FIELDS: &[(&str, &str)] = &[
    (PIXEL_WIDTH, "Pixel Width"),
    (PIXEL_HEIGHT, "Pixel Height"),
    (DPI_WIDTH, "DPI Width"),
    (DPI_HEIGHT, "DPI Height"),
    (COLOR_MODEL, "Color Model"),
    (DEPTH, "Depth"),
    (ORIENTATION, "Orientation"),
    (PROFILE_NAME, "Color Profile"),
];

pub fn is_known_group(key: &str) -> bool {
    KNOWN_GROUPS.iter().any(|(k, _)| *k == key)
}

pub fn is_general_field(key: &str) -> bool {
    GENERAL_FIELDS.iter().any(|(k, _)| *k == key)
}
