use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Standard aspect ratios (width:height), checked in order.
const STANDARD_RATIOS: &[(&str, u32, u32)] = &[
    ("1:1", 1, 1),
    ("5:4", 5, 4),
    ("4:3", 4, 3),
    ("3:2", 3, 2),
    ("16:10", 16, 10),
    ("5:3", 5, 3),
    ("16:9", 16, 9),
    ("2:1", 2, 1),
    ("21:9", 21, 9),
    // Portrait
    ("4:5", 4, 5),
    ("3:4", 3, 4),
    ("2:3", 2, 3),
    ("10:16", 10, 16),
    ("3:5", 3, 5),
    ("9:16", 9, 16),
    ("1:2", 1, 2),
    ("9:21", 9, 21),
];

/// Relative tolerance when matching a standard ratio.
const RATIO_TOLERANCE: f64 = 0.01;

/// Reduced ratios with a term above this are shown as `N.NN:1`.
const MAX_REDUCED_TERM: u32 = 100;

/// Extension → human-readable type description.
const TYPE_LABELS: &[(&[&str], &str)] = &[
    (&["jpg", "jpeg", "jpe"], "JPEG image"),
    (&["png"], "PNG image"),
    (&["gif"], "GIF image"),
    (&["webp"], "WebP image"),
    (&["tif", "tiff"], "TIFF image"),
    (&["heic"], "HEIC image"),
    (&["heif"], "HEIF image"),
    (&["avif"], "AVIF image"),
    (&["bmp"], "Windows bitmap image"),
    (&["dng"], "Adobe raw image"),
    (&["cr2", "cr3"], "Canon raw image"),
    (&["nef"], "Nikon raw image"),
    (&["arw"], "Sony raw image"),
    (&["raf"], "Fujifilm raw image"),
    (&["orf"], "Olympus raw image"),
    (&["rw2"], "Panasonic raw image"),
    (&["mp4", "m4v"], "MPEG-4 movie"),
    (&["mov", "qt"], "QuickTime movie"),
    (&["3gp"], "3GPP movie"),
    (&["mkv"], "Matroska video"),
    (&["webm"], "WebM video"),
];

/// File information shown alongside the metadata sections.
///
/// Built once per extraction. [`aspect_ratio`](Self::aspect_ratio) and
/// [`dimensions_display`](Self::dimensions_display) are derived on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub name: String,
    pub path: String,
    pub formatted_size: String,
    pub mime_type_label: String,
    pub pixel_width: Option<u32>,
    pub pixel_height: Option<u32>,
}

impl FileStats {
    /// Gather stats for `path` from the filesystem.
    ///
    /// Never fails: when the attributes cannot be read the size is `"N/A"`
    /// and the returned diagnostic says why.
    pub fn collect(
        path: &Path,
        pixel_width: Option<u32>,
        pixel_height: Option<u32>,
    ) -> (Self, Option<String>) {
        let (formatted_size, diagnostic) = match file_size(path) {
            Ok(size) => (format_file_size(size), None),
            Err(e) => {
                log::warn!("{e:#}");
                ("N/A".to_string(), Some(format!("{e:#}")))
            }
        };

        let stats = Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.display().to_string(),
            formatted_size,
            mime_type_label: type_label(path).to_string(),
            pixel_width,
            pixel_height,
        };
        (stats, diagnostic)
    }

    /// Aspect ratio such as `16:9`, or `None` without positive dimensions.
    pub fn aspect_ratio(&self) -> Option<String> {
        let (w, h) = (self.pixel_width?, self.pixel_height?);
        if w == 0 || h == 0 {
            return None;
        }

        let actual = f64::from(w) / f64::from(h);
        for (name, sw, sh) in STANDARD_RATIOS {
            let standard = f64::from(*sw) / f64::from(*sh);
            if (actual - standard).abs() / standard < RATIO_TOLERANCE {
                return Some(name.to_string());
            }
        }

        let divisor = gcd(w, h);
        let (rw, rh) = (w / divisor, h / divisor);
        if rw > MAX_REDUCED_TERM || rh > MAX_REDUCED_TERM {
            return Some(format!("{actual:.2}:1"));
        }
        Some(format!("{rw}:{rh}"))
    }

    /// `1920 x 1080 pixels (16:9), 2.1M pixels`
    pub fn dimensions_display(&self) -> Option<String> {
        let (w, h) = (self.pixel_width?, self.pixel_height?);
        let mut out = format!("{w} x {h} pixels");
        if let Some(ratio) = self.aspect_ratio() {
            out.push_str(&format!(" ({ratio})"));
        }
        out.push_str(", ");
        out.push_str(&format_pixel_count(u64::from(w) * u64::from(h)));
        Some(out)
    }
}

fn file_size(path: &Path) -> Result<u64> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Could not read file attributes of {}", path.display()))?;
    Ok(meta.len())
}

/// Type description derived from the file extension, `"Unknown"` otherwise.
pub fn type_label(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    TYPE_LABELS
        .iter()
        .find(|(exts, _)| exts.contains(&ext.as_str()))
        .map(|(_, label)| *label)
        .unwrap_or("Unknown")
}

/// File size in decimal units: `Zero KB`, `512 bytes`, `34 KB`, `2.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1_000.0;
    const MB: f64 = 1_000_000.0;
    const GB: f64 = 1_000_000_000.0;
    const TB: f64 = 1_000_000_000_000.0;

    let b = bytes as f64;
    match bytes {
        0 => "Zero KB".to_string(),
        1 => "1 byte".to_string(),
        n if n < 1_000 => format!("{n} bytes"),
        _ if b < MB => format!("{} KB", trim_zeros(format!("{:.0}", b / KB))),
        _ if b < GB => format!("{} MB", trim_zeros(format!("{:.1}", b / MB))),
        _ if b < TB => format!("{} GB", trim_zeros(format!("{:.2}", b / GB))),
        _ => format!("{} TB", trim_zeros(format!("{:.2}", b / TB))),
    }
}

/// Total pixel count: `640 pixels`, `307K pixels`, `2.1M pixels`, `1.2G pixels`.
pub fn format_pixel_count(total: u64) -> String {
    let t = total as f64;
    if t >= 1_000_000_000.0 {
        format!("{:.1}G pixels", t / 1_000_000_000.0)
    } else if t >= 1_000_000.0 {
        format!("{:.1}M pixels", t / 1_000_000.0)
    } else if t >= 1_000.0 {
        format!("{:.0}K pixels", t / 1_000.0)
    } else {
        format!("{total} pixels")
    }
}

fn trim_zeros(s: String) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
