use anyhow::Result;
use exif_lens::metadata::{PropertyTree, RawProperty, keys};
use exif_lens::pipeline::{self, ExtractOptions, Extractor};
use exif_lens::render::report_text;
use exif_lens::source::MetadataSource;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Serves the same tree for every path.
struct TreeSource(Option<PropertyTree>);

impl MetadataSource for TreeSource {
    fn read_properties(&self, _path: &Path) -> Result<Option<PropertyTree>> {
        Ok(self.0.clone())
    }
}

fn group(pairs: Vec<(&str, RawProperty)>) -> RawProperty {
    RawProperty::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

fn camera_tree() -> PropertyTree {
    let mut tree = PropertyTree::new();
    tree.insert(keys::PIXEL_WIDTH.into(), RawProperty::Integer(1920));
    tree.insert(keys::PIXEL_HEIGHT.into(), RawProperty::Integer(1080));
    tree.insert(keys::PROFILE_NAME.into(), "sRGB IEC61966-2.1".into());
    tree.insert(
        keys::PNG.into(),
        group(vec![("Software", "exif-lens test".into())]),
    );
    tree.insert(
        keys::GPS.into(),
        group(vec![
            ("GPSVersion", RawProperty::Integers(vec![2, 3, 0, 0])),
            ("Latitude", 37.7749.into()),
            ("LatitudeRef", "S".into()),
            ("Longitude", 122.4194.into()),
            ("LongitudeRef", "W".into()),
        ]),
    );
    tree.insert(
        keys::EXIF.into(),
        group(vec![
            ("ExifVersion", b"0231".to_vec().into()),
            ("LensSpecification", vec![50.0f64, 50.0, 1.8, 1.8].into()),
            ("MakerNote", vec![0xFFu8, 0xD8, 0xFF, 0xE0].into()),
            ("FNumber", 1.8.into()),
        ]),
    );
    tree
}

fn scratch(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, vec![0u8; 1500]).unwrap();
    path
}

// ── sections ─────────────────────────────────────────────────────────

#[test]
fn sections_follow_catalog_order() {
    let dir = TempDir::new().unwrap();
    let path = scratch(&dir, "IMG_1234.JPG");

    let result = Extractor::new(TreeSource(Some(camera_tree()))).extract(&path);
    let titles: Vec<&str> = result.sections.iter().map(|s| s.title()).collect();
    assert_eq!(
        titles,
        vec!["General Image Info", "EXIF Details", "GPS Data", "PNG Properties"]
    );

    for section in &result.sections {
        let keys: Vec<&str> = section.entries().iter().map(|e| e.key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted, "{} is not sorted", section.title());
    }
}

#[test]
fn field_values_are_formatted() {
    let dir = TempDir::new().unwrap();
    let path = scratch(&dir, "IMG_1234.JPG");

    let result = Extractor::new(TreeSource(Some(camera_tree()))).extract(&path);
    let exif = result.section("EXIF Details").unwrap();
    assert_eq!(exif.get("ExifVersion"), Some("2.31"));
    assert_eq!(exif.get("LensSpecification"), Some("50mm f/1.8"));
    assert_eq!(exif.get("MakerNote"), Some("4 bytes"));
    assert_eq!(exif.get("FNumber"), Some("1.8"));

    let gps = result.section("GPS Data").unwrap();
    assert_eq!(gps.get("GPSVersion"), Some("2.3.0.0"));

    let general = result.section("General Image Info").unwrap();
    assert_eq!(general.get("Color Profile"), Some("sRGB IEC61966-2.1"));
    assert_eq!(general.get("Pixel Width"), Some("1920"));
}

// ── stats and coordinates ────────────────────────────────────────────

#[test]
fn stats_and_coordinates() {
    let dir = TempDir::new().unwrap();
    let path = scratch(&dir, "IMG_1234.JPG");

    let result = Extractor::new(TreeSource(Some(camera_tree()))).extract(&path);
    let stats = &result.file_stats;
    assert_eq!(stats.name, "IMG_1234.JPG");
    assert_eq!(stats.formatted_size, "2 KB");
    assert_eq!(stats.mime_type_label, "JPEG image");
    assert_eq!(
        stats.dimensions_display().as_deref(),
        Some("1920 x 1080 pixels (16:9), 2.1M pixels")
    );

    let gps = result.gps_coordinates.unwrap();
    assert_eq!(gps.latitude, -37.7749);
    assert_eq!(gps.longitude, -122.4194);
    assert_eq!(gps.decimal_string(), "-37.774900, -122.419400");
}

// ── failures ─────────────────────────────────────────────────────────

#[test]
fn missing_properties_still_report_stats() {
    let dir = TempDir::new().unwrap();
    let path = scratch(&dir, "scan.tiff");

    let result = Extractor::new(TreeSource(None)).extract(&path);
    assert!(result.sections.is_empty());
    assert!(result.error_message.is_some());
    assert!(result.gps_coordinates.is_none());
    assert_eq!(result.file_stats.formatted_size, "2 KB");
    assert_eq!(result.file_stats.pixel_width, None);
    assert_eq!(result.file_stats.dimensions_display(), None);
}

#[test]
fn unreadable_file_through_file_source() {
    let result = pipeline::extract(Path::new("/nonexistent/dir/photo.jpg"));
    assert!(result.sections.is_empty());
    assert_eq!(result.file_stats.formatted_size, "N/A");
    let message = result.error_message.unwrap();
    assert!(message.starts_with("Could not create image source"));
    assert_eq!(message.lines().count(), 2);
}

// ── determinism ──────────────────────────────────────────────────────

#[test]
fn extraction_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = scratch(&dir, "IMG_1234.JPG");
    let extractor = Extractor::with_options(
        TreeSource(Some(camera_tree())),
        ExtractOptions { debug: true },
    );

    let first = extractor.extract(&path);
    let second = extractor.extract(&path);
    assert_eq!(first, second);
    assert_eq!(report_text(&first.sections), report_text(&second.sections));
}

// ── real files ───────────────────────────────────────────────────────

#[test]
fn generated_png_through_file_source() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tiny.png");
    image::RgbImage::new(4, 2).save(&path).unwrap();

    let result = pipeline::extract(&path);
    assert!(result.error_message.is_none(), "{:?}", result.error_message);

    let general = result.section("General Image Info").unwrap();
    assert_eq!(general.get("Pixel Width"), Some("4"));
    assert_eq!(general.get("Pixel Height"), Some("2"));
    assert_eq!(general.get("Color Model"), Some("RGB"));
    assert_eq!(general.get("Depth"), Some("8"));

    let png = result.section("PNG Properties").unwrap();
    assert_eq!(png.get("InterlaceType"), Some("0"));

    assert_eq!(result.file_stats.aspect_ratio().as_deref(), Some("2:1"));
    assert_eq!(result.file_stats.mime_type_label, "PNG image");
}

#[test]
fn collect_then_extract_directory() {
    let dir = TempDir::new().unwrap();
    image::RgbImage::new(3, 3).save(dir.path().join("a.png")).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();

    let files = pipeline::collect_files(&[dir.path().to_path_buf()]);
    assert_eq!(files.len(), 1);

    let result = pipeline::extract(&files[0]);
    assert_eq!(result.file_stats.aspect_ratio().as_deref(), Some("1:1"));
}
