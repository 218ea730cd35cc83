//! # exif-lens
//!
//! Read the metadata of an image or video file and turn it into titled,
//! sorted, human-readable sections: general image info, EXIF, TIFF, GPS,
//! IPTC, JFIF and PNG properties, plus file statistics and GPS coordinates.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exif_lens::pipeline::{collect_files, extract};
//! use exif_lens::render::report_text;
//! use std::path::PathBuf;
//!
//! for path in collect_files(&[PathBuf::from("./photos")]) {
//!     let result = extract(&path);
//!
//!     if let Some(ref err) = result.error_message {
//!         eprintln!("{}: {err}", path.display());
//!         continue;
//!     }
//!     println!("{} ({})", result.file_stats.name, result.file_stats.formatted_size);
//!     if let Some(dims) = result.file_stats.dimensions_display() {
//!         println!("{dims}");
//!     }
//!     print!("{}", report_text(&result.sections));
//! }
//! ```
//!
//! ## Custom Sources
//!
//! Normalization only needs a raw property tree. Anything implementing
//! [`source::MetadataSource`] can feed the [`pipeline::Extractor`]:
//!
//! ```rust
//! use exif_lens::metadata::{PropertyTree, RawProperty, keys};
//! use exif_lens::pipeline::Extractor;
//! use exif_lens::source::MetadataSource;
//! use std::path::Path;
//!
//! struct Fixed;
//!
//! impl MetadataSource for Fixed {
//!     fn read_properties(&self, _: &Path) -> anyhow::Result<Option<PropertyTree>> {
//!         let mut gps = PropertyTree::new();
//!         gps.insert("GPSVersion".into(), RawProperty::Integers(vec![2, 3, 0, 0]));
//!         let mut tree = PropertyTree::new();
//!         tree.insert(keys::GPS.into(), RawProperty::Map(gps));
//!         Ok(Some(tree))
//!     }
//! }
//!
//! let result = Extractor::new(Fixed).extract(Path::new("any.jpg"));
//! let gps = result.section("GPS Data").unwrap();
//! assert_eq!(gps.get("GPSVersion"), Some("2.3.0.0"));
//! ```
//!
//! ## Modules
//!
//! - [`config`] — Configuration types and loading/saving
//! - [`metadata`] — Raw values, value formatting, sections, file stats and GPS
//! - [`pipeline`] — Extraction entry points and file collection
//! - [`render`] — Plain-text report output
//! - [`source`] — Metadata sources (`FileSource` reads files via `image`, `nom-exif` and `img-parts`)

pub mod config;
pub mod metadata;
pub mod pipeline;
pub mod render;
pub mod source;
