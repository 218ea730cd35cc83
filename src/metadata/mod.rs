//! Metadata normalization: raw property trees in, display sections out.
//!
//! - [`format_value`] — render one raw value, honoring field-specific encodings
//! - [`build_sections`] — group, sort and title a whole property tree
//! - [`FileStats`] / [`GpsCoordinates`] — derived file and location information

mod format;
mod gps;
pub mod keys;
mod model;
mod normalize;
mod stats;
mod value;

pub use format::{FIELD_STRATEGIES, FieldStrategy, field_strategy, format_number, format_value};
pub use gps::GpsCoordinates;
pub use model::{MetadataEntry, MetadataResult, MetadataSection};
pub use normalize::{build_sections, gps_coordinates, pixel_dimensions};
pub use stats::{FileStats, format_file_size, format_pixel_count, type_label};
pub use value::{PropertyTree, RawProperty};
