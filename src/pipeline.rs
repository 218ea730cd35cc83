use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::metadata::{self, FileStats, MetadataResult};
use crate::source::{FileSource, MetadataSource};

/// Supported file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    // Still images
    "jpg", "jpeg", "jpe", "png", "gif", "webp", "tif", "tiff", "bmp",
    // HEIF family
    "heic", "heif", "avif",
    // RAW formats
    "cr3", "cr2", "dng", "nef", "arw", "raf", "orf", "rw2",
    // Video containers (track metadata)
    "mp4", "m4v", "mov", "qt", "3gp", "mkv", "webm",
];

/// Per-call extraction options.
///
/// # Example
///
/// ```rust
/// use exif_lens::pipeline::{ExtractOptions, Extractor};
/// use exif_lens::source::FileSource;
///
/// let extractor = Extractor::with_options(FileSource::new(), ExtractOptions { debug: true });
/// assert!(extractor.options().debug);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Log every field as it is formatted.
    pub debug: bool,
}

/// Turns files into [`MetadataResult`]s using a [`MetadataSource`].
///
/// Holds no mutable state; one extractor may serve concurrent calls.
#[derive(Debug, Clone)]
pub struct Extractor<S> {
    source: S,
    options: ExtractOptions,
}

impl<S: MetadataSource> Extractor<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, ExtractOptions::default())
    }

    pub fn with_options(source: S, options: ExtractOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> ExtractOptions {
        self.options
    }

    /// Extract and normalize the metadata of one file.
    ///
    /// Never fails. Problems reading the file or its attributes end up in
    /// [`MetadataResult::error_message`], one line per failed stage.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use exif_lens::pipeline::Extractor;
    /// use exif_lens::source::FileSource;
    ///
    /// let result = Extractor::new(FileSource::new()).extract("photo.jpg".as_ref());
    /// match &result.error_message {
    ///     Some(err) => eprintln!("{err}"),
    ///     None => {
    ///         for section in &result.sections {
    ///             println!("{} ({} fields)", section.title(), section.entries().len());
    ///         }
    ///     }
    /// }
    /// ```
    pub fn extract(&self, path: &Path) -> MetadataResult {
        let mut diagnostics = Vec::new();

        let tree = match self.source.read_properties(path) {
            Ok(Some(tree)) => Some(tree),
            Ok(None) => {
                log::warn!("No image properties in {}", path.display());
                diagnostics.push("Could not get image properties.".to_string());
                None
            }
            Err(e) => {
                log::warn!("Could not read {}: {e:#}", path.display());
                diagnostics.push(format!("Could not create image source: {e:#}"));
                None
            }
        };

        let (width, height) = tree
            .as_ref()
            .map(metadata::pixel_dimensions)
            .unwrap_or((None, None));
        let (file_stats, stats_error) = FileStats::collect(path, width, height);
        diagnostics.extend(stats_error);

        let (sections, gps_coordinates) = match &tree {
            Some(tree) => (
                metadata::build_sections(tree, self.options.debug),
                metadata::gps_coordinates(tree),
            ),
            None => (Vec::new(), None),
        };

        if self.options.debug {
            log::debug!(
                "{}: {} sections, {} diagnostics",
                path.display(),
                sections.len(),
                diagnostics.len()
            );
        }

        MetadataResult {
            file_stats,
            sections,
            error_message: (!diagnostics.is_empty()).then(|| diagnostics.join("\n")),
            gps_coordinates,
        }
    }
}

/// Extract metadata from a file on disk with default options.
pub fn extract(path: &Path) -> MetadataResult {
    Extractor::new(FileSource::new()).extract(path)
}

/// Collect supported files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks). Only files with supported image or
/// video extensions are included.
///
/// # Example
///
/// ```rust,no_run
/// use exif_lens::pipeline::collect_files;
/// use std::path::PathBuf;
///
/// let files = collect_files(&[
///     PathBuf::from("photo.jpg"),       // single file
///     PathBuf::from("./photos/"),        // entire directory
/// ]);
/// println!("Found {} files", files.len());
/// ```
pub fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_file(path) {
                files.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_file(p) {
                    files.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    files
}

/// Check if a file has a supported extension.
fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
