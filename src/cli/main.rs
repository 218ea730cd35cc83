use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use exif_lens::config::Config;
use exif_lens::metadata::{GpsCoordinates, MetadataResult};
use exif_lens::pipeline::{self, Extractor};
use exif_lens::source::FileSource;

#[derive(Parser, Debug)]
#[command(
    name = "exif-lens",
    version,
    about = "Show the metadata of images and videos as readable, sorted sections"
)]
struct Cli {
    /// Image/video files or directories to inspect
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: exif-lens.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default exif-lens.json and exit
    #[arg(long)]
    init: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output (logs every field as it is formatted)
    #[arg(short, long)]
    verbose: bool,

    /// Show GPS coordinates in every notation, with map links
    #[arg(long)]
    coords: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let path = Config::default().save(cli.config.as_deref())?;
        println!("Default config written to {}", path.display());
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.verbose {
        config.extraction.debug = true;
    }
    if cli.coords {
        config.display.show_coordinates = true;
    }

    let files = pipeline::collect_files(&cli.paths);
    if files.is_empty() {
        anyhow::bail!("No supported image or video files found in the specified paths.");
    }
    log::info!("Found {} file(s) to inspect", files.len());

    let extractor = Extractor::with_options(FileSource::new(), config.extraction);
    let results: Vec<MetadataResult> = files.iter().map(|p| extractor.extract(p)).collect();

    if cli.json {
        let json_results: Vec<serde_json::Value> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "file": r.file_stats,
                    "aspect_ratio": r.file_stats.aspect_ratio(),
                    "dimensions": r.file_stats.dimensions_display(),
                    "sections": r.sections,
                    "gps": r.gps_coordinates,
                    "error": r.error_message,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_results)?);
    } else {
        for result in &results {
            print_result(result, &config);
        }
    }

    let failed = results.iter().filter(|r| r.error_message.is_some()).count();
    log::info!(
        "Done: {} read, {failed} with errors out of {} files",
        results.len() - failed,
        results.len()
    );

    Ok(())
}

// ANSI color codes
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Width of the key column.
const TAG_WIDTH: usize = 28;
/// Narrowest value column, whatever the configured wrap width.
const MIN_VAL_WIDTH: usize = 20;

/// Print one file: stats, sections, then coordinates.
fn print_result(result: &MetadataResult, config: &Config) {
    let display = &config.display;
    let val_width = display
        .wrap_width
        .saturating_sub(TAG_WIDTH + 5)
        .max(MIN_VAL_WIDTH);
    let rule_width = TAG_WIDTH + 3 + val_width;
    let stats = &result.file_stats;

    println!();
    println!("{BOLD}File:{RESET} {}", stats.path);
    println!("{DIM}{}{RESET}", "═".repeat(rule_width + 2));

    if display.show_file_stats {
        print_heading("File Info", rule_width);
        print_row("Name", &stats.name, val_width);
        print_row("Size", &stats.formatted_size, val_width);
        print_row("Type", &stats.mime_type_label, val_width);
        if let Some(dims) = stats.dimensions_display() {
            print_row("Dimensions", &dims, val_width);
        }
        println!();
    }

    if let Some(ref err) = result.error_message {
        for line in err.lines() {
            println!("  {RED}{line}{RESET}");
        }
        println!();
    }

    for section in &result.sections {
        print_heading(section.title(), rule_width);
        for entry in section.entries() {
            print_row(entry.key(), entry.value(), val_width);
        }
        println!();
    }

    if display.show_coordinates {
        if let Some(ref gps) = result.gps_coordinates {
            print_coordinates(gps, rule_width, val_width);
        }
    }

    if result.sections.is_empty() && result.error_message.is_none() {
        println!("  {DIM}(no metadata found){RESET}");
        println!();
    }
}

fn print_coordinates(gps: &GpsCoordinates, rule_width: usize, val_width: usize) {
    print_heading("Coordinates", rule_width);
    print_row("Decimal", &gps.decimal_string(), val_width);
    print_row("DMS", &gps.dms_string(), val_width);
    print_row("DDM", &gps.ddm_string(), val_width);
    print_row("Apple Maps", &gps.apple_maps_url(), val_width);
    print_row("Google Maps", &gps.google_maps_url(), val_width);
    println!();
}

fn print_heading(title: &str, rule_width: usize) {
    println!("  {BOLD}{title}{RESET}");
    println!("  {DIM}{}{RESET}", "─".repeat(rule_width));
}

/// Print a single row in the metadata table.
///
/// Multi-line values keep their line breaks; every line wraps on its own.
fn print_row(tag: &str, val: &str, val_width: usize) {
    let tag_col = format!("{:<width$}", tag, width = TAG_WIDTH);
    let indent = " ".repeat(TAG_WIDTH + 3);
    let lines: Vec<String> = val
        .lines()
        .flat_map(|line| wrap_text(line, val_width))
        .collect();

    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {indent}{line}");
        }
    }
    if lines.is_empty() {
        println!("  {tag_col} :");
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.chars().count() + 1 + word.chars().count() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
