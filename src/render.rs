//! Plain-text rendering of sections, the format used for copying to the
//! clipboard or piping into other tools.

use crate::metadata::MetadataSection;

/// `[title]` followed by one `key: value` line per entry.
pub fn section_text(section: &MetadataSection) -> String {
    let mut out = format!("[{}]\n", section.title());
    for entry in section.entries() {
        out.push_str(entry.key());
        out.push_str(": ");
        out.push_str(entry.value());
        out.push('\n');
    }
    out
}

/// All sections, separated by a blank line.
pub fn report_text(sections: &[MetadataSection]) -> String {
    sections
        .iter()
        .map(section_text)
        .collect::<Vec<_>>()
        .join("\n")
}
