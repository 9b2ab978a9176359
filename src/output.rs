//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output leads with what the site shows (display names, categories, folder
//! names as they appear in the bucket) and adds keys, URLs, and file paths as
//! indented context lines. A display name is only followed by its folder when
//! the two differ, so a clean mapping reads as a plain list.
//!
//! # Output Format
//!
//! ## Index
//!
//! ```text
//! Folders
//! 001 ABI (2 photos)
//! 002 STREET SOUK 23’ (14 photos)
//!
//! Wrote dist/portfolio-index.json (2 folders, 16 photos)
//! ```
//!
//! ## Upload
//!
//! ```text
//! Uploading 3 files
//! [001/003] css/style.css OK
//! [002/003] index.html OK
//! [003/003] js/app.js FAIL (put js/app.js failed: access denied)
//!
//! Completed. Uploaded: 2, Failed: 1
//! ```
//!
//! ## Catalog
//!
//! ```text
//! brandcampaignshoot (2)
//!     001 Asabi Pilot → ABI
//!     002 GUNNA
//! event (1)
//!     001 STREET SOUK 23' → STREET SOUK 23’
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::resolve::{Catalog, FeaturedItem, Gallery, MappingReport};
use crate::types::PortfolioIndex;
use crate::upload::{UploadEvent, UploadSummary};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn photos(n: usize) -> String {
    if n == 1 {
        "1 photo".to_string()
    } else {
        format!("{n} photos")
    }
}

/// `[004/120]`, padded to the width of the total.
fn progress(index: usize, total: usize) -> String {
    let width = total.to_string().len().max(3);
    format!("[{index:0>width$}/{total:0>width$}]")
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Index
// ============================================================================

pub fn format_index_output(index: &PortfolioIndex, written_to: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let mut total = 0;

    if index.folders.is_empty() {
        lines.push("No image folders found".to_string());
    } else {
        lines.push("Folders".to_string());
        for (pos, (folder, files)) in index.folders.iter().enumerate() {
            total += files.len();
            lines.push(format!(
                "{} {} ({})",
                format_index(pos + 1),
                folder,
                photos(files.len())
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Wrote {} ({} folders, {})",
        written_to.display(),
        index.folders.len(),
        photos(total)
    ));
    lines
}

pub fn print_index_output(index: &PortfolioIndex, written_to: &Path) {
    print_lines(format_index_output(index, written_to));
}

// ============================================================================
// Upload
// ============================================================================

/// Format a single upload progress event as display lines.
pub fn format_upload_event(event: &UploadEvent) -> Vec<String> {
    match event {
        UploadEvent::Started { total: 0 } => vec!["Nothing to upload".to_string()],
        UploadEvent::Started { total: 1 } => vec!["Uploading 1 file".to_string()],
        UploadEvent::Started { total } => vec![format!("Uploading {total} files")],
        UploadEvent::Uploaded {
            index, total, key, ..
        } => vec![format!("{} {} OK", progress(*index, *total), key)],
        UploadEvent::Failed {
            index,
            total,
            key,
            message,
        } => vec![format!("{} {} FAIL ({})", progress(*index, *total), key, message)],
    }
}

/// Final tally. Empty when nothing was attempted.
pub fn format_upload_summary(summary: &UploadSummary) -> Vec<String> {
    if summary.uploaded == 0 && summary.failed.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![
        String::new(),
        format!(
            "Completed. Uploaded: {}, Failed: {}",
            summary.uploaded,
            summary.failed.len()
        ),
    ];
    for failure in &summary.failed {
        lines.push(format!("{}{}", indent(1), failure.key));
    }
    lines
}

pub fn print_upload_summary(summary: &UploadSummary) {
    print_lines(format_upload_summary(summary));
}

// ============================================================================
// Catalog
// ============================================================================

pub fn format_catalog(catalog: &Catalog) -> Vec<String> {
    let mut lines = Vec::new();
    for group in &catalog.categories {
        lines.push(format!("{} ({})", group.id, group.display_names.len()));
        for (pos, name) in group.display_names.iter().enumerate() {
            let header = format!("{}{} {}", indent(1), format_index(pos + 1), name);
            match catalog.folder_for(name) {
                Some(folder) if folder != name => lines.push(format!("{header} → {folder}")),
                _ => lines.push(header),
            }
        }
    }
    lines
}

pub fn print_catalog(catalog: &Catalog) {
    print_lines(format_catalog(catalog));
}

// ============================================================================
// Gallery and featured items
// ============================================================================

pub fn format_gallery(gallery: &Gallery) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({})",
        gallery.folder,
        photos(gallery.images.len())
    )];
    for (pos, image) in gallery.images.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(1), format_index(pos + 1), image.filename));
        lines.push(format!("{}URL: {}", indent(2), image.url));
    }
    lines
}

pub fn print_gallery(gallery: &Gallery) {
    print_lines(format_gallery(gallery));
}

pub fn format_featured(items: &[FeaturedItem]) -> Vec<String> {
    if items.is_empty() {
        return vec!["No featured items".to_string()];
    }
    let mut lines = Vec::new();
    for (pos, item) in items.iter().enumerate() {
        lines.push(format!("{} {} → {}", format_index(pos + 1), item.alt, item.href));
        lines.push(format!("{}Image: {}", indent(1), item.image_url));
    }
    lines
}

pub fn print_featured(items: &[FeaturedItem]) {
    print_lines(format_featured(items));
}

// ============================================================================
// Mapping check
// ============================================================================

pub fn format_check(report: &MappingReport) -> Vec<String> {
    if report.is_clean() {
        return vec!["Mapping matches the bucket".to_string()];
    }
    let mut lines = Vec::new();
    if !report.stale.is_empty() {
        lines.push("Stale mapping entries (no bucket folder)".to_string());
        lines.extend(report.stale.iter().map(|f| format!("{}{}", indent(1), f)));
    }
    if !report.unmapped.is_empty() {
        lines.push("Unmapped folders".to_string());
        lines.extend(report.unmapped.iter().map(|f| format!("{}{}", indent(1), f)));
    }
    if !report.undeclared_categories.is_empty() {
        lines.push("Undeclared categories (shown under the first category)".to_string());
        lines.extend(
            report
                .undeclared_categories
                .iter()
                .map(|(folder, category)| format!("{}{}: {}", indent(1), folder, category)),
        );
    }
    if !report.shadowed.is_empty() {
        lines.push("Unreachable folders (name taken by a mapped display name)".to_string());
        lines.extend(
            report
                .shadowed
                .iter()
                .map(|(folder, owner)| format!("{}{} → {}", indent(1), folder, owner)),
        );
    }
    lines
}

pub fn print_check(report: &MappingReport) {
    print_lines(format_check(report));
}

// ============================================================================
// Tests
// ============================================================================
