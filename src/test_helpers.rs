//! Shared test utilities for the portfolio-r2 test suite.
//!
//! Provides builders for in-memory indexes and mappings, a copy of the
//! `fixtures/site/` tree for upload tests, and catalog extractors.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let index = index_with(&[("ABI", &["a.jpg", "b.jpg"]), ("GUNNA", &[])]);
//! let mapping = mapping_with(&["event"], &[("ABI", Some("Asabi Pilot"), None)]);
//!
//! let catalog = resolve(&mapping, &index, &ResolveConfig::default()).unwrap();
//! assert_eq!(category_ids(&catalog), vec!["event"]);
//! ```

use chrono::{TimeZone, Utc};
use std::path::Path;
use tempfile::TempDir;

use crate::resolve::Catalog;
use crate::types::{MappingDocument, MappingEntry, PortfolioIndex};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_site_fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Document builders
// =========================================================================

/// Index with the given folders, in the given order, at a fixed timestamp.
pub fn index_with(folders: &[(&str, &[&str])]) -> PortfolioIndex {
    PortfolioIndex {
        generated_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        bucket_name: "portfolio".to_string(),
        bucket_base_url: "https://cdn.example/".to_string(),
        folders: folders
            .iter()
            .map(|(name, files)| {
                (
                    name.to_string(),
                    files.iter().map(|f| f.to_string()).collect(),
                )
            })
            .collect(),
    }
}

/// Mapping with the given categories and `(folder, displayName, category)`
/// entries, in the given order.
pub fn mapping_with(
    categories: &[&str],
    entries: &[(&str, Option<&str>, Option<&str>)],
) -> MappingDocument {
    MappingDocument {
        categories_order: categories.iter().map(|c| c.to_string()).collect(),
        mappings: entries
            .iter()
            .map(|(folder, display_name, category)| {
                (
                    folder.to_string(),
                    MappingEntry {
                        display_name: display_name.map(String::from),
                        category: category.map(String::from),
                    },
                )
            })
            .collect(),
    }
}

// =========================================================================
// Catalog extractors
// =========================================================================

/// Category ids in catalog order.
pub fn category_ids(catalog: &Catalog) -> Vec<&str> {
    catalog.categories.iter().map(|c| c.id.as_str()).collect()
}

/// Display names of a category. Panics if the category is not declared.
pub fn display_names<'a>(catalog: &'a Catalog, category: &str) -> Vec<&'a str> {
    catalog
        .category(category)
        .map(|names| names.iter().map(String::as_str).collect())
        .unwrap_or_else(|| {
            let ids = category_ids(catalog);
            panic!("category '{category}' not found. Available: {ids:?}")
        })
}
