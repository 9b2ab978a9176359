//! Bucket index generation.
//!
//! Lists every object in the bucket and turns the flat key listing into a
//! [`PortfolioIndex`]: image filenames grouped by top-level folder.
//!
//! ## Key Layout
//!
//! ```text
//! ABI/a.jpg                  -> folder "ABI", file "a.jpg"
//! ABI/raw/a.jpg              -> folder "ABI", file "a.jpg" (flattened)
//! STREET SOUK 23’/ss1.JPG    -> folder "STREET SOUK 23’", file "ss1.JPG"
//! GUNNA/notes.txt            -> skipped, not an image
//! GUNNA/                     -> skipped, folder placeholder
//! index.html                 -> skipped, no folder
//! ```
//!
//! Only the first path segment names a folder. Anything deeper is flattened
//! to its leaf filename, and a leaf reached through several paths is listed
//! once. Folders left with no images are not written at all.
//!
//! ## Ordering
//!
//! Folders and filenames both sort with [`naming::compare_names`], so two
//! runs over the same bucket produce byte-identical `folders`.

use crate::naming;
use crate::store::{self, ObjectStore, StoreError};
use crate::types::PortfolioIndex;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Bucket listing failed: {0}")]
    Listing(#[from] StoreError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Extensions that count as images. Membership is case-sensitive: camera
/// uploads use either all-lower or all-upper case, and anything else is
/// treated as a stray file.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".webp", ".gif", ".JPG", ".JPEG", ".PNG", ".WEBP", ".GIF",
];

pub fn is_image(name: &str) -> bool {
    naming::extension(name).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext))
}

/// Split a bucket key into `(folder, leaf filename)` if it names an image
/// inside a folder.
pub fn classify_key(key: &str) -> Option<(&str, &str)> {
    let (folder, rest) = key.split_once('/')?;
    if rest.is_empty() || !is_image(rest) {
        return None;
    }
    Some((folder, naming::leaf_name(rest)))
}

/// Group keys into sorted folders of sorted, unique filenames.
pub fn group_keys<I, S>(keys: I) -> Vec<(String, Vec<String>)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut folders: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut skipped = 0usize;

    for key in keys {
        let key = key.as_ref();
        match classify_key(key) {
            Some((folder, leaf)) => {
                folders
                    .entry(folder.to_string())
                    .or_default()
                    .insert(leaf.to_string());
            }
            None => skipped += 1,
        }
    }
    debug!(folders = folders.len(), skipped, "grouped keys");

    let mut grouped: Vec<(String, Vec<String>)> = folders
        .into_iter()
        .map(|(folder, files)| {
            let mut files: Vec<String> = files.into_iter().collect();
            naming::sort_names(&mut files);
            (folder, files)
        })
        .collect();
    grouped.sort_by(|(a, _), (b, _)| naming::compare_names(a, b));
    grouped
}

/// List the whole bucket and build its index.
///
/// `generated_at` is passed in so callers control the clock.
pub async fn build_index(
    store: &impl ObjectStore,
    bucket_name: &str,
    bucket_base_url: &str,
    generated_at: DateTime<Utc>,
) -> Result<PortfolioIndex, IndexError> {
    let keys = store::list_all_keys(store).await?;
    info!(keys = keys.len(), bucket = bucket_name, "bucket listed");

    Ok(PortfolioIndex {
        generated_at,
        bucket_name: bucket_name.to_string(),
        bucket_base_url: bucket_base_url.to_string(),
        folders: group_keys(&keys),
    })
}

/// Write the index as pretty JSON with a trailing newline, creating parent
/// directories and replacing any previous file.
pub fn write_index(path: &Path, index: &PortfolioIndex) -> Result<(), IndexError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(index)?;
    json.push('\n');
    fs::write(path, json)?;
    info!(path = %path.display(), folders = index.folders.len(), "index written");
    Ok(())
}

pub fn load_index(path: &Path) -> Result<PortfolioIndex, IndexError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::MockStore;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap()
    }

    fn folder<'a>(grouped: &'a [(String, Vec<String>)], name: &str) -> &'a [String] {
        grouped
            .iter()
            .find(|(f, _)| f == name)
            .map(|(_, files)| files.as_slice())
            .unwrap_or_else(|| panic!("folder '{name}' not in {grouped:?}"))
    }

    // =========================================================================
    // Key classification
    // =========================================================================

    #[test]
    fn classify_simple_key() {
        assert_eq!(classify_key("ABI/a.jpg"), Some(("ABI", "a.jpg")));
    }

    #[test]
    fn classify_flattens_nested_key() {
        assert_eq!(classify_key("ABI/raw/2024/a.jpg"), Some(("ABI", "a.jpg")));
    }

    #[test]
    fn classify_skips_root_files_and_placeholders() {
        assert_eq!(classify_key("index.html"), None);
        assert_eq!(classify_key("cover.jpg"), None);
        assert_eq!(classify_key("GUNNA/"), None);
    }

    #[test]
    fn classify_extension_case_sensitive() {
        assert!(classify_key("A/x.JPG").is_some());
        assert!(classify_key("A/x.jpeg").is_some());
        assert_eq!(classify_key("A/x.Jpg"), None);
        assert_eq!(classify_key("A/.jpg"), None);
    }

    #[test]
    fn classify_uses_last_dot() {
        assert!(classify_key("A/shot.final.png").is_some());
        assert_eq!(classify_key("A/shot.jpg.txt"), None);
    }

    #[test]
    fn empty_folder_name_is_a_folder() {
        assert_eq!(classify_key("/a.jpg"), Some(("", "a.jpg")));
    }

    // =========================================================================
    // Grouping
    // =========================================================================

    #[test]
    fn group_dedupes_leaf_across_depths() {
        let grouped = group_keys(["A/x/y.jpg", "A/y.jpg", "A/z/y.jpg"]);
        assert_eq!(folder(&grouped, "A"), ["y.jpg"]);
    }

    #[test]
    fn group_excludes_non_images_beside_images() {
        let grouped = group_keys(["A/a.jpg", "A/notes.txt", "A/brief.pdf"]);
        assert_eq!(folder(&grouped, "A"), ["a.jpg"]);
    }

    #[test]
    fn group_omits_folder_without_images() {
        let grouped = group_keys(["GUNNA/notes.txt", "GUNNA/", "ABI/a.jpg"]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].0, "ABI");
    }

    #[test]
    fn group_sorts_case_insensitively() {
        let grouped = group_keys([
            "zeta/B.jpg",
            "Alpha/c.png",
            "zeta/a.jpg",
            "beta/x.gif",
            "zeta/C.JPG",
        ]);
        let names: Vec<&str> = grouped.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "zeta"]);
        assert_eq!(folder(&grouped, "zeta"), ["a.jpg", "B.jpg", "C.JPG"]);
    }

    #[test]
    fn group_keeps_case_distinct_folders() {
        let grouped = group_keys(["abi/a.jpg", "ABI/b.jpg"]);
        let names: Vec<&str> = grouped.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(names, vec!["ABI", "abi"]);
    }

    #[test]
    fn group_is_order_independent() {
        let keys = ["b/2.jpg", "a/1.jpg", "b/1.jpg", "a/x/1.jpg", "c/readme.md"];
        let mut reversed = keys;
        reversed.reverse();
        assert_eq!(group_keys(keys), group_keys(reversed));
    }

    // =========================================================================
    // Build over a store
    // =========================================================================

    #[tokio::test]
    async fn build_index_across_pages() {
        let store = MockStore::with_keys(
            &[
                "index.html",
                "ABI/a.jpg",
                "ABI/b.jpg",
                "STREET SOUK 23\u{2019}/ss1.JPG",
                "GUNNA/notes.txt",
                "ABI/a.jpg",
            ],
            2,
        );
        let index = build_index(&store, "portfolio", "https://cdn.example/", fixed_time())
            .await
            .unwrap();

        assert_eq!(index.bucket_name, "portfolio");
        assert_eq!(index.bucket_base_url, "https://cdn.example/");
        assert_eq!(index.generated_at, fixed_time());
        assert_eq!(
            index.folder_names().collect::<Vec<_>>(),
            vec!["ABI", "STREET SOUK 23\u{2019}"]
        );
        assert_eq!(index.files("ABI").unwrap(), ["a.jpg", "b.jpg"]);
        assert!(!index.contains_folder("GUNNA"));
    }

    #[tokio::test]
    async fn build_index_fails_without_partial_result() {
        let store = MockStore::with_keys(&["A/1.jpg", "A/2.jpg", "B/3.jpg"], 1).failing_page(1);
        let result = build_index(&store, "b", "https://x/", fixed_time()).await;
        assert!(matches!(result, Err(IndexError::Listing(_))));
    }

    #[tokio::test]
    async fn build_index_empty_bucket() {
        let store = MockStore::new();
        let index = build_index(&store, "b", "https://x/", fixed_time())
            .await
            .unwrap();
        assert!(index.folders.is_empty());
    }

    // =========================================================================
    // File output
    // =========================================================================

    #[test]
    fn write_index_creates_dirs_and_trailing_newline() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dist/nested/portfolio-index.json");
        let index = PortfolioIndex {
            generated_at: fixed_time(),
            bucket_name: "b".to_string(),
            bucket_base_url: "https://x/".to_string(),
            folders: group_keys(["A/1.jpg"]),
        };
        write_index(&path, &index).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("}\n"));
        assert!(written.contains("  \"generatedAt\": \"2025-06-01T12:30:00.000Z\""));
        assert_eq!(load_index(&path).unwrap(), index);
    }

    #[test]
    fn write_index_overwrites_previous() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("portfolio-index.json");
        fs::write(&path, "stale").unwrap();
        let index = PortfolioIndex {
            generated_at: fixed_time(),
            bucket_name: "b".to_string(),
            bucket_base_url: "https://x/".to_string(),
            folders: vec![],
        };
        write_index(&path, &index).unwrap();
        assert!(load_index(&path).unwrap().folders.is_empty());
    }

    #[test]
    fn load_index_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_index(&tmp.path().join("nope.json"));
        assert!(matches!(result, Err(IndexError::Io(_))));
    }
}
