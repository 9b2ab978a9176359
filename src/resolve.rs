//! Mapping resolution.
//!
//! Combines the hand-written [`MappingDocument`] with the generated
//! [`PortfolioIndex`] into a [`Catalog`]: the category navigation the site
//! shows, and the display name → folder lookup used when a gallery is opened.
//!
//! ```text
//! mapping                                  index
//! ┌──────────────────────────────────┐     ┌───────────────────────────┐
//! │ "ABI": Asabi Pilot / brand...    │     │ ABI: [a.jpg, b.jpg]       │
//! │ "STREET SOUK 23'": event         │ ──► │ STREET SOUK 23’: [...]    │
//! │ "OLD SHOOT": portrait            │     │ GUNNA: [g1.jpg]           │
//! └──────────────────────────────────┘     └───────────────────────────┘
//!                      │
//!                      ▼
//!   brandcampaignshoot: [Asabi Pilot, GUNNA]   (GUNNA unmapped → first category)
//!   event:              [STREET SOUK 23']
//!   portrait:           [OLD SHOOT]            (permissive keeps stale entries)
//! ```
//!
//! Folder names are matched with [`find_folder_key`], which tolerates the
//! ASCII/typographic apostrophe mismatch between the mapping and the bucket.
//! Everything here is pure: no I/O beyond [`load_mapping`].

use crate::config::{BucketConfig, ResolveConfig, ResolvePolicy};
use crate::naming;
use crate::types::{MappingDocument, MappingEntry, PortfolioIndex};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid mapping document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Mapping document declares no categories (categoriesOrder is empty)")]
    NoCategories,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Cannot resolve a mapping without categories")]
    NoCategories,
    #[error("Folder not found for \"{0}\"")]
    FolderNotFound(String),
}

/// Read and validate a mapping document.
pub fn load_mapping(path: &Path) -> Result<MappingDocument, MappingError> {
    let content = fs::read_to_string(path)?;
    let mapping: MappingDocument = serde_json::from_str(&content)?;
    if mapping.categories_order.is_empty() {
        return Err(MappingError::NoCategories);
    }
    Ok(mapping)
}

/// Resolved navigation: categories in declared order, each with its sorted
/// display names, plus the folder behind every display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub categories: Vec<CategoryGroup>,
    pub folders: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub id: String,
    pub display_names: Vec<String>,
}

impl Catalog {
    /// Display names of a category, if declared.
    pub fn category(&self, id: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.display_names.as_slice())
    }

    pub fn folder_for(&self, display_name: &str) -> Option<&str> {
        self.folders.get(display_name).map(String::as_str)
    }
}

/// Index folder matching `raw`, trying the exact name first, then with
/// ASCII apostrophes made typographic, then the reverse.
pub fn find_folder_key<'a>(raw: &str, index: &'a PortfolioIndex) -> Option<&'a str> {
    naming::spelling_variants(raw)
        .iter()
        .find_map(|variant| index.folder_names().find(|name| *name == &**variant))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Display name for an entry, falling back to the folder name.
pub fn display_name<'a>(folder: &'a str, entry: &'a MappingEntry) -> &'a str {
    non_empty(&entry.display_name).unwrap_or(folder)
}

/// Build the catalog.
///
/// Undeclared or missing categories land in the first declared category.
/// Under [`ResolvePolicy::Strict`] entries whose folder is not in the index
/// are dropped; under the permissive policy they are kept, and with
/// `include_unmapped` every index folder without an entry is added too.
///
/// Mapping entries claim display names before unmapped folders do. An
/// unmapped folder whose name is already a mapped display name is left out
/// and shows up in [`MappingReport::shadowed`].
pub fn resolve(
    mapping: &MappingDocument,
    index: &PortfolioIndex,
    options: &ResolveConfig,
) -> Result<Catalog, ResolveError> {
    let default_category: &str = mapping
        .categories_order
        .first()
        .ok_or(ResolveError::NoCategories)?;

    let mut categories: Vec<CategoryGroup> = Vec::new();
    for id in &mapping.categories_order {
        if !categories.iter().any(|c| &c.id == id) {
            categories.push(CategoryGroup {
                id: id.clone(),
                display_names: Vec::new(),
            });
        }
    }

    let mut folders = BTreeMap::new();
    let mut covered: HashSet<&str> = HashSet::new();

    for (folder, entry) in &mapping.mappings {
        let resolved = find_folder_key(folder, index);
        if let Some(key) = resolved {
            covered.insert(key);
        }
        let target = match (resolved, options.policy) {
            (Some(key), _) => key,
            (None, ResolvePolicy::Permissive) => folder.as_str(),
            (None, ResolvePolicy::Strict) => {
                debug!(folder = %folder, "skipping mapping entry without bucket folder");
                continue;
            }
        };

        let name = display_name(folder, entry);
        let category = non_empty(&entry.category)
            .filter(|c| mapping.categories_order.iter().any(|id| id == *c))
            .unwrap_or(default_category);
        add_entry(&mut categories, &mut folders, category, name, target);
    }

    if options.policy == ResolvePolicy::Permissive && options.include_unmapped {
        for folder in index.folder_names().filter(|f| !covered.contains(f)) {
            if let Some(owner) = folders.get(folder) {
                warn!(
                    folder,
                    mapped_folder = %owner,
                    "unmapped folder shares a mapped display name and is unreachable; give it a mapping entry"
                );
                continue;
            }
            add_entry(&mut categories, &mut folders, default_category, folder, folder);
        }
    }

    for group in &mut categories {
        naming::sort_names(&mut group.display_names);
    }

    Ok(Catalog {
        categories,
        folders,
    })
}

fn add_entry(
    categories: &mut [CategoryGroup],
    folders: &mut BTreeMap<String, String>,
    category: &str,
    display_name: &str,
    folder: &str,
) {
    if let Some(existing) = folders.get(display_name) {
        warn!(
            display_name,
            kept = %existing,
            skipped = folder,
            "duplicate display name; keeping the first folder"
        );
        return;
    }
    folders.insert(display_name.to_string(), folder.to_string());
    if let Some(group) = categories.iter_mut().find(|c| c.id == category) {
        group.display_names.push(display_name.to_string());
    }
}

// =============================================================================
// Galleries and public URLs
// =============================================================================

/// Public URL of one image: `<base>/<folder>/<file>`, segments encoded.
pub fn image_url(base: &str, folder: &str, file: &str) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    format!(
        "{base}/{}/{}",
        naming::encode_segment(folder),
        naming::encode_segment(file)
    )
}

/// Move a URL on `legacy_host` onto `base`, keeping its path.
///
/// Returns `None` when the URL is not on the legacy host.
pub fn rewrite_legacy_url(url: &str, legacy_host: &str, base: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let path = match rest.split_once('/') {
        Some((host, path)) if host == legacy_host => path,
        None if rest == legacy_host => "",
        _ => return None,
    };
    let base = base.strip_suffix('/').unwrap_or(base);
    Some(format!("{base}/{path}"))
}

/// Base URL images should be served from for this index: the index's own
/// `bucketBaseURL`, moved onto the configured public URL when it still
/// points at a legacy host.
pub fn public_base_url(index: &PortfolioIndex, bucket: &BucketConfig) -> String {
    let configured = bucket.public_base_url.trim();
    if configured.is_empty() {
        return index.bucket_base_url.clone();
    }
    bucket
        .legacy_hosts
        .iter()
        .find_map(|host| rewrite_legacy_url(&index.bucket_base_url, host, configured))
        .unwrap_or_else(|| index.bucket_base_url.clone())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub filename: String,
    pub url: String,
}

/// One opened gallery. `images` may be empty: the folder exists but holds
/// nothing, which is different from [`ResolveError::FolderNotFound`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gallery {
    pub folder: String,
    pub images: Vec<ImageRef>,
}

/// Open the gallery for a deep-link `subcategory` value.
///
/// A known display name goes through the catalog lookup; anything else is
/// taken as a folder name. Either way the folder is then found with
/// [`find_folder_key`].
pub fn lookup_gallery(
    value: &str,
    catalog: &Catalog,
    index: &PortfolioIndex,
    base_url: &str,
) -> Result<Gallery, ResolveError> {
    let folder_name = catalog.folder_for(value).unwrap_or(value);
    let key = find_folder_key(folder_name, index)
        .ok_or_else(|| ResolveError::FolderNotFound(value.to_string()))?;
    let images = index
        .files(key)
        .unwrap_or_default()
        .iter()
        .map(|file| ImageRef {
            filename: file.clone(),
            url: image_url(base_url, key, file),
        })
        .collect();
    Ok(Gallery {
        folder: key.to_string(),
        images,
    })
}

/// Representative image for a mapped folder on the home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedItem {
    pub folder: String,
    pub alt: String,
    pub image_url: String,
    pub href: String,
}

/// First image of every mapped folder that exists and has images, in
/// mapping order.
pub fn featured_items(
    mapping: &MappingDocument,
    index: &PortfolioIndex,
    base_url: &str,
) -> Vec<FeaturedItem> {
    mapping
        .mappings
        .iter()
        .filter_map(|(folder, entry)| {
            let key = find_folder_key(folder, index)?;
            let first = index.files(key)?.first()?;
            Some(FeaturedItem {
                folder: key.to_string(),
                alt: non_empty(&entry.display_name).unwrap_or(key).to_string(),
                image_url: image_url(base_url, key, first),
                href: format!("portfolio.html?subcategory={}", urlencoding::encode(key)),
            })
        })
        .collect()
}

// =============================================================================
// Mapping check
// =============================================================================

/// Drift between the mapping and the bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingReport {
    /// Mapping entries whose folder is not in the index.
    pub stale: Vec<String>,
    /// Index folders with no mapping entry.
    pub unmapped: Vec<String>,
    /// `(folder, category)` for entries naming an undeclared category.
    pub undeclared_categories: Vec<(String, String)>,
    /// `(folder, mapped folder)` for unmapped folders whose name is a mapped
    /// display name. The gallery link opens the mapped folder instead.
    pub shadowed: Vec<(String, String)>,
}

impl MappingReport {
    pub fn is_clean(&self) -> bool {
        self.stale.is_empty()
            && self.unmapped.is_empty()
            && self.undeclared_categories.is_empty()
            && self.shadowed.is_empty()
    }
}

pub fn check_mapping(mapping: &MappingDocument, index: &PortfolioIndex) -> MappingReport {
    let mut report = MappingReport::default();
    let mut covered: HashSet<&str> = HashSet::new();
    let mut claimed: BTreeMap<&str, &str> = BTreeMap::new();

    for (folder, entry) in &mapping.mappings {
        claimed
            .entry(display_name(folder, entry))
            .or_insert(folder.as_str());
        match find_folder_key(folder, index) {
            Some(key) => {
                covered.insert(key);
            }
            None => report.stale.push(folder.clone()),
        }
        let undeclared = non_empty(&entry.category)
            .filter(|c| !mapping.categories_order.iter().any(|id| id == *c));
        if let Some(category) = undeclared {
            report
                .undeclared_categories
                .push((folder.clone(), category.to_string()));
        }
    }

    report.unmapped = index
        .folder_names()
        .filter(|f| !covered.contains(f))
        .map(String::from)
        .collect();
    report.shadowed = report
        .unmapped
        .iter()
        .filter_map(|f| claimed.get(f.as_str()).map(|owner| (f.clone(), owner.to_string())))
        .collect();
    report
}
