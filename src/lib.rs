//! # portfolio-r2
//!
//! Tooling for a static photography portfolio served from a Cloudflare R2
//! bucket. The bucket is the data source: every top-level folder is a shoot,
//! and a small hand-written mapping gives shoots display names and
//! categories.
//!
//! # Architecture
//!
//! Three independent steps, each reading and writing plain files or bucket
//! objects so any of them can be re-run on its own:
//!
//! ```text
//! 1. Upload    dist/ or a shoot folder  →  bucket objects
//! 2. Index     bucket listing           →  portfolio-index.json
//! 3. Resolve   index + mapping          →  catalog (categories, galleries)
//! ```
//!
//! The index and the mapping are the same JSON files the browser reads, so
//! what the CLI shows for `catalog` or `gallery` is exactly what the site
//! renders.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | `ObjectStore` trait and the R2 client behind it |
//! | [`index`] | Bucket listing → folder/image index, written as JSON |
//! | [`resolve`] | Mapping + index → catalog, folder lookup, galleries, featured items |
//! | [`upload`] | Local tree → bucket objects with content-type and cache headers |
//! | [`config`] | `portfolio.toml` loading and validation; bucket access from the environment |
//! | [`types`] | The index and mapping documents as serialized on disk |
//! | [`naming`] | Folder-name ordering, apostrophe variants, URL segment encoding |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Bucket Is the Source of Truth
//!
//! There is no database and no per-image metadata file. A shoot exists when
//! its folder holds at least one image; renaming a folder in the bucket is
//! enough to rename the shoot, and the next `index` run picks it up.
//!
//! ## Apostrophes
//!
//! Folder names are typed by hand in several tools, and `'` and `’` both
//! turn up. Lookups try the name as written, then each apostrophe spelling,
//! so the mapping never has to match the bucket byte for byte. See
//! [`naming::spelling_variants`].
//!
//! ## Secrets Stay in the Environment
//!
//! `portfolio.toml` is meant to be committed. Bucket name, endpoint, and keys
//! are only ever read from the environment or a `.env` file.

pub mod config;
pub mod index;
pub mod naming;
pub mod output;
pub mod resolve;
pub mod store;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
