//! Configuration.
//!
//! Two layers, kept apart because one is committed to the repository and the
//! other holds secrets:
//!
//! 1. **`portfolio.toml`**: paths, upload headers, resolver policy. Optional;
//!    every key has a default and a file need only override what it changes.
//! 2. **Environment**: bucket name, endpoint, and credentials, read after
//!    loading `.env`. Never stored in TOML.
//!
//! ## `portfolio.toml`
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! dist_dir = "dist"
//! index_file = "portfolio-index.json"      # relative to dist_dir
//! mapping_file = "portfolio-mapping.json"  # relative to dist_dir
//!
//! [bucket]
//! public_base_url = ""   # empty = R2_PUBLIC_BASE_URL or <endpoint>/<bucket>/
//! legacy_hosts = []
//!
//! [upload]
//! max_concurrent = 1
//! html_cache_control = "public, max-age=60, must-revalidate"
//! asset_cache_control = "public, max-age=31536000, immutable"
//!
//! [resolve]
//! policy = "permissive"  # or "strict"
//! include_unmapped = true
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Environment
//!
//! Each value accepts a few names, first match wins:
//!
//! | Value | Variables |
//! |---|---|
//! | account id | `R2_ACCOUNT_ID`, `CF_R2_ACCOUNT_ID` |
//! | access key | `R2_ACCESS_KEY_ID`, `AWS_ACCESS_KEY_ID`, `CF_R2_ACCESS_KEY_ID` |
//! | secret | `R2_SECRET_ACCESS_KEY`, `AWS_SECRET_ACCESS_KEY`, `CF_R2_SECRET_ACCESS_KEY` |
//! | bucket | `R2_BUCKET_NAME`, `R2_BUCKET`, `CF_R2_BUCKET_NAME`, `AWS_S3_BUCKET`, `BUCKET_NAME` |
//! | endpoint | `R2_ENDPOINT` (else derived from the account id) |
//! | public URL | `R2_PUBLIC_BASE_URL`, `R2_PUBLIC_URL` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Name of the config file looked up in the config directory.
pub const CONFIG_FILENAME: &str = "portfolio.toml";

/// Upper bound for `upload.max_concurrent`. Keeps a misconfigured run from
/// tripping the store's rate limits.
pub const MAX_CONCURRENT_UPLOADS: usize = 16;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error(
        "Missing bucket configuration: {}. Set them in the environment or in a .env file.",
        .0.join(", ")
    )]
    MissingEnv(Vec<&'static str>),
}

/// Settings loaded from `portfolio.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortfolioConfig {
    /// Where the built site and the generated documents live.
    pub paths: PathsConfig,
    /// Public URL settings for the bucket.
    pub bucket: BucketConfig,
    /// Upload headers and concurrency.
    pub upload: UploadConfig,
    /// Mapping resolution policy.
    pub resolve: ResolveConfig,
}

impl PortfolioConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.max_concurrent == 0 || self.upload.max_concurrent > MAX_CONCURRENT_UPLOADS {
            return Err(ConfigError::Validation(format!(
                "upload.max_concurrent must be 1-{MAX_CONCURRENT_UPLOADS}"
            )));
        }
        if self.paths.index_file.trim().is_empty() || self.paths.mapping_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "paths.index_file and paths.mapping_file must not be empty".into(),
            ));
        }
        if self.upload.html_cache_control.trim().is_empty()
            || self.upload.asset_cache_control.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "upload cache-control values must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn index_path(&self) -> PathBuf {
        self.paths.dist_dir.join(&self.paths.index_file)
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.paths.dist_dir.join(&self.paths.mapping_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Built site directory; also the default upload source.
    pub dist_dir: PathBuf,
    /// Generated index filename, relative to `dist_dir`.
    pub index_file: String,
    /// Curated mapping filename, relative to `dist_dir`.
    pub mapping_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dist_dir: PathBuf::from("dist"),
            index_file: "portfolio-index.json".to_string(),
            mapping_file: "portfolio-mapping.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BucketConfig {
    /// Public base URL for image links. Empty means: use the environment
    /// override, or fall back to the path-style endpoint URL.
    pub public_base_url: String,
    /// Hosts of earlier public URLs whose links are rewritten onto the
    /// public base URL.
    pub legacy_hosts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Uploads in flight at once. 1 keeps uploads strictly sequential.
    pub max_concurrent: usize,
    /// Cache-Control for `.html` files.
    pub html_cache_control: String,
    /// Cache-Control for every other file.
    pub asset_cache_control: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            html_cache_control: "public, max-age=60, must-revalidate".to_string(),
            asset_cache_control: "public, max-age=31536000, immutable".to_string(),
        }
    }
}

/// How mapping entries that do not match any bucket folder are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvePolicy {
    /// Drop entries whose folder is not in the index.
    Strict,
    /// Keep every entry; a missing folder shows up when its gallery is opened.
    #[default]
    Permissive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveConfig {
    pub policy: ResolvePolicy,
    /// Under the permissive policy, list bucket folders that have no mapping
    /// entry under the first category.
    pub include_unmapped: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            policy: ResolvePolicy::Permissive,
            include_unmapped: true,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(PortfolioConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `portfolio.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PortfolioConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PortfolioConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `portfolio.toml` in the given directory, falling back to
/// defaults when the file is absent.
pub fn load_config(dir: &Path) -> Result<PortfolioConfig, ConfigError> {
    let overlay = load_raw_config(dir)?;
    resolve_config(overlay)
}

/// Returns a fully-commented stock `portfolio.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Portfolio Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Bucket name, endpoint and credentials are NOT configured here; they come
# from the environment (or a .env file): R2_ACCOUNT_ID, R2_ACCESS_KEY_ID,
# R2_SECRET_ACCESS_KEY, R2_BUCKET_NAME, optionally R2_ENDPOINT and
# R2_PUBLIC_BASE_URL.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Paths
# ---------------------------------------------------------------------------
[paths]
# Built site directory. Default source for `upload`.
dist_dir = "dist"

# Generated bucket index, relative to dist_dir.
index_file = "portfolio-index.json"

# Hand-curated folder mapping, relative to dist_dir.
mapping_file = "portfolio-mapping.json"

# ---------------------------------------------------------------------------
# Bucket
# ---------------------------------------------------------------------------
[bucket]
# Public base URL written into the index and used for image links.
# Empty: use R2_PUBLIC_BASE_URL, else <endpoint>/<bucket>/, the S3 API
# endpoint, which browsers cannot load without credentials.
public_base_url = ""

# Hosts of earlier public URLs. Links on these hosts are rewritten onto
# public_base_url, e.g. ["pub-0123456789abcdef.r2.dev"].
legacy_hosts = []

# ---------------------------------------------------------------------------
# Upload
# ---------------------------------------------------------------------------
[upload]
# Uploads in flight at once (1-16). 1 uploads strictly one file at a time.
max_concurrent = 1

# Cache-Control for HTML pages: short, so new deploys show up quickly.
html_cache_control = "public, max-age=60, must-revalidate"

# Cache-Control for everything else.
asset_cache_control = "public, max-age=31536000, immutable"

# ---------------------------------------------------------------------------
# Catalog resolution
# ---------------------------------------------------------------------------
[resolve]
# "permissive": keep mapping entries whose folder is missing from the bucket.
# "strict": drop them.
policy = "permissive"

# Permissive only: list bucket folders without a mapping entry under the
# first category, using the folder name as display name.
include_unmapped = true
"##
}

// =============================================================================
// Environment: bucket access
// =============================================================================

const ACCOUNT_ID_VARS: &[&str] = &["R2_ACCOUNT_ID", "CF_R2_ACCOUNT_ID"];
const ACCESS_KEY_VARS: &[&str] = &[
    "R2_ACCESS_KEY_ID",
    "AWS_ACCESS_KEY_ID",
    "CF_R2_ACCESS_KEY_ID",
];
const SECRET_KEY_VARS: &[&str] = &[
    "R2_SECRET_ACCESS_KEY",
    "AWS_SECRET_ACCESS_KEY",
    "CF_R2_SECRET_ACCESS_KEY",
];
const BUCKET_VARS: &[&str] = &[
    "R2_BUCKET_NAME",
    "R2_BUCKET",
    "CF_R2_BUCKET_NAME",
    "AWS_S3_BUCKET",
    "BUCKET_NAME",
];
const ENDPOINT_VARS: &[&str] = &["R2_ENDPOINT"];
const PUBLIC_URL_VARS: &[&str] = &["R2_PUBLIC_BASE_URL", "R2_PUBLIC_URL"];

/// Resolved bucket access: where the bucket is, how to authenticate, and
/// the public URL images are served from.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub public_base_url: String,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

impl StoreConfig {
    /// Whether the public URL is the `<endpoint>/<bucket>/` fallback rather
    /// than a public bucket domain.
    pub fn serves_from_api_endpoint(&self) -> bool {
        self.public_base_url == format!("{}/{}/", self.endpoint, self.bucket)
    }

    /// Read bucket access from the process environment, after loading `.env`
    /// from the working directory if one exists.
    pub fn from_env(bucket: &BucketConfig) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(bucket, |name| std::env::var(name).ok())
    }

    /// Resolve bucket access through an arbitrary variable lookup.
    ///
    /// Blank values count as unset. Every missing value is reported at once.
    pub fn from_lookup<F>(bucket: &BucketConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|&name| lookup(name))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        let account_id = first(ACCOUNT_ID_VARS);
        let access_key_id = first(ACCESS_KEY_VARS);
        let secret_access_key = first(SECRET_KEY_VARS);
        let bucket_name = first(BUCKET_VARS);
        let endpoint = first(ENDPOINT_VARS).or_else(|| {
            account_id
                .as_ref()
                .map(|id| format!("https://{id}.r2.cloudflarestorage.com"))
        });

        let mut missing = Vec::new();
        if endpoint.is_none() {
            missing.push("R2_ACCOUNT_ID (or R2_ENDPOINT)");
        }
        if access_key_id.is_none() {
            missing.push("R2_ACCESS_KEY_ID (or AWS_ACCESS_KEY_ID)");
        }
        if secret_access_key.is_none() {
            missing.push("R2_SECRET_ACCESS_KEY (or AWS_SECRET_ACCESS_KEY)");
        }
        if bucket_name.is_none() {
            missing.push("R2_BUCKET_NAME");
        }

        match (endpoint, access_key_id, secret_access_key, bucket_name) {
            (Some(endpoint), Some(access_key_id), Some(secret_access_key), Some(bucket_name)) => {
                let endpoint = endpoint.trim_end_matches('/').to_string();
                let public_base_url = first(PUBLIC_URL_VARS)
                    .or_else(|| {
                        let configured = bucket.public_base_url.trim();
                        (!configured.is_empty()).then(|| configured.to_string())
                    })
                    .unwrap_or_else(|| format!("{endpoint}/{bucket_name}/"));
                let config = Self {
                    bucket: bucket_name,
                    endpoint,
                    access_key_id,
                    secret_access_key,
                    public_base_url,
                };
                if config.serves_from_api_endpoint() {
                    warn!(
                        url = %config.public_base_url,
                        "no public base URL configured; image URLs point at the authenticated S3 API \
                         endpoint, which browsers cannot load. Set R2_PUBLIC_BASE_URL or [bucket] public_base_url"
                    );
                }
                Ok(config)
            }
            _ => Err(ConfigError::MissingEnv(missing)),
        }
    }
}
