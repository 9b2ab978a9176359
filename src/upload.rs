//! Directory upload.
//!
//! Pushes a local tree (usually the built site in `dist/`, or a single shoot
//! folder under `--prefix`) into the bucket, one object per file.
//!
//! ## Keys
//!
//! ```text
//! dist/index.html                  -> index.html
//! dist/css/style.css               -> css/style.css
//! shoot/a.JPG     with --prefix ABI -> ABI/a.JPG
//! shoot/a.JPG     (single file)     -> a.JPG, or <prefix>/a.JPG
//! ```
//!
//! Keys always use `/`, whatever the platform separator.
//!
//! ## Headers
//!
//! Content-Type comes from the lowercased extension; unknown extensions are
//! sent as `application/octet-stream`. HTML gets the short cache directive so
//! new deploys show up within a minute, everything else the long immutable one.
//!
//! ## Failures
//!
//! A file that cannot be read or stored is recorded and the run moves on, and
//! so is a directory entry the walk cannot open (an unreadable subdirectory,
//! a broken symlink). The returned [`UploadSummary`] carries every failure;
//! only a missing source is fatal.

use crate::config::UploadConfig;
use crate::store::{ObjectStore, PutObject};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload source not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Progress reported while uploading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Started {
        total: usize,
    },
    Uploaded {
        index: usize,
        total: usize,
        key: String,
        content_type: String,
    },
    Failed {
        index: usize,
        total: usize,
        key: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub failed: Vec<FailedUpload>,
}

impl UploadSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A local file and the key it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub path: PathBuf,
    pub key: String,
}

pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

pub fn cache_control<'a>(path: &Path, config: &'a UploadConfig) -> &'a str {
    let is_html = path
        .extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case("html"));
    if is_html {
        &config.html_cache_control
    } else {
        &config.asset_cache_control
    }
}

/// Object key for a path relative to the upload root.
pub fn object_key(relative: &Path, prefix: Option<&str>) -> String {
    let rel = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix}/{rel}"),
        None => rel,
    }
}

/// What a walk of the upload source found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collected {
    pub files: Vec<UploadFile>,
    /// Entries the walk could not open, keyed like the files under them.
    pub unreadable: Vec<FailedUpload>,
}

/// Every regular file under `source` with its key, in path order.
///
/// A file `source` yields just that file, keyed by its name. Symlinks are
/// followed; one that is broken or loops is recorded as unreadable.
pub fn collect_files(source: &Path, prefix: Option<&str>) -> Result<Collected, UploadError> {
    if !source.exists() {
        return Err(UploadError::SourceNotFound(source.to_path_buf()));
    }

    let mut collected = Collected::default();
    if source.is_file() {
        let name = source.file_name().map(Path::new).unwrap_or(source);
        collected.files.push(UploadFile {
            path: source.to_path_buf(),
            key: object_key(name, prefix),
        });
        return Ok(collected);
    }

    for entry in WalkDir::new(source).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let key = match e.path() {
                    Some(path) => object_key(path.strip_prefix(source).unwrap_or(path), prefix),
                    None => source.display().to_string(),
                };
                collected.unreadable.push(FailedUpload {
                    key,
                    message: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        collected.files.push(UploadFile {
            path: entry.path().to_path_buf(),
            key: object_key(relative, prefix),
        });
    }
    Ok(collected)
}

/// Upload every file under `source`.
///
/// At most `concurrency` uploads are in flight; events are reported in file
/// order regardless. Entries the walk could not open are reported first.
pub async fn upload(
    store: &impl ObjectStore,
    source: &Path,
    prefix: Option<&str>,
    config: &UploadConfig,
    concurrency: usize,
    events: Option<Sender<UploadEvent>>,
) -> Result<UploadSummary, UploadError> {
    let Collected { files, unreadable } = collect_files(source, prefix)?;
    let total = files.len() + unreadable.len();
    info!(source = %source.display(), files = total, concurrency, "starting upload");

    let emit = |event: UploadEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };
    emit(UploadEvent::Started { total });

    let mut summary = UploadSummary::default();
    let mut index = 0;
    for failure in unreadable {
        index += 1;
        warn!(key = %failure.key, message = %failure.message, "skipping unreadable entry");
        emit(UploadEvent::Failed {
            index,
            total,
            key: failure.key.clone(),
            message: failure.message.clone(),
        });
        summary.failed.push(failure);
    }

    let mut results = stream::iter(files.iter())
        .map(|file| upload_one(store, file, config))
        .buffered(concurrency.max(1));

    while let Some((file, result)) = results.next().await {
        index += 1;
        match result {
            Ok(content_type) => {
                summary.uploaded += 1;
                emit(UploadEvent::Uploaded {
                    index,
                    total,
                    key: file.key.clone(),
                    content_type: content_type.to_string(),
                });
            }
            Err(message) => {
                warn!(key = %file.key, %message, "upload failed");
                emit(UploadEvent::Failed {
                    index,
                    total,
                    key: file.key.clone(),
                    message: message.clone(),
                });
                summary.failed.push(FailedUpload {
                    key: file.key.clone(),
                    message,
                });
            }
        }
    }

    info!(
        uploaded = summary.uploaded,
        failed = summary.failed.len(),
        "upload finished"
    );
    Ok(summary)
}

async fn upload_one<'f>(
    store: &impl ObjectStore,
    file: &'f UploadFile,
    config: &UploadConfig,
) -> (&'f UploadFile, Result<&'static str, String>) {
    let body = match tokio::fs::read(&file.path).await {
        Ok(body) => body,
        Err(e) => return (file, Err(format!("read {}: {e}", file.path.display()))),
    };
    let content_type = content_type(&file.path);
    debug!(key = %file.key, content_type, bytes = body.len(), "uploading");

    let result = store
        .put(PutObject {
            key: file.key.clone(),
            body,
            content_type: content_type.to_string(),
            cache_control: cache_control(&file.path, config).to_string(),
        })
        .await
        .map(|()| content_type)
        .map_err(|e| e.to_string());
    (file, result)
}
