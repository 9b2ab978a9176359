//! Object store access.
//!
//! The [`ObjectStore`] trait is the only way the rest of the crate talks to
//! the bucket. It needs exactly two operations:
//!
//! | Operation | Used by |
//! |---|---|
//! | `list_page` | [`crate::index`], full paginated listing |
//! | `put` | [`crate::upload`], one object per local file |
//!
//! The production implementation is [`R2Store`], an `aws-sdk-s3` client
//! pointed at the Cloudflare R2 endpoint. Tests use the recording
//! `MockStore` in this module's test submodule.

mod r2;

pub use r2::R2Store;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("listing failed: {0}")]
    List(String),
    #[error("put {key} failed: {message}")]
    Put { key: String, message: String },
}

/// One page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    /// Cursor for the next page; `None` when the listing is complete.
    pub next_token: Option<String>,
}

/// A single object write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
}

/// Capability to list and write objects in one bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of keys, starting after `continuation_token`.
    async fn list_page(&self, continuation_token: Option<&str>) -> Result<ListPage, StoreError>;

    /// Write one object, replacing any existing object with the same key.
    async fn put(&self, object: PutObject) -> Result<(), StoreError>;
}

/// Every key in the bucket, following continuation tokens one page at a time.
///
/// Any failed page fails the whole listing; no partial result is returned.
pub async fn list_all_keys(store: &impl ObjectStore) -> Result<Vec<String>, StoreError> {
    let mut keys = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;
    loop {
        let page = store.list_page(token.as_deref()).await?;
        pages += 1;
        debug!(page = pages, keys = page.keys.len(), "listed page");
        keys.extend(page.keys);
        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    debug!(pages, total = keys.len(), "listing complete");
    Ok(keys)
}
