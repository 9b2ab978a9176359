//! Cloudflare R2 through the S3-compatible API.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, retry::RetryConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::{Client, error::DisplayErrorContext, primitives::ByteStream};
use tracing::{debug, info};

use super::{ListPage, ObjectStore, PutObject, StoreError};
use crate::config::StoreConfig;

/// R2 accepts any region name; `auto` is what Cloudflare documents.
const R2_REGION: &str = "auto";

/// Bucket client bound to one R2 bucket.
#[derive(Clone)]
pub struct R2Store {
    client: Client,
    bucket: String,
}

impl R2Store {
    /// Build a client from resolved store configuration.
    ///
    /// Retries are disabled: a failed call surfaces immediately and the
    /// caller decides whether the run continues.
    pub async fn connect(config: &StoreConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "portfolio-r2",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(R2_REGION))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint.clone())
            .retry_config(RetryConfig::disabled())
            .load()
            .await;

        let client = Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build(),
        );

        info!(bucket = %config.bucket, endpoint = %config.endpoint, "connected to bucket");

        Self {
            client,
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for R2Store {
    async fn list_page(&self, continuation_token: Option<&str>) -> Result<ListPage, StoreError> {
        let mut request = self.client.list_objects_v2().bucket(&self.bucket);
        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::List(DisplayErrorContext(e).to_string()))?;

        let keys: Vec<String> = response
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .map(String::from)
            .collect();

        let next_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(String::from)
        } else {
            None
        };

        Ok(ListPage { keys, next_token })
    }

    async fn put(&self, object: PutObject) -> Result<(), StoreError> {
        debug!(key = %object.key, bytes = object.body.len(), "put object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object.key)
            .body(ByteStream::from(object.body))
            .content_type(object.content_type)
            .cache_control(object.cache_control)
            .send()
            .await
            .map_err(|e| StoreError::Put {
                key: object.key.clone(),
                message: DisplayErrorContext(e).to_string(),
            })?;
        Ok(())
    }
}
