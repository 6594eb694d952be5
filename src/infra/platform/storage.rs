use super::PlatformClient;
use crate::app::error::{upstream_body, upstream_message, ServiceError};
use crate::domain::upload::IncomingFile;
use async_trait::async_trait;
use reqwest::Method;
use tracing::{error, info};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Object storage seam used by the upload bridge.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `file` at `bucket/path`. Must not overwrite an existing object.
    async fn put(&self, bucket: &str, path: &str, file: &IncomingFile) -> Result<(), ServiceError>;

    /// Public URL of an object stored with `put`.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Object storage on the backend platform (`/storage/v1`).
pub struct PlatformStorage {
    client: PlatformClient,
}

impl PlatformStorage {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStorage for PlatformStorage {
    async fn put(&self, bucket: &str, path: &str, file: &IncomingFile) -> Result<(), ServiceError> {
        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let response = self
            .client
            .service(Method::POST, &format!("/storage/v1/object/{}/{}", bucket, path))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = upstream_body(response).await;
            let message = upstream_message(&body);
            error!(%status, bucket, path, %message, "Storage upload failed");
            return Err(ServiceError::Storage(message));
        }

        info!(bucket, path, bytes = file.bytes.len(), "Stored uploaded file");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.client.base_url(),
            bucket,
            path
        )
    }
}
