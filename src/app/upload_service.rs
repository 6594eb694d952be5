use crate::app::error::ServiceError;
use crate::domain::upload::{object_name, IncomingFile, StoredObject};
use crate::infra::platform::ObjectStorage;
use std::sync::Arc;

/// Upload bridge: names the file and hands it to object storage.
pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
    default_bucket: String,
}

impl UploadService {
    pub fn new(storage: Arc<dyn ObjectStorage>, default_bucket: impl Into<String>) -> Self {
        Self {
            storage,
            default_bucket: default_bucket.into(),
        }
    }

    pub fn default_bucket(&self) -> &str {
        &self.default_bucket
    }

    /// Stores `file` under a fresh unique name. `bucket` falls back to the default bucket when
    /// absent or blank.
    pub async fn upload(
        &self,
        file: Option<IncomingFile>,
        bucket: Option<&str>,
    ) -> Result<StoredObject, ServiceError> {
        let file = file.ok_or_else(|| ServiceError::validation("No file provided"))?;

        let bucket = match bucket.map(str::trim).filter(|b| !b.is_empty()) {
            Some(b) if is_valid_bucket(b) => b,
            Some(b) => {
                return Err(ServiceError::validation(format!(
                    "Invalid bucket name '{}'",
                    b
                )))
            }
            None => self.default_bucket.as_str(),
        };

        let path = object_name(file.original_name.as_deref());
        self.storage.put(bucket, &path, &file).await?;

        Ok(StoredObject {
            public_url: self.storage.public_url(bucket, &path),
            path,
        })
    }
}

fn is_valid_bucket(name: &str) -> bool {
    name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !name.contains("..")
        && !name.chars().all(|c| c == '.')
}
