use bytes::Bytes;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// A file received from the client, ready to be forwarded to object storage.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Where an upload landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub public_url: String,
    pub path: String,
}

/// `<uuid-v4>[.<ext>]`. The extension is kept only when it is short and alphanumeric so that
/// client-supplied names never reach the storage path.
pub fn object_name(original_name: Option<&str>) -> String {
    let id = Uuid::new_v4();
    match original_name.and_then(extension) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 10 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
