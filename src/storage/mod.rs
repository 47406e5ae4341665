//! Object storage for uploaded media: the store abstraction, key naming and URL mapping.

mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::S3Store;

use crate::config::StorageSettings;
use crate::error::AppError;
use async_trait::async_trait;
use serde::Serialize;

/// Route prefix of the public proxy that serves stored objects.
pub const FILES_ROUTE: &str = "/api/cloud/files";

const MAX_BASE_LEN: usize = 64;
const MAX_EXT_LEN: usize = 10;

/// Metadata returned for a freshly stored object.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub id: String,
    pub file_name: String,
    pub size: usize,
    pub mime_type: String,
    pub uploaded_at: String,
}

#[derive(Clone, Debug)]
pub struct StoredBytes {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError>;

    /// `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<StoredBytes>, AppError>;

    /// `true` when the object is gone afterwards.
    async fn delete(&self, key: &str) -> Result<bool, AppError>;
}

/// Store an upload under a collision-free key and describe it.
pub async fn store_upload(
    store: &dyn ObjectStore,
    file_name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<StoredObject, AppError> {
    let now = chrono::Utc::now();
    let key = object_key(file_name, now.timestamp_millis(), &uuid::Uuid::new_v4().simple().to_string()[..8]);
    let size = bytes.len();
    store.put(&key, bytes, content_type).await?;
    tracing::info!(key = %key, size, content_type, "stored upload");
    Ok(StoredObject {
        id: key,
        file_name: file_name.to_string(),
        size,
        mime_type: content_type.to_string(),
        uploaded_at: now.to_rfc3339(),
    })
}

/// `{millis}-{random}-{base}{.ext}` with the original name reduced to `[a-z0-9_-]`.
pub fn object_key(file_name: &str, millis: i64, random: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let (stem, ext) = match name.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() => (s, e),
        _ => (name, ""),
    };
    let mut base: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c.to_ascii_lowercase() } else { '-' })
        .collect();
    base = base.trim_matches('-').to_string();
    base.truncate(MAX_BASE_LEN);
    if base.is_empty() {
        base.push_str("file");
    }
    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_EXT_LEN)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if ext.is_empty() {
        format!("{}-{}-{}", millis, random, base)
    } else {
        format!("{}-{}-{}.{}", millis, random, base, ext)
    }
}

/// Keys never contain path separators, so they are safe to splice into URLs and object paths.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 200
        && !key.starts_with('.')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

pub fn public_url(settings: &StorageSettings, key: &str) -> String {
    match &settings.public_base_url {
        Some(base) => format!("{}/{}", base, key),
        None => format!("{}/{}", FILES_ROUTE, key),
    }
}

/// Recover the object key from a stored URL.
///
/// Understands the public base URL, the proxy route (`.../files/{key}`), the legacy
/// `.../public/{token}/{key}` form and bare keys. Foreign URLs yield `None`.
pub fn extract_file_id(settings: &StorageSettings, url: &str) -> Option<String> {
    let url = url.trim();
    let url = url.split(['?', '#']).next().unwrap_or(url);
    let candidate = if let Some(rest) = settings
        .public_base_url
        .as_deref()
        .and_then(|base| url.strip_prefix(base))
        .and_then(|rest| rest.strip_prefix('/'))
    {
        rest
    } else if let Some((_, rest)) = url.rsplit_once("/files/") {
        rest
    } else if let Some((_, rest)) = url.rsplit_once("/public/") {
        rest.rsplit('/').next().unwrap_or(rest)
    } else if url.contains('/') || url.contains(':') {
        return None;
    } else {
        url
    };
    is_valid_key(candidate).then(|| candidate.to_string())
}
