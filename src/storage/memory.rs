use super::{ObjectStore, StoredBytes};
use crate::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process store for tests and local runs without a bucket.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<RwLock<HashMap<String, StoredBytes>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        let obj = StoredBytes {
            bytes,
            content_type: Some(content_type.to_string()),
        };
        self.objects.write().await.insert(key.to_string(), obj);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredBytes>, AppError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        self.objects.write().await.remove(key);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store_upload;

    #[tokio::test]
    async fn upload_then_fetch_then_delete() {
        let store = MemoryStore::new();
        let meta = store_upload(&store, "plan.pdf", "application/pdf", b"%PDF-1.7".to_vec())
            .await
            .unwrap();
        assert_eq!(meta.size, 8);
        assert!(meta.id.ends_with("-plan.pdf"));

        let got = store.get(&meta.id).await.unwrap().unwrap();
        assert_eq!(got.content_type.as_deref(), Some("application/pdf"));

        assert!(store.delete(&meta.id).await.unwrap());
        assert!(store.get(&meta.id).await.unwrap().is_none());
    }
}
