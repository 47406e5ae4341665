use super::{ObjectStore, StoredBytes};
use crate::config::StorageSettings;
use crate::error::AppError;
use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

/// S3-compatible bucket. Credentials come from the standard AWS provider chain.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub async fn connect(settings: &StorageSettings) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        tracing::info!(bucket = %settings.bucket, endpoint = ?settings.endpoint, "object storage configured");
        S3Store {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
        }
    }
}

fn storage_err<E: std::error::Error>(e: E) -> AppError {
    AppError::Storage(DisplayErrorContext(e).to_string())
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredBytes>, AppError> {
        let out = match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(out) => out,
            Err(e) if e.as_service_error().map(|s| s.is_no_such_key()).unwrap_or(false) => return Ok(None),
            Err(e) => return Err(storage_err(e)),
        };
        let content_type = out.content_type().map(str::to_string);
        let data = out.body.collect().await.map_err(storage_err)?;
        Ok(Some(StoredBytes {
            bytes: data.into_bytes().to_vec(),
            content_type,
        }))
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(storage_err)?;
        Ok(true)
    }
}
