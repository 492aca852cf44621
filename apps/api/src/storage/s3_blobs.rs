use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{BlobStore, StoreError};

/// Reads stored binaries from a single S3 (or MinIO) bucket.
/// The stored path is used as the object key unchanged.
#[derive(Clone)]
pub struct S3Blobs {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Blobs {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl BlobStore for S3Blobs {
    async fn read(&self, path: &str) -> Result<Option<Bytes>, StoreError> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                let err = err.into_service_error();
                if err.is_no_such_key() {
                    debug!("No object at s3://{}/{}", self.bucket, path);
                    return Ok(None);
                }
                return Err(StoreError::S3(format!(
                    "GetObject s3://{}/{path} failed: {err}",
                    self.bucket
                )));
            }
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::S3(format!("Reading s3://{}/{path} failed: {e}", self.bucket)))?
            .into_bytes();

        debug!("Read {} bytes from s3://{}/{}", data.len(), self.bucket, path);
        Ok(Some(data))
    }
}
