//! Storage capabilities the review page reads from.
//!
//! Both capabilities report "not there" as `Ok(None)` and reserve `Err` for
//! backends that could not answer. Callers decide what absence means.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod memory;
pub mod redis_kv;
pub mod s3_blobs;

pub use memory::{MemoryBlobs, MemoryKv};
pub use redis_kv::RedisKv;
pub use s3_blobs::S3Blobs;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Key-value capability holding serialized analysis records.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// Blob capability holding uploaded resumes and their preview images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<Option<Bytes>, StoreError>;
}

/// Key under which the analysis record for `id` is stored.
pub fn record_key(id: &str) -> String {
    format!("resume:{id}")
}
