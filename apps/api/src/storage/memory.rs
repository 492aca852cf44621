//! In-process stores for local development and tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use super::{BlobStore, KvStore, StoreError};

#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().await.insert(key.into(), value.into());
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }
}

#[derive(Default)]
pub struct MemoryBlobs {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobs {
    pub async fn put(&self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.blobs.write().await.insert(path.into(), data.into());
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn read(&self, path: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(self.blobs.read().await.get(path).cloned())
    }
}

/// Seed file layout:
///
/// ```json
/// {
///   "kv": { "resume:42": { "resumePath": "r.pdf", "imagePath": "i.png", "feedback": {} } },
///   "blobs": { "r.pdf": "files/r.pdf", "i.png": "files/i.png" },
///   "sessions": ["dev-token"]
/// }
/// ```
///
/// Non-string `kv` values are stored as their JSON text. Blob file paths are
/// resolved against the seed file's directory.
#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    kv: HashMap<String, Value>,
    #[serde(default)]
    blobs: HashMap<String, PathBuf>,
    #[serde(default)]
    sessions: Vec<String>,
}

pub struct Seeded {
    pub kv: MemoryKv,
    pub blobs: MemoryBlobs,
    pub sessions: HashSet<String>,
}

pub async fn load_seed(path: &Path) -> Result<Seeded> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let seed: SeedFile = serde_json::from_str(&raw)
        .with_context(|| format!("Seed file {} is not valid JSON", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let kv = MemoryKv::default();
    for (key, value) in seed.kv {
        let text = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        kv.set(key, text).await;
    }

    let blobs = MemoryBlobs::default();
    for (blob_path, file) in seed.blobs {
        let file = base.join(file);
        let data = tokio::fs::read(&file)
            .await
            .with_context(|| format!("Failed to read seeded blob {}", file.display()))?;
        blobs.put(blob_path, data).await;
    }

    info!(
        "Loaded seed file {} ({} sessions)",
        path.display(),
        seed.sessions.len()
    );
    Ok(Seeded {
        kv,
        blobs,
        sessions: seed.sessions.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_kv_absent_is_none() {
        let kv = MemoryKv::default();
        assert!(kv.get("resume:missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_blobs_roundtrip() {
        let blobs = MemoryBlobs::default();
        blobs.put("r.pdf", b"%PDF-1.7".to_vec()).await;
        let data = blobs.read("r.pdf").await.unwrap().unwrap();
        assert_eq!(&data[..], b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_load_seed_inlines_json_and_reads_blob_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("r.pdf"), b"%PDF-1.4").unwrap();
        let seed_path = dir.path().join("seed.json");
        std::fs::write(
            &seed_path,
            r#"{
                "kv": {
                    "resume:1": {"resumePath": "r.pdf", "imagePath": "i.png", "feedback": {}},
                    "raw": "plain text"
                },
                "blobs": {"r.pdf": "r.pdf"},
                "sessions": ["tok"]
            }"#,
        )
        .unwrap();

        let seeded = load_seed(&seed_path).await.unwrap();
        let record = seeded.kv.get("resume:1").await.unwrap().unwrap();
        let parsed: Value = serde_json::from_str(&record).unwrap();
        assert_eq!(parsed["resumePath"], "r.pdf");
        assert_eq!(seeded.kv.get("raw").await.unwrap().as_deref(), Some("plain text"));
        assert!(seeded.blobs.read("r.pdf").await.unwrap().is_some());
        assert!(seeded.sessions.contains("tok"));
    }

    #[tokio::test]
    async fn test_load_seed_missing_blob_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let seed_path = dir.path().join("seed.json");
        std::fs::write(&seed_path, r#"{"blobs": {"r.pdf": "nope.pdf"}}"#).unwrap();
        assert!(load_seed(&seed_path).await.is_err());
    }
}
