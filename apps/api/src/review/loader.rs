use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::object_url::{sniff_image_type, ObjectUrl, ObjectUrls, PDF_CONTENT_TYPE};
use crate::models::{Feedback, FeedbackRecord};
use crate::storage::{record_key, BlobStore, KvStore};

/// The stage at which a load found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStage {
    Record,
    /// The record exists but its analysis has not been written yet.
    Feedback,
    ResumeBlob,
    ImageBlob,
}

impl MissingStage {
    pub fn describe(self) -> &'static str {
        match self {
            MissingStage::Record => "No review exists for this resume.",
            MissingStage::Feedback => "This resume has not been analyzed yet.",
            MissingStage::ResumeBlob => "The uploaded resume file could not be found.",
            MissingStage::ImageBlob => "The resume preview image could not be found.",
        }
    }
}

/// Everything the page needs once a record is fully loaded. Dropping it
/// revokes both object URLs.
#[derive(Debug)]
pub struct LoadedReview {
    pub resume_url: ObjectUrl,
    pub image_url: ObjectUrl,
    pub feedback: Feedback,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(LoadedReview),
    NotFound(MissingStage),
    /// A store could not answer. Retrying later may succeed.
    TransientError(String),
}

/// Loads that cannot be expressed as an outcome. Never mapped to "not found".
#[derive(Debug, Error)]
pub enum LoadFault {
    #[error("Record resume:{id} is not a valid analysis record: {source}")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Fetches record `id`, then the resume PDF, then the preview image, stopping
/// at the first missing piece. Object URLs made before a stop are released
/// on return.
pub async fn load_review(
    kv: &dyn KvStore,
    blobs: &dyn BlobStore,
    urls: &ObjectUrls,
    id: &str,
) -> Result<LoadOutcome, LoadFault> {
    let key = record_key(id);
    let raw = match kv.get(&key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            info!("No analysis record at {key}");
            return Ok(LoadOutcome::NotFound(MissingStage::Record));
        }
        Err(e) => {
            warn!("Fetching {key} failed: {e}");
            return Ok(LoadOutcome::TransientError(e.to_string()));
        }
    };

    let record: FeedbackRecord =
        serde_json::from_str(&raw).map_err(|source| LoadFault::Malformed {
            id: id.to_string(),
            source,
        })?;
    debug!(id, resume_path = %record.resume_path, "Parsed analysis record");
    let Some(feedback) = record.feedback else {
        info!("Record {key} has no feedback yet");
        return Ok(LoadOutcome::NotFound(MissingStage::Feedback));
    };

    let resume_url = match blobs.read(&record.resume_path).await {
        Ok(Some(data)) => urls.create(data, PDF_CONTENT_TYPE),
        Ok(None) => {
            info!("Resume blob {} missing for {key}", record.resume_path);
            return Ok(LoadOutcome::NotFound(MissingStage::ResumeBlob));
        }
        Err(e) => {
            warn!("Reading resume blob {} failed: {e}", record.resume_path);
            return Ok(LoadOutcome::TransientError(e.to_string()));
        }
    };

    let image_url = match blobs.read(&record.image_path).await {
        Ok(Some(data)) => {
            let content_type = sniff_image_type(&data);
            urls.create(data, content_type)
        }
        Ok(None) => {
            info!("Preview image {} missing for {key}", record.image_path);
            return Ok(LoadOutcome::NotFound(MissingStage::ImageBlob));
        }
        Err(e) => {
            warn!("Reading preview image {} failed: {e}", record.image_path);
            return Ok(LoadOutcome::TransientError(e.to_string()));
        }
    };

    debug!(
        id,
        resume_token = %resume_url.token(),
        image_token = %image_url.token(),
        "Review loaded"
    );
    Ok(LoadOutcome::Loaded(LoadedReview {
        resume_url,
        image_url,
        feedback,
        company_name: record.company_name,
        job_title: record.job_title,
        loaded_at: Utc::now(),
    }))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::{MemoryBlobs, MemoryKv, StoreError};
    use async_trait::async_trait;
    use bytes::Bytes;

    pub(crate) const PNG: &[u8] = b"\x89PNG\r\n\x1a\nimage";

    pub(crate) fn record_json(ats: &str) -> String {
        format!(
            r#"{{"resumePath":"r.pdf","imagePath":"i.png","feedback":{{"overallScore":72{ats}}}}}"#
        )
    }

    pub(crate) async fn seeded(id: &str, record: &str) -> (MemoryKv, MemoryBlobs) {
        let kv = MemoryKv::default();
        kv.set(record_key(id), record).await;
        let blobs = MemoryBlobs::default();
        blobs.put("r.pdf", Bytes::from_static(b"%PDF-1.7")).await;
        blobs.put("i.png", Bytes::from_static(PNG)).await;
        (kv, blobs)
    }

    struct DownBlobs;

    #[async_trait]
    impl BlobStore for DownBlobs {
        async fn read(&self, _path: &str) -> Result<Option<Bytes>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_valid_record_loads_feedback_and_urls() {
        let (kv, blobs) = seeded("42", &record_json(r#","ATS":{"score":80,"tips":["a"]}"#)).await;
        let urls = ObjectUrls::new("");

        let outcome = load_review(&kv, &blobs, &urls, "42").await.unwrap();
        let LoadOutcome::Loaded(review) = outcome else {
            panic!("expected a loaded review");
        };
        let ats = review.feedback.ats_view();
        assert_eq!(ats.score, 80);
        assert_eq!(ats.tips.len(), 1);

        let pdf = urls.fetch(&review.resume_url.token()).unwrap();
        assert_eq!(pdf.content_type, "application/pdf");
        let image = urls.fetch(&review.image_url.token()).unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(urls.live_count(), 2);
    }

    #[tokio::test]
    async fn test_absent_record_is_not_found() {
        let kv = MemoryKv::default();
        let blobs = MemoryBlobs::default();
        let urls = ObjectUrls::new("");
        let outcome = load_review(&kv, &blobs, &urls, "42").await.unwrap();
        assert!(matches!(outcome, LoadOutcome::NotFound(MissingStage::Record)));
    }

    #[tokio::test]
    async fn test_malformed_record_is_a_fault() {
        let (kv, blobs) = seeded("42", "{not json").await;
        let urls = ObjectUrls::new("");
        let err = load_review(&kv, &blobs, &urls, "42").await.unwrap_err();
        assert!(matches!(err, LoadFault::Malformed { ref id, .. } if id == "42"));
        assert_eq!(urls.live_count(), 0);
    }

    #[tokio::test]
    async fn test_record_without_feedback_is_not_found() {
        let (kv, blobs) = seeded("42", r#"{"resumePath":"r.pdf","imagePath":"i.png"}"#).await;
        let urls = ObjectUrls::new("");
        let outcome = load_review(&kv, &blobs, &urls, "42").await.unwrap();
        assert!(matches!(outcome, LoadOutcome::NotFound(MissingStage::Feedback)));
        assert_eq!(urls.live_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_resume_blob_skips_image_stage() {
        let kv = MemoryKv::default();
        kv.set("resume:42", record_json("")).await;
        let blobs = MemoryBlobs::default();
        blobs.put("i.png", Bytes::from_static(PNG)).await;
        let urls = ObjectUrls::new("");

        let outcome = load_review(&kv, &blobs, &urls, "42").await.unwrap();
        assert!(matches!(outcome, LoadOutcome::NotFound(MissingStage::ResumeBlob)));
        assert_eq!(urls.live_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_image_releases_resume_url() {
        let kv = MemoryKv::default();
        kv.set("resume:42", record_json("")).await;
        let blobs = MemoryBlobs::default();
        blobs.put("r.pdf", Bytes::from_static(b"%PDF")).await;
        let urls = ObjectUrls::new("");

        let outcome = load_review(&kv, &blobs, &urls, "42").await.unwrap();
        assert!(matches!(outcome, LoadOutcome::NotFound(MissingStage::ImageBlob)));
        assert_eq!(urls.live_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_transient() {
        let kv = MemoryKv::default();
        kv.set("resume:42", record_json("")).await;
        let urls = ObjectUrls::new("");
        let outcome = load_review(&kv, &DownBlobs, &urls, "42").await.unwrap();
        match outcome {
            LoadOutcome::TransientError(msg) => assert!(msg.contains("connection refused")),
            other => panic!("expected TransientError, got {other:?}"),
        }
    }
}
